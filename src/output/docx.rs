use crate::output::{copy_text, step_fields, string_items, ExportError};
use crate::workflow::session::Session;
use crate::workflow::step::Step;
use serde_json::Value;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

enum ParagraphStyle {
    Title,
    Heading,
    Body,
    Bullet,
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn paragraph(style: &ParagraphStyle, text: &str) -> String {
    let (size, bold, prefix) = match style {
        ParagraphStyle::Title => ("48", true, ""),
        ParagraphStyle::Heading => ("32", true, ""),
        ParagraphStyle::Body => ("22", false, ""),
        ParagraphStyle::Bullet => ("22", false, "\u{2022} "),
    };
    let bold_tag = if bold { "<w:b/>" } else { "" };
    format!(
        "<w:p><w:r><w:rPr>{bold_tag}<w:sz w:val=\"{size}\"/></w:rPr><w:t xml:space=\"preserve\">{prefix}{}</w:t></w:r></w:p>",
        escape_xml(text)
    )
}

fn document_paragraphs(session: &Session) -> Vec<(ParagraphStyle, String)> {
    let hero = step_fields(session, Step::Hero);
    let pas = step_fields(session, Step::PasCopy);
    let social = step_fields(session, Step::SocialProof);
    let final_cta = step_fields(session, Step::FinalCta);

    let mut paragraphs = vec![
        (ParagraphStyle::Title, session.project_name.clone()),
        (
            ParagraphStyle::Body,
            format!("Generated: {}", session.updated_at),
        ),
        (ParagraphStyle::Heading, "Hero".to_string()),
        (ParagraphStyle::Body, copy_text(hero.get("headline_primary"))),
        (
            ParagraphStyle::Body,
            copy_text(hero.get("subheadline_primary")),
        ),
        (
            ParagraphStyle::Body,
            format!("CTA: {}", copy_text(hero.get("cta_button_primary"))),
        ),
    ];

    paragraphs.push((ParagraphStyle::Heading, "Problem & Solution".to_string()));
    if let Some(problem) = pas.get("problem_identification").and_then(Value::as_object) {
        paragraphs.push((
            ParagraphStyle::Body,
            copy_text(problem.get("problem_headline")),
        ));
        paragraphs.push((
            ParagraphStyle::Body,
            copy_text(problem.get("empathetic_paragraph")),
        ));
    }
    if let Some(solution) = pas.get("solution_reveal").and_then(Value::as_object) {
        paragraphs.push((
            ParagraphStyle::Body,
            copy_text(solution.get("solution_headline")),
        ));
    }

    paragraphs.push((ParagraphStyle::Heading, "Social Proof".to_string()));
    if let Some(Value::Array(testimonials)) = social.get("testimonials") {
        for testimonial in testimonials {
            let Some(map) = testimonial.as_object() else {
                continue;
            };
            let quote = map.get("quote").and_then(Value::as_str).unwrap_or_default();
            let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
            if !quote.is_empty() {
                paragraphs.push((ParagraphStyle::Bullet, format!("\"{quote}\" — {name}")));
            }
        }
    }

    paragraphs.push((ParagraphStyle::Heading, "Final Call To Action".to_string()));
    paragraphs.push((ParagraphStyle::Body, copy_text(final_cta.get("cta_headline"))));
    paragraphs.push((ParagraphStyle::Body, copy_text(final_cta.get("sub_copy"))));
    paragraphs.push((
        ParagraphStyle::Body,
        format!(
            "Button: {}",
            copy_text(final_cta.get("primary_cta_button"))
        ),
    ));
    for signal in string_items(final_cta.get("trust_signals")) {
        paragraphs.push((ParagraphStyle::Bullet, signal));
    }

    paragraphs.retain(|(_, text)| !text.trim().is_empty());
    paragraphs
}

fn document_xml(session: &Session) -> String {
    let body: String = document_paragraphs(session)
        .iter()
        .map(|(style, text)| paragraph(style, text))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:body>{body}<w:sectPr/></w:body></w:document>"
    )
}

fn render_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Render {
        format: "docx",
        reason: err.to_string(),
    }
}

/// Minimal OOXML package: content types, package relationships, and one
/// document part. Entry timestamps are fixed so output bytes depend only on
/// session content.
pub(crate) fn render(session: &Session) -> Result<Vec<u8>, ExportError> {
    let entry_time =
        zip::DateTime::from_date_and_time(2020, 1, 1, 0, 0, 0).map_err(|_| ExportError::Render {
            format: "docx",
            reason: "invalid fixed archive timestamp".to_string(),
        })?;
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(entry_time);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        ("word/document.xml", document_xml(session)),
    ] {
        writer.start_file(name, options).map_err(render_error)?;
        writer
            .write_all(contents.as_bytes())
            .map_err(render_error)?;
    }
    let cursor = writer.finish().map_err(render_error)?;
    Ok(cursor.into_inner())
}
