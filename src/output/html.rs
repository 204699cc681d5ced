use crate::output::{copy_text, step_fields, string_items};
use crate::validation::validate_hex_color;
use crate::workflow::session::Session;
use crate::workflow::step::Step;
use serde_json::Value;
use std::fmt::Write as _;

const DEFAULT_PRIMARY_CTA: &str = "#E67E22";
const DEFAULT_TEXT_PRIMARY: &str = "#2C3E50";
const DEFAULT_BACKGROUND: &str = "#FFFFFF";
const DEFAULT_ACCENT: &str = "#27AE60";

struct Palette {
    primary_cta: String,
    text_primary: String,
    background: String,
    accent: String,
}

fn palette_color(palette: Option<&Value>, key: &str, default: &str) -> String {
    let candidate = palette
        .and_then(Value::as_object)
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
        .unwrap_or(default);
    if validate_hex_color(candidate).is_ok() {
        candidate.to_string()
    } else {
        default.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub(crate) fn render(session: &Session) -> String {
    let hero = step_fields(session, Step::Hero);
    let pas = step_fields(session, Step::PasCopy);
    let social = step_fields(session, Step::SocialProof);
    let final_cta = step_fields(session, Step::FinalCta);
    let design = step_fields(session, Step::Design);

    let visual = design.get("visual_design");
    let palette_value = visual
        .and_then(Value::as_object)
        .and_then(|map| map.get("color_palette"));
    let palette = Palette {
        primary_cta: palette_color(palette_value, "primary_cta", DEFAULT_PRIMARY_CTA),
        text_primary: palette_color(palette_value, "text_primary", DEFAULT_TEXT_PRIMARY),
        background: palette_color(palette_value, "background", DEFAULT_BACKGROUND),
        accent: palette_color(palette_value, "accent", DEFAULT_ACCENT),
    };

    let headline = copy_text(hero.get("headline_primary"));
    let subheadline = copy_text(hero.get("subheadline_primary"));
    let cta = copy_text(hero.get("cta_button_primary"));

    let mut page = String::new();
    let _ = writeln!(page, "<!DOCTYPE html>");
    let _ = writeln!(page, "<html lang=\"en\">");
    let _ = writeln!(page, "<head>");
    let _ = writeln!(page, "<meta charset=\"utf-8\">");
    let _ = writeln!(
        page,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    );
    let _ = writeln!(page, "<title>{}</title>", escape(&session.project_name));
    let _ = writeln!(page, "<style>");
    let _ = writeln!(
        page,
        "body {{ margin: 0; font-family: Inter, Roboto, Arial, sans-serif; color: {}; background: {}; line-height: 1.6; }}",
        palette.text_primary, palette.background
    );
    let _ = writeln!(
        page,
        "section {{ max-width: 760px; margin: 0 auto; padding: 48px 24px; }}"
    );
    let _ = writeln!(page, "h1 {{ font-size: 44px; line-height: 1.15; }}");
    let _ = writeln!(
        page,
        ".cta {{ display: inline-block; background: {}; color: #fff; padding: 16px 32px; border-radius: 6px; font-weight: 700; text-decoration: none; }}",
        palette.primary_cta
    );
    let _ = writeln!(
        page,
        ".accent {{ color: {}; }} .muted {{ opacity: 0.75; font-size: 14px; }}",
        palette.accent
    );
    let _ = writeln!(
        page,
        "blockquote {{ border-left: 4px solid {}; margin: 16px 0; padding: 4px 16px; }}",
        palette.accent
    );
    let _ = writeln!(page, "</style>");
    let _ = writeln!(page, "</head>");
    let _ = writeln!(page, "<body>");

    let _ = writeln!(page, "<section id=\"hero\">");
    let _ = writeln!(page, "<h1>{}</h1>", escape(&headline));
    if !subheadline.is_empty() {
        let _ = writeln!(page, "<p>{}</p>", escape(&subheadline));
    }
    if !cta.is_empty() {
        let _ = writeln!(page, "<a class=\"cta\" href=\"#order\">{}</a>", escape(&cta));
    }
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "<section id=\"problem\">");
    if let Some(problem) = pas.get("problem_identification").and_then(Value::as_object) {
        let _ = writeln!(
            page,
            "<h2>{}</h2>",
            escape(&copy_text(problem.get("problem_headline")))
        );
        let _ = writeln!(
            page,
            "<p>{}</p>",
            escape(&copy_text(problem.get("empathetic_paragraph")))
        );
    }
    if let Some(solution) = pas.get("solution_reveal").and_then(Value::as_object) {
        let _ = writeln!(
            page,
            "<h2 class=\"accent\">{}</h2>",
            escape(&copy_text(solution.get("solution_headline")))
        );
    }
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "<section id=\"social-proof\">");
    let _ = writeln!(page, "<h2>What customers say</h2>");
    if let Some(Value::Array(testimonials)) = social.get("testimonials") {
        for testimonial in testimonials {
            let Some(map) = testimonial.as_object() else {
                continue;
            };
            let quote = map.get("quote").and_then(Value::as_str).unwrap_or_default();
            let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
            if quote.is_empty() {
                continue;
            }
            let _ = writeln!(
                page,
                "<blockquote>{}<br><span class=\"muted\">&mdash; {}</span></blockquote>",
                escape(quote),
                escape(name)
            );
        }
    }
    if let Some(qualifier) = social.get("audience_qualifier").and_then(Value::as_object) {
        let for_you = string_items(qualifier.get("is_for_you"));
        if !for_you.is_empty() {
            let _ = writeln!(page, "<h3>This is for you if</h3>");
            let _ = writeln!(page, "<ul>");
            for item in for_you {
                let _ = writeln!(page, "<li>{}</li>", escape(&item));
            }
            let _ = writeln!(page, "</ul>");
        }
    }
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "<section id=\"order\">");
    let _ = writeln!(
        page,
        "<h2>{}</h2>",
        escape(&copy_text(final_cta.get("cta_headline")))
    );
    let sub_copy = copy_text(final_cta.get("sub_copy"));
    if !sub_copy.is_empty() {
        let _ = writeln!(page, "<p>{}</p>", escape(&sub_copy));
    }
    let button = copy_text(final_cta.get("primary_cta_button"));
    if !button.is_empty() {
        let _ = writeln!(page, "<a class=\"cta\" href=\"#\">{}</a>", escape(&button));
    }
    let trust_signals = string_items(final_cta.get("trust_signals"));
    if !trust_signals.is_empty() {
        let _ = writeln!(
            page,
            "<p class=\"muted\">{}</p>",
            escape(&trust_signals.join(" • "))
        );
    }
    let _ = writeln!(page, "</section>");

    // Generation timestamp lives here and nowhere else in the page.
    let _ = writeln!(page, "<footer><section class=\"muted\">");
    let _ = writeln!(
        page,
        "<p>{} &middot; generated {}</p>",
        escape(&session.project_name),
        escape(&session.updated_at)
    );
    let _ = writeln!(page, "</section></footer>");
    let _ = writeln!(page, "</body>");
    let _ = writeln!(page, "</html>");
    page
}
