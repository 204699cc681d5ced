mod bundle;
mod docx;
mod html;
mod markdown;

use crate::workflow::session::Session;
use crate::workflow::step::Step;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("session is incomplete; missing steps {missing:?}")]
    IncompleteSession { missing: Vec<u8> },
    #[error("failed to render {format} artifact: {reason}")]
    Render { format: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Markdown,
    Docx,
    Bundle,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "html" | "webpage" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            "docx" => Ok(Self::Docx),
            "bundle" | "zip" => Ok(Self::Bundle),
            _ => Err("format must be one of: html, markdown, docx, bundle".to_string()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Docx => "docx",
            Self::Bundle => "bundle",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Markdown => "text/markdown",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Bundle => "application/zip",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Bundle => "zip",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub mime: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Render one artifact from a completed session. Pure: no clock reads, no
/// network. The only timestamp embedded in any format is the session's own
/// `updated_at`, so identical session content always yields identical bytes.
pub fn export(session: &Session, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
    let missing = session.missing_steps();
    if !missing.is_empty() {
        return Err(ExportError::IncompleteSession { missing });
    }

    let bytes = match format {
        ExportFormat::Html => html::render(session).into_bytes(),
        ExportFormat::Markdown => markdown::render(session).into_bytes(),
        ExportFormat::Docx => docx::render(session)?,
        ExportFormat::Bundle => bundle::render(session)?,
    };

    Ok(ExportArtifact {
        format,
        mime: format.mime(),
        file_name: format!("{}.{}", project_slug(session), format.extension()),
        bytes,
    })
}

pub(crate) fn project_slug(session: &Session) -> String {
    let mut slug = String::new();
    for ch in session.project_name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if (ch == ' ' || ch == '-' || ch == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "landing-page".to_string()
    } else {
        slug
    }
}

pub(crate) fn step_fields(session: &Session, step: Step) -> Map<String, Value> {
    session
        .step_output(step)
        .map(|output| output.fields.clone())
        .unwrap_or_default()
}

/// Step outputs store copy either as a plain string or as an object with a
/// `copy` field; accept both.
pub(crate) fn copy_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Object(map)) => map
            .get("copy")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

pub(crate) fn string_items(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Object(map) => map
                .values()
                .find_map(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_accepts_aliases() {
        assert_eq!(ExportFormat::parse("webpage").expect("webpage"), ExportFormat::Html);
        assert_eq!(ExportFormat::parse("MD").expect("md"), ExportFormat::Markdown);
        assert_eq!(ExportFormat::parse("zip").expect("zip"), ExportFormat::Bundle);
        assert!(ExportFormat::parse("pdf").is_err());
    }

    #[test]
    fn copy_text_accepts_strings_and_copy_objects() {
        let plain = serde_json::json!("Beat Keto Flu");
        let object = serde_json::json!({"copy": "Beat Keto Flu", "character_count": 13});
        assert_eq!(copy_text(Some(&plain)), "Beat Keto Flu");
        assert_eq!(copy_text(Some(&object)), "Beat Keto Flu");
        assert_eq!(copy_text(None), "");
    }
}
