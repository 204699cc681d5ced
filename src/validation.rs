use crate::workflow::step::{FieldKind, Step};
use serde_json::{Map, Value};

/// One failed input check. Callers receive the full list so a user can fix
/// every problem in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_step_input(step: Step, fields: &Map<String, Value>) -> Vec<Violation> {
    let mut violations = Vec::new();

    for spec in step.input_fields() {
        let Some(value) = fields.get(spec.name) else {
            if spec.required {
                violations.push(Violation::new(spec.name, "required field is missing"));
            }
            continue;
        };
        if value.is_null() {
            if spec.required {
                violations.push(Violation::new(spec.name, "required field is null"));
            }
            continue;
        }

        match spec.kind {
            FieldKind::Text { min, max } => match value.as_str() {
                Some(text) => {
                    let length = text.trim().chars().count();
                    if length < min {
                        violations.push(Violation::new(
                            spec.name,
                            format!("must be at least {min} characters"),
                        ));
                    } else if length > max {
                        violations.push(Violation::new(
                            spec.name,
                            format!("must be no more than {max} characters"),
                        ));
                    }
                }
                None => violations.push(Violation::new(spec.name, "must be a string")),
            },
            FieldKind::Choice(options) => match value.as_str() {
                Some(choice) if options.contains(&choice) => {}
                Some(choice) => violations.push(Violation::new(
                    spec.name,
                    format!("`{choice}` is not one of: {}", options.join(", ")),
                )),
                None => violations.push(Violation::new(spec.name, "must be a string")),
            },
            FieldKind::Url => match value.as_str() {
                Some(url) => {
                    if let Err(reason) = validate_url(url) {
                        violations.push(Violation::new(spec.name, reason));
                    }
                }
                None => violations.push(Violation::new(spec.name, "must be a string")),
            },
            FieldKind::Integer { min, max } => match value.as_i64() {
                Some(number) if number >= min && number <= max => {}
                Some(number) => violations.push(Violation::new(
                    spec.name,
                    format!("{number} is outside the range {min}..={max}"),
                )),
                None => violations.push(Violation::new(spec.name, "must be an integer")),
            },
            FieldKind::Flag => {
                if !value.is_boolean() {
                    violations.push(Violation::new(spec.name, "must be true or false"));
                }
            }
        }
    }

    violations
}

pub fn validate_url(url: &str) -> Result<(), String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err("URL is empty".to_string());
    }
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| "URL must use http or https".to_string())?;
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches(|ch: char| ch == ':' || ch.is_ascii_digit());
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err("URL has no valid host".to_string());
    }
    Ok(())
}

pub fn validate_hex_color(color: &str) -> Result<(), String> {
    let Some(digits) = color.strip_prefix('#') else {
        return Err("hex color must start with '#'".to_string());
    };
    let valid_length = digits.len() == 3 || digits.len() == 6;
    if valid_length && digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err("hex color must be #RGB or #RRGGBB".to_string())
    }
}
