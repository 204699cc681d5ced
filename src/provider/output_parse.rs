use crate::provider::{ProviderError, ProviderKind};
use serde_json::{Map, Value};

/// Models asked for "JSON only" still wrap the object in prose or markdown
/// fences often enough that extraction has to tolerate both.
pub fn extract_structured_object(
    text: &str,
    provider: ProviderKind,
) -> Result<Map<String, Value>, ProviderError> {
    let candidate = strip_code_fences(text);
    let candidate = outermost_object_slice(candidate).ok_or_else(|| {
        ProviderError::MalformedResponse {
            provider,
            reason: "no JSON object found in response text".to_string(),
        }
    })?;

    let value: Value =
        serde_json::from_str(candidate).map_err(|err| ProviderError::MalformedResponse {
            provider,
            reason: format!("invalid json: {err}"),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ProviderError::MalformedResponse {
            provider,
            reason: "response JSON is not an object".to_string(),
        }),
    }
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(stripped) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line (```json, ```JSON, or bare ```).
    let body = match stripped.find('\n') {
        Some(idx) => &stripped[idx + 1..],
        None => stripped,
    };
    body.rsplit_once("```").map(|(head, _)| head).unwrap_or(body).trim()
}

fn outermost_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_json_object() {
        let map = extract_structured_object(r#"{"headline": "Beat Keto Flu"}"#, ProviderKind::OpenAi)
            .expect("bare object");
        assert_eq!(map.get("headline").and_then(Value::as_str), Some("Beat Keto Flu"));
    }

    #[test]
    fn parses_a_fenced_object_with_language_tag() {
        let text = "Here is the result:\n```json\n{\"a\": 1, \"nested\": {\"b\": [1, 2]}}\n```\nDone.";
        let map = extract_structured_object(text, ProviderKind::Gemini).expect("fenced object");
        assert_eq!(map.get("a").and_then(Value::as_u64), Some(1));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"prefix {"quote": "a } inside", "n": 2} suffix"#;
        let map = extract_structured_object(text, ProviderKind::Anthropic).expect("object");
        assert_eq!(map.get("n").and_then(Value::as_u64), Some(2));
    }

    #[test]
    fn rejects_text_without_an_object() {
        let err = extract_structured_object("no json here", ProviderKind::OpenAi)
            .expect_err("should fail");
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn rejects_truncated_json() {
        let err = extract_structured_object("{\"a\": ", ProviderKind::OpenAi)
            .expect_err("should fail");
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }
}
