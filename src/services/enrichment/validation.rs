use serde_json::Value;

use crate::error::{AppError, AppResult, ProviderError};
use crate::models::Rationale;

/// Responses shorter than this cannot hold a paragraph plus bullets
const MIN_RESPONSE_CHARS: usize = 50;
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Removes a surrounding markdown code fence, with or without a `json` tag
fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        body = rest.trim_start();
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim_end();
    }
    body.trim()
}

fn bullet_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Shapes a parsed JSON value into a rationale; a non-array `bullets` becomes empty
fn rationale_from_value(value: &Value) -> Rationale {
    let paragraph = value
        .get("paragraph")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let bullets = value
        .get("bullets")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(bullet_text).collect())
        .unwrap_or_default();

    Rationale { paragraph, bullets }
}

/// Extracts a rationale from raw generator output
///
/// Output that looks cut off is reported as `truncated`; output with no
/// parseable JSON object is `malformed`.
pub fn parse_response(text: &str) -> Result<Rationale, ProviderError> {
    let body = strip_code_fences(text);
    let len = body.chars().count();

    let first = body.find('{');
    let last = body.rfind('}');

    if len < MIN_RESPONSE_CHARS {
        if body.starts_with('{') && last.is_none() {
            return Err(ProviderError::truncated(format!(
                "incomplete JSON response, cut off at {} characters",
                len
            )));
        }
        return Err(ProviderError::truncated(format!(
            "response too short ({} characters)",
            len
        )));
    }

    if body.starts_with('{') && !body.ends_with('}') {
        match (first, last) {
            (Some(start), Some(end)) if end > start && end - start >= MIN_PARAGRAPH_CHARS => {}
            _ => {
                return Err(ProviderError::truncated(
                    "incomplete JSON response, no closing brace",
                ))
            }
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(rationale_from_value(&value));
    }

    match (first, last) {
        (Some(start), Some(end)) if end > start => {
            let slice = &body[start..=end];
            serde_json::from_str::<Value>(slice)
                .map(|value| rationale_from_value(&value))
                .map_err(|e| ProviderError::malformed(format!("failed to parse extracted JSON: {}", e)))
        }
        _ => Err(ProviderError::malformed("no JSON object found in response")),
    }
}

/// Checks a parsed rationale before it may be persisted
pub fn validate_rationale(rationale: Rationale) -> AppResult<Rationale> {
    let paragraph = rationale.paragraph.trim();

    if paragraph.is_empty() {
        return Err(AppError::Validation("rationale has no paragraph".to_string()));
    }
    if paragraph.starts_with('{') || paragraph.starts_with('[') {
        return Err(AppError::Validation(
            "rationale paragraph contains raw JSON".to_string(),
        ));
    }
    if paragraph.chars().count() < MIN_PARAGRAPH_CHARS {
        return Err(AppError::Validation(
            "rationale paragraph is too short".to_string(),
        ));
    }

    Ok(Rationale {
        paragraph: paragraph.to_string(),
        bullets: rationale
            .bullets
            .into_iter()
            .map(|b| b.trim().to_string())
            .collect(),
    })
}
