//! Collaborator output contract.
//!
//! Turns raw model text into a `DraftReport` or a `ValidationError` saying why
//! it was rejected. Value-level problems (percent out of range, too many
//! themes, unknown polarity) are not rejected here; `normalize` repairs them.

use serde_json::{Map, Value};
use thiserror::Error;

/// One theme before repair. `percent` is whatever number the source gave.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftTheme {
    pub theme: String,
    pub percent: f64,
    pub details: Vec<String>,
}

/// A report before repair: either parsed from the collaborator or built locally.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftReport {
    pub themes: Vec<DraftTheme>,
    pub summary: String,
    pub polarity: String,
    /// `None` when the collaborator left the field out.
    pub repeating_phrases: Option<Vec<String>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("collaborator reply was empty")]
    EmptyBody,
    #[error("collaborator reply is not JSON: {0}")]
    NotJson(String),
    #[error("collaborator reply is not a JSON object")]
    NotAnObject,
    #[error("collaborator reply is missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("collaborator reply has no named themes")]
    NoUsableThemes,
}

/// Finds the JSON object in a model reply: a ```json fence, a bare object, or
/// the first balanced `{...}` inside surrounding prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            let candidate = body[..end].trim();
            if candidate.starts_with('{') {
                return Some(candidate);
            }
        }
    }

    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escape {
            escape = false;
            continue;
        }
        if in_string && b == b'\\' {
            escape = true;
            continue;
        }
        if b == b'"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Non-numeric or missing percents become 0.
fn percent_value(v: Option<&Value>) -> f64 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite()).unwrap_or(0.0)
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_theme(v: &Value) -> Option<DraftTheme> {
    let obj = v.as_object()?;
    let name = obj
        .get("theme")
        .or_else(|| obj.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    Some(DraftTheme {
        theme: name,
        percent: percent_value(obj.get("percent")),
        details: string_list(obj.get("details")),
    })
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ValidationError> {
    obj.get(field)
        .filter(|v| !v.is_null())
        .ok_or(ValidationError::MissingField(field))
}

/// Validates one collaborator reply against the report contract.
pub fn parse_report(text: &str) -> Result<DraftReport, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    let raw = extract_json_object(text).ok_or(ValidationError::NotAnObject)?;
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let themes = required(obj, "themes")?
        .as_array()
        .ok_or(ValidationError::WrongType {
            field: "themes",
            expected: "an array",
        })?
        .iter()
        .filter_map(parse_theme)
        .collect::<Vec<_>>();

    let summary = required(obj, "summary")?
        .as_str()
        .ok_or(ValidationError::WrongType {
            field: "summary",
            expected: "a string",
        })?
        .trim()
        .to_string();
    if summary.is_empty() {
        return Err(ValidationError::MissingField("summary"));
    }

    let polarity = required(obj, "polarity")?
        .as_str()
        .ok_or(ValidationError::WrongType {
            field: "polarity",
            expected: "a string",
        })?
        .to_string();

    let repeating_phrases = match obj.get("repeating_phrases") {
        None | Some(Value::Null) => None,
        Some(v @ Value::Array(_)) => Some(string_list(Some(v))),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "repeating_phrases",
                expected: "an array",
            })
        }
    };

    Ok(DraftReport {
        themes,
        summary,
        polarity,
        repeating_phrases,
    })
}
