//! Reviewer response parsing.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::llm::ReviewError;

/// Separator used when `entities` comes back as a list.
pub const ENTITY_SEPARATOR: &str = ",";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\n?\s*```\s*$").unwrap()
});

/// Fields the reviewer must return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedPage {
    pub clean_text: String,
    pub doc_type: String,
    pub subject: String,
    pub entities: String,
}

/// Remove a surrounding Markdown code fence, if present.
pub fn strip_code_fence(body: &str) -> &str {
    match CODE_FENCE.captures(body).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => body.trim(),
    }
}

/// Parse a reviewer body into the four required fields.
pub fn parse_response(body: &str) -> Result<ReviewedPage, ReviewError> {
    let json = strip_code_fence(body);
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ReviewError::Parse(format!("response is not valid JSON: {}", e)))?;
    let Value::Object(object) = value else {
        return Err(ReviewError::Parse(
            "response is not a JSON object".to_string(),
        ));
    };

    Ok(ReviewedPage {
        clean_text: string_field(&object, "clean_text")?,
        doc_type: string_field(&object, "doc_type")?,
        subject: string_field(&object, "subject")?,
        entities: entities_field(&object)?,
    })
}

fn string_field(object: &Map<String, Value>, field: &'static str) -> Result<String, ReviewError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ReviewError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ReviewError::InvalidField {
            field,
            reason: format!("expected a string, got {}", type_name(other)),
        }),
    }
}

fn entities_field(object: &Map<String, Value>) -> Result<String, ReviewError> {
    match object.get("entities") {
        Some(Value::Array(items)) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    Value::Number(n) => parts.push(n.to_string()),
                    other => {
                        return Err(ReviewError::InvalidField {
                            field: "entities",
                            reason: format!("list item is {}", type_name(other)),
                        })
                    }
                }
            }
            Ok(parts.join(ENTITY_SEPARATOR))
        }
        _ => string_field(object, "entities"),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
