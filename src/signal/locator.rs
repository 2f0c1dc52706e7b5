use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

use crate::signal::scanner::balanced_block_at;

static FENCED_JSON_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)```").ok());

/// A JSON object recovered from free-form text.
///
/// Always contains the marker key it was located by. There is no mutable
/// access once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtractedObject {
    fields: Map<String, Value>,
}

impl ExtractedObject {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateMiss {
    #[error("marker key `{0}` does not appear quoted in the input")]
    MarkerAbsent(String),
    #[error("no opening brace precedes marker key `{0}`")]
    NoOpeningBrace(String),
    #[error("block around marker key `{0}` is never closed")]
    Unterminated(String),
    #[error("block around marker key `{key}` is not valid JSON: {reason}")]
    InvalidJson { key: String, reason: String },
    #[error("parsed block does not carry `{0}` as a top-level key")]
    MarkerNotTopLevel(String),
}

/// Find the first JSON object in `text` that carries `marker_key` at its top level.
#[cfg_attr(not(test), allow(dead_code))]
pub fn locate(text: &str, marker_key: &str) -> Option<ExtractedObject> {
    locate_detailed(text, marker_key).ok()
}

/// Like [`locate`], but reports why the bracket-matching fallback gave up.
pub fn locate_detailed(text: &str, marker_key: &str) -> Result<ExtractedObject, LocateMiss> {
    if let Some(found) = first_fenced_match(text, marker_key) {
        return Ok(found);
    }

    let quoted = format!("\"{marker_key}\"");
    let Some(key_pos) = text.find(&quoted) else {
        return Err(LocateMiss::MarkerAbsent(marker_key.to_string()));
    };
    let Some(start) = text[..key_pos].rfind('{') else {
        return Err(LocateMiss::NoOpeningBrace(marker_key.to_string()));
    };
    let Some(candidate) = balanced_block_at(text, start) else {
        return Err(LocateMiss::Unterminated(marker_key.to_string()));
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => object_with_marker(value, marker_key)
            .ok_or_else(|| LocateMiss::MarkerNotTopLevel(marker_key.to_string())),
        Err(err) => Err(LocateMiss::InvalidJson {
            key: marker_key.to_string(),
            reason: err.to_string(),
        }),
    }
}

fn first_fenced_match(text: &str, marker_key: &str) -> Option<ExtractedObject> {
    let fence = FENCED_JSON_BLOCK.as_ref()?;
    fence
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .filter(|body| body.contains(marker_key))
        .find_map(|body| {
            let value = serde_json::from_str::<Value>(body).ok()?;
            object_with_marker(value, marker_key)
        })
}

fn object_with_marker(value: Value, marker_key: &str) -> Option<ExtractedObject> {
    match value {
        Value::Object(fields) if fields.contains_key(marker_key) => {
            Some(ExtractedObject { fields })
        }
        _ => None,
    }
}
