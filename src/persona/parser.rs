//! Extracts a persona JSON object from raw model output.
//!
//! Models wrap JSON in prose or markdown fences often enough that a strict
//! decode is only the first step. The fallback is a greedy `{...}` match over
//! the whole text (first `{` to last `}`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

use super::types::{PersonaDraft, Provenance, REQUIRED_FIELDS};

/// Keys the pipeline assigns itself; a model's values for them are dropped.
const PIPELINE_KEYS: [&str; 2] = ["provenance", "quality_score"];

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{.*\}").unwrap_or_else(|e| panic!("invalid JSON object pattern: {e}"))
});

/// Parse a model response into a draft.
///
/// Fails with [`Error::Parse`] when no JSON object can be decoded or any
/// required key is absent (a `null` value counts as absent).
pub fn parse(raw: &str) -> Result<PersonaDraft> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::parse("response is empty"));
    }

    let mut value = decode_object(trimmed)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| Error::parse("response JSON is not an object"))?;
    for key in PIPELINE_KEYS {
        object.remove(key);
    }

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .map(|f| f.as_str())
        .filter(|key| object.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(Error::parse(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let mut draft: PersonaDraft = serde_json::from_value(value)
        .map_err(|e| Error::parse(format!("persona object has unexpected shape: {}", e)))?;
    draft.provenance = Provenance::AiGenerated;
    Ok(draft)
}

fn decode_object(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let span = JSON_OBJECT
        .find(text)
        .ok_or_else(|| Error::parse(format!("no JSON object found (response starts with {:?})", preview(text))))?;

    serde_json::from_str::<Value>(span.as_str())
        .map_err(|e| Error::parse(format!("embedded JSON is not decodable: {}", e)))
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
