//! Tolerant parsing of the model's reply.
//!
//! Models are told to answer with bare JSON but routinely wrap it in code
//! fences, add a sentence before or after it, or leave trailing commas. The
//! reply is cleaned in a fixed order and then read field by field; a reply
//! that still does not parse becomes [`AnnotationResult::degraded`].

use super::types::{AnnotationResult, BACKGROUND_FALLBACK, LOCATION_FALLBACK, SCENE_FALLBACK};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s*").expect("static regex"));
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*").expect("static regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("static regex"));

/// Fence stripping, brace slicing and trailing-comma removal.
pub fn clean_response(raw: &str) -> String {
    let unfenced = JSON_FENCE.replace_all(raw.trim(), "");
    let unfenced = FENCE.replace_all(&unfenced, "");
    let mut text = unfenced.trim();

    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if last > first {
            text = &text[first..=last];
        }
    }

    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Parse a model reply into a fully populated result. Never fails.
pub fn parse_annotation(raw: &str) -> AnnotationResult {
    debug!(raw, "Raw annotation reply");
    let cleaned = clean_response(raw);
    debug!(cleaned = %cleaned, "Cleaned annotation reply");

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(fields)) => from_fields(&fields),
        Ok(Value::Null) => {
            warn!("Annotation reply is JSON null");
            warn!(raw, "Unparsed annotation reply");
            AnnotationResult::degraded(raw)
        }
        Ok(other) => {
            warn!(kind = json_kind(&other), "Annotation reply is not a JSON object; using fallbacks");
            from_fields(&Map::new())
        }
        Err(err) => {
            warn!("Annotation reply is not valid JSON: {err}");
            warn!(raw, "Unparsed annotation reply");
            AnnotationResult::degraded(raw)
        }
    }
}

fn from_fields(fields: &Map<String, Value>) -> AnnotationResult {
    AnnotationResult {
        current_scene: string_field(fields, "currentScene", SCENE_FALLBACK),
        characters: list_field(fields, "characters"),
        location: string_field(fields, "location", LOCATION_FALLBACK),
        key_terms: list_field(fields, "keyTerms"),
        background: string_field(fields, "background", BACKGROUND_FALLBACK),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str, fallback: &str) -> String {
    match fields.get(key) {
        Some(Value::String(value)) => value.clone(),
        Some(other) => {
            debug!(field = key, kind = json_kind(other), "Substituting fallback for mistyped field");
            fallback.to_string()
        }
        None => {
            debug!(field = key, "Substituting fallback for missing field");
            fallback.to_string()
        }
    }
}

fn list_field(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(value) => Some(value.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(other) => {
            debug!(field = key, kind = json_kind(other), "Dropping mistyped list field");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
