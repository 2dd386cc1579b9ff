use serde::{Deserialize, Serialize};

pub const SCENE_FALLBACK: &str = "No scene information available";
pub const LOCATION_FALLBACK: &str = "Unknown location";
pub const BACKGROUND_FALLBACK: &str = "No background information available";

pub const DEGRADED_SCENE: &str =
    "AI analysis available. See the diagnostic log for the raw model response.";
pub const DEGRADED_LOCATION: &str = "Unknown";
/// How much of an unparseable reply is kept as background text.
pub const DEGRADED_BACKGROUND_CHARS: usize = 500;

/// One highlighted passage and the chapter it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    pub highlighted: String,
    pub chapter_text: String,
}

impl AnnotationRequest {
    pub fn new(highlighted: impl Into<String>, chapter_text: impl Into<String>) -> Self {
        Self {
            highlighted: highlighted.into(),
            chapter_text: chapter_text.into(),
        }
    }
}

/// Structured literary context for a passage. Every field is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationResult {
    pub current_scene: String,
    pub characters: Vec<String>,
    pub location: String,
    pub key_terms: Vec<String>,
    pub background: String,
}

impl AnnotationResult {
    /// Result used when a reply cannot be parsed at all.
    pub fn degraded(raw: &str) -> Self {
        Self {
            current_scene: DEGRADED_SCENE.to_string(),
            characters: Vec::new(),
            location: DEGRADED_LOCATION.to_string(),
            key_terms: Vec::new(),
            background: raw.chars().take(DEGRADED_BACKGROUND_CHARS).collect(),
        }
    }
}
