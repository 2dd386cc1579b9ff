//! Prompt construction for the annotation model.

use super::types::AnnotationRequest;
use std::borrow::Cow;

/// Maximum number of chapter characters sent to the model.
pub const CHAPTER_CHAR_BUDGET: usize = 8000;
/// Appended after a truncated chapter.
pub const TRUNCATION_MARKER: &str = " ...(truncated)";

/// Hard prefix cut of `chapter` to [`CHAPTER_CHAR_BUDGET`] characters.
pub fn truncate_chapter(chapter: &str) -> Cow<'_, str> {
    match chapter.char_indices().nth(CHAPTER_CHAR_BUDGET) {
        None => Cow::Borrowed(chapter),
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
            truncated.push_str(&chapter[..cut]);
            truncated.push_str(TRUNCATION_MARKER);
            Cow::Owned(truncated)
        }
    }
}

pub fn build_prompt(request: &AnnotationRequest) -> String {
    let chapter = truncate_chapter(&request.chapter_text);
    format!(
        r#"You are a literary analysis assistant. A reader highlighted this passage in a book:

HIGHLIGHTED TEXT:
"{highlighted}"

FULL CHAPTER CONTEXT:
{chapter}

Using the highlighted passage and the chapter around it, describe the passage's context as a JSON object with exactly these fields:

{{
  "currentScene": "What is happening in the story at this moment (2-3 sentences)",
  "characters": ["Characters present or mentioned in the current scene"],
  "location": "The current location or setting",
  "keyTerms": ["Terms, concepts or references a reader may need explained"],
  "background": "Background that helps the reader understand the passage and the scene (3-4 sentences)"
}}

Respond ONLY with the JSON object. Do not wrap it in markdown or code fences and do not add any other text."#,
        highlighted = request.highlighted,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_chapters_are_sent_unmodified() {
        let chapter = "x".repeat(CHAPTER_CHAR_BUDGET);
        assert!(matches!(truncate_chapter(&chapter), Cow::Borrowed(text) if text == chapter));
        assert_eq!(truncate_chapter(""), "");
    }

    #[test]
    fn long_chapters_keep_the_first_budget_characters_and_a_marker() {
        let chapter = format!("{}{}", "a".repeat(CHAPTER_CHAR_BUDGET), "b".repeat(10));
        let sent = truncate_chapter(&chapter);
        assert_eq!(
            sent,
            format!("{}{}", "a".repeat(CHAPTER_CHAR_BUDGET), TRUNCATION_MARKER)
        );
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let chapter = "é".repeat(CHAPTER_CHAR_BUDGET + 1);
        let sent = truncate_chapter(&chapter);
        let body = sent.strip_suffix(TRUNCATION_MARKER).expect("marker");
        assert_eq!(body.chars().count(), CHAPTER_CHAR_BUDGET);
        assert!(body.chars().all(|c| c == 'é'));
    }

    #[test]
    fn prompt_embeds_passage_and_chapter_verbatim() {
        let chapter = "Once upon a time, in a castle far away, a crowd ga";
        assert_eq!(chapter.chars().count(), 50);
        let request = AnnotationRequest::new("the king arrived", chapter);
        let prompt = build_prompt(&request);

        assert!(prompt.contains("\"the king arrived\""));
        assert!(prompt.contains(chapter));
        assert!(!prompt.contains(TRUNCATION_MARKER.trim()));
        for field in ["currentScene", "characters", "location", "keyTerms", "background"] {
            assert!(prompt.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }

    #[test]
    fn truncation_does_not_touch_the_request() {
        let chapter = "z".repeat(CHAPTER_CHAR_BUDGET * 2);
        let request = AnnotationRequest::new("z", chapter.clone());
        let prompt = build_prompt(&request);
        assert!(prompt.contains(TRUNCATION_MARKER));
        assert_eq!(request.chapter_text, chapter);
    }
}
