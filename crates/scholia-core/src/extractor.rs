//! Chapter text extraction from the embedded reading surface.

use crate::surface::SurfaceProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("could not extract chapter text after {attempts} attempts")]
pub struct ExtractionError {
    pub attempts: u32,
}

/// Fixed-count, fixed-delay retry schedule.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

pub struct ChapterTextExtractor<P> {
    page: P,
}

impl<P: SurfaceProvider> ChapterTextExtractor<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    /// Plain text of the embedded chapter; empty when there is no chapter or
    /// it cannot be read yet.
    pub fn extract(&self) -> String {
        let surface = match self.page.embedded() {
            Ok(Some(surface)) => surface,
            Ok(None) => {
                warn!("No embedded chapter surface to extract from");
                return String::new();
            }
            Err(err) => {
                warn!("Could not access embedded chapter surface: {err}");
                return String::new();
            }
        };

        match surface.plain_text() {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                debug!(locator = %surface.locator(), "Chapter text not available: {err}");
                String::new()
            }
        }
    }

    /// Retry [`ChapterTextExtractor::extract`] until it yields text. Sleeps
    /// between attempts only, never after the last one.
    pub async fn extract_with_retry(&self, policy: RetryPolicy) -> Result<String, ExtractionError> {
        for attempt in 1..=policy.max_attempts {
            let text = self.extract();
            if !text.is_empty() {
                debug!(attempt, chars = text.chars().count(), "Extracted chapter text");
                return Ok(text);
            }
            if attempt < policy.max_attempts {
                debug!(attempt, delay_ms = policy.delay_ms, "Chapter text empty; retrying");
                tokio::time::sleep(policy.delay()).await;
            }
        }
        warn!(attempts = policy.max_attempts, "Giving up on chapter text extraction");
        Err(ExtractionError {
            attempts: policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{
        DocumentSurface, HtmlSurface, ReaderPage, SurfaceError, SurfaceId, SurfaceKind,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Embedded surface that stays empty for a number of reads.
    struct LateChapter {
        id: SurfaceId,
        reads: AtomicU32,
        empty_reads: u32,
    }

    impl LateChapter {
        fn new(empty_reads: u32) -> Self {
            Self {
                id: SurfaceId::next(),
                reads: AtomicU32::new(0),
                empty_reads,
            }
        }
    }

    impl DocumentSurface for LateChapter {
        fn id(&self) -> SurfaceId {
            self.id
        }

        fn kind(&self) -> SurfaceKind {
            SurfaceKind::Embedded
        }

        fn locator(&self) -> String {
            "late.xhtml".to_string()
        }

        fn title(&self) -> Option<String> {
            None
        }

        fn selection(&self) -> Result<Option<String>, SurfaceError> {
            Ok(None)
        }

        fn plain_text(&self) -> Result<String, SurfaceError> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if read <= self.empty_reads {
                Ok("   ".to_string())
            } else {
                Ok("Once upon a time.".to_string())
            }
        }

        fn clear_selection(&self) -> Result<(), SurfaceError> {
            Ok(())
        }
    }

    fn page_with(surface: Arc<dyn DocumentSurface>) -> ReaderPage {
        let page = ReaderPage::new(None);
        page.frame().load(surface).expect("load");
        page
    }

    #[test]
    fn extract_reads_the_embedded_chapter_only() {
        let host = Arc::new(HtmlSurface::host("shell", "<p>Host chrome</p>"));
        let page = ReaderPage::new(Some(host));
        let extractor = ChapterTextExtractor::new(page.clone());
        assert_eq!(extractor.extract(), "");

        page.frame()
            .load(Arc::new(HtmlSurface::embedded(
                "ch1.xhtml",
                "<body><script>x()</script><p>Once upon a time...</p></body>",
            )))
            .expect("load");
        assert_eq!(extractor.extract(), "Once upon a time...");
    }

    #[test]
    fn unloaded_chapter_extracts_as_empty() {
        let page = page_with(Arc::new(HtmlSurface::pending(SurfaceKind::Embedded, "ch1")));
        assert_eq!(ChapterTextExtractor::new(page).extract(), "");
    }

    #[tokio::test]
    async fn gives_up_after_exactly_the_configured_attempts() {
        let chapter = Arc::new(LateChapter::new(u32::MAX));
        let extractor = ChapterTextExtractor::new(page_with(chapter.clone()));

        let err = extractor
            .extract_with_retry(RetryPolicy::new(3, 10))
            .await
            .expect_err("always empty");
        assert_eq!(err, ExtractionError { attempts: 3 });
        assert_eq!(chapter.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_the_first_non_empty_attempt() {
        let chapter = Arc::new(LateChapter::new(2));
        let extractor = ChapterTextExtractor::new(page_with(chapter.clone()));

        let text = extractor
            .extract_with_retry(RetryPolicy::new(5, 1))
            .await
            .expect("third read has text");
        assert_eq!(text, "Once upon a time.");
        assert_eq!(chapter.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_fails_without_reading() {
        let chapter = Arc::new(LateChapter::new(0));
        let extractor = ChapterTextExtractor::new(page_with(chapter.clone()));
        assert!(extractor.extract_with_retry(RetryPolicy::new(0, 1)).await.is_err());
        assert_eq!(chapter.reads.load(Ordering::SeqCst), 0);
    }
}
