//! Panel-facing annotation state and the selection → annotation pipeline.

use crate::annotation::{AnnotationClient, AnnotationError, AnnotationResult, Transport};
use crate::extractor::{ChapterTextExtractor, ExtractionError, RetryPolicy};
use crate::selection::Selection;
use crate::surface::SurfaceProvider;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const UNCONFIGURED_MESSAGE: &str = "Please configure your Gemini API key: set GEMINI_API_KEY \
     or api_key under [annotation] in conf/config.toml.";
pub const EXTRACTION_FAILED_MESSAGE: &str = "Could not extract chapter text. Please try again.";

/// What to do when a new request starts while one is still in flight.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PendingPolicy {
    /// Ignore new requests until the current one settles.
    #[default]
    RejectWhilePending,
    /// Start the new request; the old one's result is discarded.
    ReplacePending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOutcome {
    Pending,
    Success(AnnotationResult),
    Failure(String),
}

/// Identifies one started request so late results can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

impl AnnotateError {
    /// Text shown in the panel's error section.
    pub fn user_message(&self) -> String {
        match self {
            AnnotateError::Extraction(_) => EXTRACTION_FAILED_MESSAGE.to_string(),
            AnnotateError::Annotation(AnnotationError::Http { status, body }) => {
                format!("API error: {status} - {body}")
            }
            AnnotateError::Annotation(AnnotationError::MissingContent { status, .. }) => {
                format!("The annotation service returned no text (status {status}).")
            }
            AnnotateError::Annotation(AnnotationError::Transport(reason)) => {
                format!("Could not reach the annotation service: {reason}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AnnotationSession {
    policy: PendingPolicy,
    visible: bool,
    selected_text: Option<String>,
    outcome: Option<AnnotationOutcome>,
    in_flight: Option<RequestTicket>,
    issued: u64,
}

impl AnnotationSession {
    pub fn new(policy: PendingPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Opens the panel for `selection`. Returns a ticket when a request should
    /// actually be sent.
    pub fn begin(&mut self, selection: &Selection, configured: bool) -> Option<RequestTicket> {
        if self.is_pending() && self.policy == PendingPolicy::RejectWhilePending {
            debug!("Annotation already pending; ignoring new request");
            return None;
        }

        self.visible = true;
        self.selected_text = Some(selection.text().to_string());

        if !configured {
            warn!("Annotation requested without a configured credential");
            self.in_flight = None;
            self.outcome = Some(AnnotationOutcome::Failure(UNCONFIGURED_MESSAGE.to_string()));
            return None;
        }

        if let Some(previous) = self.in_flight {
            debug!(?previous, "Replacing pending annotation request");
        }
        self.issued += 1;
        let ticket = RequestTicket(self.issued);
        self.in_flight = Some(ticket);
        self.outcome = Some(AnnotationOutcome::Pending);
        info!(
            ?ticket,
            source = selection.source_title(),
            chars = selection.text().chars().count(),
            "Annotation request started"
        );
        Some(ticket)
    }

    /// Applies a finished request. Returns `false` for stale tickets, whose
    /// results are dropped.
    pub fn settle(
        &mut self,
        ticket: RequestTicket,
        result: Result<AnnotationResult, AnnotateError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(?ticket, "Discarding stale annotation result");
            return false;
        }
        self.in_flight = None;
        self.outcome = Some(match result {
            Ok(annotation) => AnnotationOutcome::Success(annotation),
            Err(err) => {
                warn!("Annotation failed: {err}");
                AnnotationOutcome::Failure(err.user_message())
            }
        });
        true
    }

    /// Hides the panel and abandons any in-flight request.
    pub fn close(&mut self) {
        self.visible = false;
        self.selected_text = None;
        self.outcome = None;
        self.in_flight = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selected_text.as_deref()
    }

    pub fn outcome(&self) -> Option<&AnnotationOutcome> {
        self.outcome.as_ref()
    }
}

/// Reads the chapter around `selection` and asks the model about it.
pub async fn annotate_selection<P, T>(
    extractor: &ChapterTextExtractor<P>,
    client: &AnnotationClient<T>,
    selection: &Selection,
    policy: RetryPolicy,
) -> Result<AnnotationResult, AnnotateError>
where
    P: SurfaceProvider,
    T: Transport,
{
    let chapter = extractor.extract_with_retry(policy).await?;
    let annotation = client.generate(selection.text(), &chapter).await?;
    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{HttpRequest, HttpResponse};
    use crate::config::AnnotationConfig;
    use crate::surface::{HtmlSurface, ReaderPage};
    use std::sync::{Arc, Mutex};

    fn selection(text: &str) -> Selection {
        Selection::new(text, "chapter1.xhtml", "Chapter One").expect("non-empty selection")
    }

    fn sample_result() -> AnnotationResult {
        AnnotationResult {
            current_scene: "A king arrives.".to_string(),
            characters: vec!["King".to_string()],
            location: "Castle".to_string(),
            key_terms: Vec::new(),
            background: "Context.".to_string(),
        }
    }

    #[test]
    fn begin_then_settle_shows_the_result() {
        let mut session = AnnotationSession::new(PendingPolicy::RejectWhilePending);
        let ticket = session
            .begin(&selection("the king arrived"), true)
            .expect("ticket");
        assert!(session.is_visible());
        assert!(session.is_pending());
        assert_eq!(session.selected_text(), Some("the king arrived"));
        assert_eq!(session.outcome(), Some(&AnnotationOutcome::Pending));

        assert!(session.settle(ticket, Ok(sample_result())));
        assert!(!session.is_pending());
        assert_eq!(
            session.outcome(),
            Some(&AnnotationOutcome::Success(sample_result()))
        );
    }

    #[test]
    fn unconfigured_credential_fails_without_a_request() {
        let mut session = AnnotationSession::default();
        assert_eq!(session.begin(&selection("x"), false), None);
        assert!(session.is_visible());
        assert!(!session.is_pending());
        assert_eq!(
            session.outcome(),
            Some(&AnnotationOutcome::Failure(UNCONFIGURED_MESSAGE.to_string()))
        );
    }

    #[test]
    fn reject_policy_ignores_requests_while_pending() {
        let mut session = AnnotationSession::new(PendingPolicy::RejectWhilePending);
        let first = session.begin(&selection("first"), true).expect("ticket");
        assert_eq!(session.begin(&selection("second"), true), None);
        assert_eq!(session.selected_text(), Some("first"));
        assert!(session.settle(first, Ok(sample_result())));

        assert!(session.begin(&selection("third"), true).is_some());
    }

    #[test]
    fn replace_policy_discards_the_older_result() {
        let mut session = AnnotationSession::new(PendingPolicy::ReplacePending);
        let first = session.begin(&selection("first"), true).expect("ticket");
        let second = session.begin(&selection("second"), true).expect("ticket");
        assert_ne!(first, second);

        assert!(!session.settle(first, Ok(sample_result())));
        assert_eq!(session.outcome(), Some(&AnnotationOutcome::Pending));
        assert!(session.settle(
            second,
            Err(AnnotateError::Extraction(ExtractionError { attempts: 3 }))
        ));
        assert_eq!(
            session.outcome(),
            Some(&AnnotationOutcome::Failure(EXTRACTION_FAILED_MESSAGE.to_string()))
        );
    }

    #[test]
    fn closing_abandons_the_pending_request() {
        let mut session = AnnotationSession::default();
        let ticket = session.begin(&selection("x"), true).expect("ticket");
        session.close();
        assert!(!session.is_visible());
        assert_eq!(session.selected_text(), None);
        assert!(!session.settle(ticket, Ok(sample_result())));
        assert_eq!(session.outcome(), None);
    }

    #[test]
    fn http_errors_show_status_and_body() {
        let err = AnnotateError::from(AnnotationError::Http {
            status: 429,
            body: "quota".to_string(),
        });
        assert_eq!(err.user_message(), "API error: 429 - quota");
    }

    #[derive(Default)]
    struct ScriptedModel {
        prompts: Mutex<Vec<String>>,
    }

    impl Transport for Arc<ScriptedModel> {
        async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, AnnotationError> {
            let prompt = request.body.contents[0].parts[0].text.clone().unwrap_or_default();
            self.prompts.lock().expect("prompts lock").push(prompt);
            let reply = serde_json::json!({
                "candidates": [{ "content": { "parts": [{
                    "text": "{\"currentScene\":\"A king arrives.\",\"characters\":[\"King\"],\"location\":\"Castle\",\"keyTerms\":[],\"background\":\"Context.\"}"
                }] } }]
            });
            Ok(HttpResponse {
                status: 200,
                body: reply.to_string(),
            })
        }
    }

    fn keyed_config() -> AnnotationConfig {
        AnnotationConfig {
            api_key: "k".to_string(),
            ..AnnotationConfig::default()
        }
    }

    #[tokio::test]
    async fn pipeline_sends_the_visible_chapter() {
        let page = ReaderPage::new(None);
        page.frame()
            .load(Arc::new(HtmlSurface::embedded(
                "chapter1.xhtml",
                "<html><body><p>At dawn the king arrived at the gate.</p></body></html>",
            )))
            .expect("load");
        let model = Arc::new(ScriptedModel::default());
        let client = AnnotationClient::with_transport(&keyed_config(), model.clone());
        let extractor = ChapterTextExtractor::new(page);

        let result = annotate_selection(
            &extractor,
            &client,
            &selection("the king arrived"),
            RetryPolicy::new(3, 1),
        )
        .await
        .expect("annotation");

        assert_eq!(result, sample_result());
        let prompts = model.prompts.lock().expect("prompts lock");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("At dawn the king arrived at the gate."));
    }

    #[tokio::test]
    async fn pipeline_skips_the_request_when_no_chapter_is_loaded() {
        let model = Arc::new(ScriptedModel::default());
        let client = AnnotationClient::with_transport(&keyed_config(), model.clone());
        let extractor = ChapterTextExtractor::new(ReaderPage::new(None));

        let err = annotate_selection(&extractor, &client, &selection("x"), RetryPolicy::new(2, 1))
            .await
            .expect_err("nothing to extract");

        assert!(matches!(err, AnnotateError::Extraction(ExtractionError { attempts: 2 })));
        assert!(model.prompts.lock().expect("prompts lock").is_empty());
    }
}
