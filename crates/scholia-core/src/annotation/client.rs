//! HTTP client for the Gemini `generateContent` endpoint.

use super::prompt::build_prompt;
use super::response::parse_annotation;
use super::types::{AnnotationRequest, AnnotationResult};
use crate::config::AnnotationConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotation API error: {status} - {body}")]
    Http { status: u16, body: String },
    #[error("no response text from annotation API (status {status})")]
    MissingContent { status: u16, body: String },
    #[error("annotation request failed: {0}")]
    Transport(String),
}

impl AnnotationError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AnnotationError::Http { status, .. } | AnnotationError::MissingContent { status, .. } => {
                Some(*status)
            }
            AnnotationError::Transport(_) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            AnnotationError::Http { body, .. } | AnnotationError::MissingContent { body, .. } => {
                Some(body)
            }
            AnnotationError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.is_empty())
    }
}

/// One POST to the annotation endpoint.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Sent as the `key` query parameter.
    pub credential: String,
    pub body: GenerateContentRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves an [`HttpRequest`] over the wire. Only connection-level failures are
/// errors here; HTTP status handling belongs to the client.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, AnnotationError>> + Send;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, AnnotationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AnnotationError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, AnnotationError> {
        let response = self
            .client
            .post(&request.url)
            .query(&[("key", request.credential.as_str())])
            .json(&request.body)
            .send()
            .await
            .map_err(|err| AnnotationError::Transport(err.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| AnnotationError::Transport(err.without_url().to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

/// Turns a highlighted passage plus its chapter into an [`AnnotationResult`].
///
/// Construct once at startup and share it; it holds no per-request state.
/// Callers must check [`AnnotationConfig::is_configured`] before using it.
pub struct AnnotationClient<T = ReqwestTransport> {
    transport: T,
    endpoint: String,
    credential: String,
    generation: GenerationConfig,
}

impl AnnotationClient<ReqwestTransport> {
    pub fn from_config(config: &AnnotationConfig) -> Result<Self, AnnotationError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> AnnotationClient<T> {
    pub fn with_transport(config: &AnnotationConfig, transport: T) -> Self {
        Self {
            transport,
            endpoint: config.endpoint.clone(),
            credential: config.api_key.trim().to_string(),
            generation: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        }
    }

    pub fn request_body(&self, request: &AnnotationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            generation_config: self.generation,
        }
    }

    /// One request, no retries. Fails only on transport or HTTP problems; a
    /// malformed model reply degrades inside the returned result instead.
    pub async fn generate(
        &self,
        selected_text: &str,
        chapter_text: &str,
    ) -> Result<AnnotationResult, AnnotationError> {
        let request = AnnotationRequest::new(selected_text, chapter_text);
        let http = HttpRequest {
            url: self.endpoint.clone(),
            credential: self.credential.clone(),
            body: self.request_body(&request),
        };
        info!(
            selected_chars = selected_text.chars().count(),
            chapter_chars = chapter_text.chars().count(),
            "Requesting annotation"
        );

        let response = self.transport.post(&http).await.inspect_err(|err| {
            error!("Annotation transport failed: {err}");
        })?;

        if !response.is_success() {
            error!(status = response.status, "Annotation API returned an error");
            return Err(AnnotationError::Http {
                status: response.status,
                body: response.body,
            });
        }

        let decoded: GenerateContentResponse = match serde_json::from_str(&response.body) {
            Ok(decoded) => decoded,
            Err(err) => {
                debug!("Annotation envelope is not JSON: {err}");
                GenerateContentResponse::default()
            }
        };
        let Some(text) = decoded.first_text() else {
            error!(status = response.status, "Annotation API reply has no candidate text");
            return Err(AnnotationError::MissingContent {
                status: response.status,
                body: response.body,
            });
        };

        Ok(parse_annotation(&text))
    }
}
