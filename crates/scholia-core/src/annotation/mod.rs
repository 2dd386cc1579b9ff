//! Literary annotation of a highlighted passage.

mod client;
pub mod prompt;
pub mod response;
mod types;

pub use client::{
    AnnotationClient, AnnotationError, Content, GenerateContentRequest, GenerationConfig,
    HttpRequest, HttpResponse, Part, ReqwestTransport, Transport,
};
pub use types::*;
