//! UI-free core of the Scholia reader.
//!
//! The shell owns the window and the reading widget; everything that has
//! behaviour worth testing lives here:
//! - [`surface`]: the document surfaces the reader renders into.
//! - [`selection`]: watches those surfaces for the reader's text selection.
//! - [`extractor`]: pulls the visible chapter's plain text, retrying while it loads.
//! - [`annotation`]: prompt building, the remote call, and tolerant reply parsing.
//! - [`session`]: the panel-facing request state machine and the pipeline tying it together.

pub mod annotation;
pub mod config;
pub mod extractor;
pub mod html_text;
pub mod selection;
pub mod session;
pub mod surface;

pub use annotation::{
    AnnotationClient, AnnotationError, AnnotationRequest, AnnotationResult, ReqwestTransport,
    Transport,
};
pub use config::AnnotationConfig;
pub use extractor::{ChapterTextExtractor, ExtractionError, RetryPolicy};
pub use selection::{Selection, SelectionWatcher, WatcherConfig};
pub use session::{
    AnnotateError, AnnotationOutcome, AnnotationSession, PendingPolicy, RequestTicket,
    annotate_selection,
};
pub use surface::{
    DocumentSurface, FrameSlot, HtmlSurface, ReaderPage, SurfaceError, SurfaceId, SurfaceKind,
    SurfaceProvider,
};
