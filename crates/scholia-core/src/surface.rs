//! Document surfaces the reader renders into.
//!
//! A page has a host surface (the shell's own document) and at most one
//! embedded surface holding the current chapter. The reading widget swaps the
//! embedded surface on every chapter turn, so anything that instruments it
//! must key on [`SurfaceId`] rather than on the slot.

use crate::html_text;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one document instance; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn next() -> Self {
        SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Host,
    Embedded,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("document has not finished loading")]
    NotLoaded,
    #[error("document is not accessible: {0}")]
    Inaccessible(String),
}

/// Read access to a rendered document.
pub trait DocumentSurface: Send + Sync {
    fn id(&self) -> SurfaceId;
    fn kind(&self) -> SurfaceKind;
    /// Opaque identifier of the document (chapter href for embedded surfaces).
    fn locator(&self) -> String;
    fn title(&self) -> Option<String>;
    /// Currently selected text, `None` when nothing is selected.
    fn selection(&self) -> Result<Option<String>, SurfaceError>;
    fn plain_text(&self) -> Result<String, SurfaceError>;
    fn clear_selection(&self) -> Result<(), SurfaceError>;
}

/// In-memory surface over XHTML markup.
pub struct HtmlSurface {
    id: SurfaceId,
    kind: SurfaceKind,
    locator: String,
    markup: RwLock<Option<String>>,
    selected: RwLock<Option<String>>,
}

impl HtmlSurface {
    pub fn new(kind: SurfaceKind, locator: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            id: SurfaceId::next(),
            kind,
            locator: locator.into(),
            markup: RwLock::new(Some(markup.into())),
            selected: RwLock::new(None),
        }
    }

    /// Surface whose content arrives later through [`HtmlSurface::finish_loading`].
    pub fn pending(kind: SurfaceKind, locator: impl Into<String>) -> Self {
        Self {
            id: SurfaceId::next(),
            kind,
            locator: locator.into(),
            markup: RwLock::new(None),
            selected: RwLock::new(None),
        }
    }

    pub fn embedded(locator: impl Into<String>, markup: impl Into<String>) -> Self {
        Self::new(SurfaceKind::Embedded, locator, markup)
    }

    pub fn host(locator: impl Into<String>, markup: impl Into<String>) -> Self {
        Self::new(SurfaceKind::Host, locator, markup)
    }

    pub fn finish_loading(&self, markup: impl Into<String>) -> Result<(), SurfaceError> {
        let mut guard = self.markup.write().map_err(poisoned)?;
        *guard = Some(markup.into());
        Ok(())
    }

    /// Select the characters `range` of the rendered plain text. Out-of-range
    /// bounds are clamped; an empty range clears the selection.
    pub fn select(&self, range: Range<usize>) -> Result<(), SurfaceError> {
        let text = self.plain_text()?;
        let picked: String = text
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect();
        let mut guard = self.selected.write().map_err(poisoned)?;
        *guard = (!picked.is_empty()).then_some(picked);
        Ok(())
    }

    /// Mirror the selection a rendering widget reports for this document.
    pub fn mirror_native_selection(&self, text: Option<String>) -> Result<(), SurfaceError> {
        let mut guard = self.selected.write().map_err(poisoned)?;
        *guard = text.filter(|t| !t.is_empty());
        Ok(())
    }

    fn with_markup<T>(&self, f: impl FnOnce(&str) -> T) -> Result<T, SurfaceError> {
        let guard = self.markup.read().map_err(poisoned)?;
        match guard.as_deref() {
            Some(markup) => Ok(f(markup)),
            None => Err(SurfaceError::NotLoaded),
        }
    }
}

impl DocumentSurface for HtmlSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn locator(&self) -> String {
        self.locator.clone()
    }

    fn title(&self) -> Option<String> {
        self.with_markup(html_text::document_title).ok().flatten()
    }

    fn selection(&self) -> Result<Option<String>, SurfaceError> {
        self.with_markup(|_| ())?;
        let guard = self.selected.read().map_err(poisoned)?;
        Ok(guard.clone())
    }

    fn plain_text(&self) -> Result<String, SurfaceError> {
        self.with_markup(html_text::plain_text)
    }

    fn clear_selection(&self) -> Result<(), SurfaceError> {
        let mut guard = self.selected.write().map_err(poisoned)?;
        *guard = None;
        Ok(())
    }
}

fn poisoned<T>(_: T) -> SurfaceError {
    SurfaceError::Inaccessible("surface lock poisoned".to_string())
}

/// The slot the reading widget renders chapters into.
#[derive(Clone, Default)]
pub struct FrameSlot {
    current: Arc<RwLock<Option<Arc<dyn DocumentSurface>>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the embedded document, returning the one it displaced.
    pub fn load(
        &self,
        surface: Arc<dyn DocumentSurface>,
    ) -> Result<Option<Arc<dyn DocumentSurface>>, SurfaceError> {
        let mut guard = self.current.write().map_err(poisoned)?;
        Ok(guard.replace(surface))
    }

    pub fn current(&self) -> Result<Option<Arc<dyn DocumentSurface>>, SurfaceError> {
        let guard = self.current.read().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

/// Where the watcher and extractor look for documents.
pub trait SurfaceProvider {
    fn host(&self) -> Option<Arc<dyn DocumentSurface>>;
    fn embedded(&self) -> Result<Option<Arc<dyn DocumentSurface>>, SurfaceError>;
}

/// A host document plus its embedding slot. Clones share the same slot.
#[derive(Clone)]
pub struct ReaderPage {
    host: Option<Arc<dyn DocumentSurface>>,
    frame: FrameSlot,
}

impl ReaderPage {
    pub fn new(host: Option<Arc<dyn DocumentSurface>>) -> Self {
        Self {
            host,
            frame: FrameSlot::new(),
        }
    }

    pub fn frame(&self) -> &FrameSlot {
        &self.frame
    }
}

impl SurfaceProvider for ReaderPage {
    fn host(&self) -> Option<Arc<dyn DocumentSurface>> {
        self.host.clone()
    }

    fn embedded(&self) -> Result<Option<Arc<dyn DocumentSurface>>, SurfaceError> {
        self.frame.current()
    }
}

impl<P: SurfaceProvider + ?Sized> SurfaceProvider for Arc<P> {
    fn host(&self) -> Option<Arc<dyn DocumentSurface>> {
        (**self).host()
    }

    fn embedded(&self) -> Result<Option<Arc<dyn DocumentSurface>>, SurfaceError> {
        (**self).embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTER: &str =
        "<html><head><title>Chapter 2</title></head><body><p>The king arrived at dawn.</p></body></html>";

    #[test]
    fn ids_are_unique_per_document() {
        let a = HtmlSurface::embedded("ch1.xhtml", CHAPTER);
        let b = HtmlSurface::embedded("ch1.xhtml", CHAPTER);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn select_picks_characters_of_the_plain_text() {
        let surface = HtmlSurface::embedded("ch2.xhtml", CHAPTER);
        surface.select(4..20).expect("select");
        assert_eq!(
            surface.selection().expect("selection"),
            Some("king arrived at ".to_string())
        );
        surface.select(3..3).expect("select");
        assert_eq!(surface.selection().expect("selection"), None);
    }

    #[test]
    fn pending_surface_reports_not_loaded_until_content_arrives() {
        let surface = HtmlSurface::pending(SurfaceKind::Embedded, "ch3.xhtml");
        assert_eq!(surface.plain_text(), Err(SurfaceError::NotLoaded));
        assert_eq!(surface.selection(), Err(SurfaceError::NotLoaded));
        assert_eq!(surface.title(), None);

        surface.finish_loading(CHAPTER).expect("load");
        assert_eq!(surface.plain_text().expect("text"), "The king arrived at dawn.");
        assert_eq!(surface.title().as_deref(), Some("Chapter 2"));
    }

    #[test]
    fn mirrored_empty_selection_counts_as_none() {
        let surface = HtmlSurface::embedded("ch2.xhtml", CHAPTER);
        surface
            .mirror_native_selection(Some(String::new()))
            .expect("mirror");
        assert_eq!(surface.selection().expect("selection"), None);
        surface
            .mirror_native_selection(Some("dawn".to_string()))
            .expect("mirror");
        assert_eq!(surface.selection().expect("selection").as_deref(), Some("dawn"));
        surface.clear_selection().expect("clear");
        assert_eq!(surface.selection().expect("selection"), None);
    }

    #[test]
    fn page_clones_share_the_frame() {
        let page = ReaderPage::new(None);
        let other = page.clone();
        assert!(other.embedded().expect("embedded").is_none());

        let first: Arc<dyn DocumentSurface> = Arc::new(HtmlSurface::embedded("a", CHAPTER));
        let first_id = first.id();
        page.frame().load(first).expect("load");
        let seen = other.embedded().expect("embedded").expect("loaded");
        assert_eq!(seen.id(), first_id);

        let displaced = page
            .frame()
            .load(Arc::new(HtmlSurface::embedded("b", CHAPTER)))
            .expect("load")
            .expect("displaced");
        assert_eq!(displaced.id(), first_id);
        assert_eq!(other.embedded().expect("embedded").expect("loaded").locator(), "b");
    }
}
