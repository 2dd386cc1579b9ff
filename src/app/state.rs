use super::messages::Message;
use crate::cache::{Bookmark, Preferences};
use crate::config::AppConfig;
use crate::epub_loader::LoadedBook;
use iced::Task;
use iced::widget::text_editor;
use scholia_core::{
    AnnotationClient, AnnotationSession, ChapterTextExtractor, DocumentSurface, HtmlSurface,
    ReaderPage, SelectionWatcher,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub(super) const MIN_FONT_SIZE: u32 = 12;
pub(super) const MAX_FONT_SIZE: u32 = 36;
const SHELL_LOCATOR: &str = "scholia://reader";
const SHELL_MARKUP: &str = "<html><head><title>Scholia</title></head><body></body></html>";

/// The chapter currently shown and the surface backing it.
pub(super) struct ReaderState {
    pub(super) current_chapter: usize,
    /// Toolbar heading; its selection is mirrored into the host surface.
    pub(super) heading: text_editor::Content,
    pub(super) content: text_editor::Content,
    pub(super) surface: Arc<HtmlSurface>,
}

pub struct App {
    pub(super) book: LoadedBook,
    pub(super) book_path: PathBuf,
    pub(super) config: AppConfig,
    pub(super) preferences: Preferences,
    pub(super) reader: ReaderState,
    pub(super) host: Arc<HtmlSurface>,
    pub(super) page: ReaderPage,
    pub(super) watcher: SelectionWatcher,
    pub(super) session: AnnotationSession,
    pub(super) extractor: Arc<ChapterTextExtractor<ReaderPage>>,
    pub(super) client: Arc<AnnotationClient>,
    pub(super) show_toc: bool,
}

impl App {
    pub fn bootstrap(
        book: LoadedBook,
        book_path: PathBuf,
        config: AppConfig,
        client: AnnotationClient,
        bookmark: Option<Bookmark>,
        preferences: Option<Preferences>,
    ) -> (App, Task<Message>) {
        let preferences = preferences.unwrap_or(Preferences {
            theme: config.appearance.theme,
            font_size: config.appearance.font_size,
        });
        let last_chapter = book.chapters.len().saturating_sub(1);
        let initial = bookmark
            .map(|bookmark| bookmark.chapter.min(last_chapter))
            .unwrap_or(0);
        if initial > 0 {
            info!(chapter = initial + 1, "Resuming at last chapter read");
        }

        let host = Arc::new(HtmlSurface::host(SHELL_LOCATOR, SHELL_MARKUP));
        let page = ReaderPage::new(Some(host.clone() as Arc<dyn DocumentSurface>));
        let watcher = SelectionWatcher::new(config.selection);
        let session = AnnotationSession::new(config.annotation.pending_policy);
        let extractor = Arc::new(ChapterTextExtractor::new(page.clone()));
        let (surface, content) = chapter_surface(&book, initial);
        let heading = chapter_heading(&book, initial);

        let mut app = App {
            book,
            book_path,
            config,
            preferences,
            reader: ReaderState {
                current_chapter: initial,
                heading,
                content,
                surface,
            },
            host,
            page,
            watcher,
            session,
            extractor,
            client: Arc::new(client),
            show_toc: false,
        };
        if let Err(err) = app.page.frame().load(app.reader.surface.clone()) {
            warn!("Could not embed first chapter: {err}");
        }
        app.watcher.rediscover(&app.page);
        (app, Task::none())
    }

    pub fn title(&self) -> String {
        format!("{} - Scholia", self.book.title)
    }

    /// Swap the embedded surface for chapter `index` and let the watcher pick
    /// it up straight away. Returns `false` for out-of-range indices.
    pub(super) fn load_chapter(&mut self, index: usize) -> bool {
        if index >= self.book.chapters.len() {
            return false;
        }
        let (surface, content) = chapter_surface(&self.book, index);
        match self.page.frame().load(surface.clone()) {
            Ok(Some(previous)) => info!(
                from = %previous.locator(),
                to = %surface.locator(),
                "Replaced embedded chapter"
            ),
            Ok(None) => info!(to = %surface.locator(), "Embedded first chapter"),
            Err(err) => warn!("Could not replace embedded chapter: {err}"),
        }
        if let Err(err) = self.host.mirror_native_selection(None) {
            warn!("Could not reset heading selection: {err}");
        }
        self.reader = ReaderState {
            current_chapter: index,
            heading: chapter_heading(&self.book, index),
            content,
            surface,
        };
        self.watcher.rediscover(&self.page);
        self.watcher.refresh(&self.page);
        true
    }

    pub(super) fn chapter_count(&self) -> usize {
        self.book.chapters.len()
    }

    pub(super) fn current_chapter_title(&self) -> &str {
        self.book
            .chapters
            .get(self.reader.current_chapter)
            .map(|chapter| chapter.title.as_str())
            .unwrap_or_default()
    }
}

fn chapter_heading(book: &LoadedBook, index: usize) -> text_editor::Content {
    let title = book
        .chapters
        .get(index)
        .map(|chapter| chapter.title.as_str())
        .unwrap_or_default();
    text_editor::Content::with_text(title)
}

fn chapter_surface(book: &LoadedBook, index: usize) -> (Arc<HtmlSurface>, text_editor::Content) {
    let surface = match book.chapters.get(index) {
        Some(chapter) => HtmlSurface::embedded(chapter.href.clone(), chapter.markup.clone()),
        None => HtmlSurface::pending(scholia_core::SurfaceKind::Embedded, "about:blank"),
    };
    let text = surface.plain_text().unwrap_or_default();
    (Arc::new(surface), text_editor::Content::with_text(&text))
}
