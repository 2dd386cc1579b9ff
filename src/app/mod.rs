mod messages;
mod state;
mod update;
mod view;

pub use state::App;

use crate::cache::{Bookmark, Preferences};
use crate::config::{AppConfig, ThemeMode};
use crate::epub_loader::LoadedBook;
use iced::{Size, Theme, window};
use scholia_core::AnnotationClient;
use std::path::PathBuf;

/// Launch the reader window for an already loaded book.
pub fn run_app(
    book: LoadedBook,
    book_path: PathBuf,
    config: AppConfig,
    client: AnnotationClient,
    bookmark: Option<Bookmark>,
    preferences: Option<Preferences>,
) -> iced::Result {
    let window_settings = window::Settings {
        size: Size::new(1100.0, 800.0),
        ..window::Settings::default()
    };

    iced::application(App::title, App::update, App::view)
        .window(window_settings)
        .subscription(App::subscription)
        .theme(|app: &App| match app.preferences.theme {
            ThemeMode::Night => Theme::Dark,
            ThemeMode::Day => Theme::Light,
        })
        .run_with(move || App::bootstrap(book, book_path, config, client, bookmark, preferences))
}
