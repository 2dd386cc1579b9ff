//! Entry point for the Scholia reader.
//!
//! - Parse the optional book path or URL from the command line.
//! - Load configuration from `conf/config.toml`.
//! - Download the book on first use when it is remote.
//! - Load the EPUB and launch the GUI.

mod app;
mod cache;
mod config;
mod download;
mod epub_loader;

use crate::app::run_app;
use crate::cache::{load_bookmark, load_preferences};
use crate::config::load_config;
use crate::download::resolve_book;
use crate::epub_loader::load_book;
use anyhow::{Context, Result, anyhow};
use scholia_core::AnnotationClient;
use std::env;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let config = load_config(Path::new("conf/config.toml"));
    if env::var_os("RUST_LOG").is_none() {
        set_log_level(reload_handle, config.logging.log_level.as_filter_str());
    }

    let source = parse_args()?.unwrap_or_else(|| config.book.source.clone());
    info!(%source, level = %config.logging.log_level, "Starting Scholia");
    if config.annotation.is_configured() {
        info!(endpoint = %config.annotation.endpoint, "Annotation service configured");
    } else {
        warn!("No annotation credential configured; AI Context will show a setup message");
    }

    let book_path = resolve_book(&source)?;
    let book = load_book(&book_path)?;
    let bookmark = load_bookmark(&book_path);
    if let Some(bookmark) = &bookmark {
        info!(chapter = bookmark.chapter + 1, "Found cached bookmark");
    }
    let preferences = load_preferences(&book_path);
    let client =
        AnnotationClient::from_config(&config.annotation).context("Failed to set up annotation client")?;

    run_app(book, book_path, config, client, bookmark, preferences)
        .context("Failed to start the GUI")?;
    Ok(())
}

/// `scholia [path-or-url]`; without an argument the configured book is opened.
fn parse_args() -> Result<Option<String>> {
    let mut args = env::args().skip(1);
    let source = args.next();
    if args.next().is_some() {
        return Err(anyhow!("Usage: scholia [path-or-url]"));
    }
    Ok(source)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    info!("Logging initialized; override level with logging.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
