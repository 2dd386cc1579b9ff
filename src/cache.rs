//! Per-book cache: last chapter read, reading preferences and downloaded
//! copies of remote books.
//!
//! Everything lives under `.cache/<sha256 of the book source>/` as small TOML
//! files. Reads that fail return `None`; writes are best-effort and only log.

use crate::config::ThemeMode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CACHE_DIR: &str = ".cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub chapter: usize,
}

/// Reading preferences edited from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: ThemeMode,
    pub font_size: u32,
}

/// Cache directory for a book path or URL.
pub fn hash_dir(source: &str) -> PathBuf {
    hash_dir_in(Path::new(CACHE_DIR), source)
}

fn hash_dir_in(root: &Path, source: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    root.join(hash)
}

/// Where a remote book is stored once downloaded.
pub fn download_path(url: &str) -> PathBuf {
    hash_dir(url).join("book.epub")
}

pub fn load_bookmark(book: &Path) -> Option<Bookmark> {
    read_toml(&book_dir(book).join("bookmark.toml"))
}

pub fn save_bookmark(book: &Path, bookmark: Bookmark) {
    write_toml(&book_dir(book).join("bookmark.toml"), &bookmark);
}

pub fn load_preferences(book: &Path) -> Option<Preferences> {
    read_toml(&book_dir(book).join("preferences.toml"))
}

pub fn save_preferences(book: &Path, preferences: Preferences) {
    write_toml(&book_dir(book).join("preferences.toml"), &preferences);
}

fn book_dir(book: &Path) -> PathBuf {
    hash_dir(&book.as_os_str().to_string_lossy())
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let data = fs::read_to_string(path).ok()?;
    match toml::from_str(&data) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), "Ignoring unreadable cache entry: {err}");
            None
        }
    }
}

fn write_toml<T: Serialize>(path: &Path, value: &T) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!(path = %parent.display(), "Failed to create cache directory: {err}");
            return;
        }
    }
    match toml::to_string(value) {
        Ok(contents) => match fs::write(path, contents) {
            Ok(()) => debug!(path = %path.display(), "Saved cache entry"),
            Err(err) => warn!(path = %path.display(), "Failed to write cache entry: {err}"),
        },
        Err(err) => warn!("Failed to serialize cache entry: {err}"),
    }
}
