//! Resolves the book source given on the command line or in the config to a
//! local file, downloading remote books once into the cache.

use crate::cache::download_path;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Local path for `source`. Remote books are fetched only when no cached copy
/// exists yet.
pub fn resolve_book(source: &str) -> Result<PathBuf> {
    if !is_remote(source) {
        let path = PathBuf::from(source);
        if !path.exists() {
            return Err(anyhow!("File not found: {}", path.display()));
        }
        return Ok(path);
    }

    let target = download_path(source);
    if target.exists() {
        info!(path = %target.display(), "File already exists. Skipping download.");
        return Ok(target);
    }

    info!(url = source, "Downloading book");
    download_to(source, &target)?;
    Ok(target)
}

fn download_to(url: &str, target: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(concat!("scholia/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let bytes = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .with_context(|| format!("Failed to download {url}"))?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    // An interrupted download must never leave a file at `target`.
    let partial = target.with_extension("part");
    fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    fs::rename(&partial, target)
        .with_context(|| format!("Failed to move download into {}", target.display()))?;
    info!(path = %target.display(), bytes = bytes.len(), "Download complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_sources_are_remote() {
        assert!(is_remote("https://example.org/a.epub"));
        assert!(is_remote("http://example.org/a.epub"));
        assert!(!is_remote("books/a.epub"));
        assert!(!is_remote("file:///tmp/a.epub"));
    }

    #[test]
    fn local_sources_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = dir.path().join("a.epub");
        fs::write(&book, b"epub").expect("write");
        let source = book.to_string_lossy().into_owned();
        assert_eq!(resolve_book(&source).expect("local book"), book);

        let missing = dir.path().join("missing.epub");
        let err = resolve_book(&missing.to_string_lossy()).expect_err("missing book");
        assert!(err.to_string().contains("File not found"));
    }
}
