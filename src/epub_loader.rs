//! EPUB loading.
//!
//! Opens a book with the `epub` crate and keeps each spine item's markup
//! intact; the reading surface extracts text from it later. The table of
//! contents is flattened into a list with depths and resolved against the
//! spine up front.

use anyhow::{Context, Result, anyhow};
use epub::doc::{EpubDoc, NavPoint};
use scholia_core::html_text::document_title;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Chapter {
    pub href: String,
    pub title: String,
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    pub href: String,
    pub depth: usize,
    /// Spine index the entry points into, when it could be resolved.
    pub chapter: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct LoadedBook {
    pub title: String,
    pub chapters: Vec<Chapter>,
    pub toc: Vec<TocEntry>,
}

pub fn load_book(path: &Path) -> Result<LoadedBook> {
    info!(path = %path.display(), "Loading EPUB");
    let mut doc =
        EpubDoc::new(path).with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

    let mut toc = Vec::new();
    flatten_toc(&doc.toc, 0, &mut toc);

    let mut chapters = Vec::with_capacity(doc.get_num_chapters());
    for index in 0..doc.get_num_chapters() {
        if !doc.set_current_chapter(index) {
            warn!(chapter = index, "Spine item could not be selected; skipping");
            continue;
        }
        let Some((markup, mime)) = doc.get_current_str() else {
            warn!(chapter = index, "Spine item has no readable content; skipping");
            continue;
        };
        let href = doc
            .spine
            .get(index)
            .and_then(|item| doc.resources.get(&item.idref))
            .map(|resource| resource.path.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|| format!("chapter-{index}"));
        debug!(chapter = index, %href, %mime, bytes = markup.len(), "Loaded chapter");
        chapters.push(Chapter {
            title: String::new(),
            href,
            markup,
        });
    }

    if chapters.is_empty() {
        return Err(anyhow!("No readable chapters in {}", path.display()));
    }

    for entry in &mut toc {
        entry.chapter = chapter_index_for_href(&chapters, &entry.href);
    }
    for (index, chapter) in chapters.iter_mut().enumerate() {
        chapter.title = toc
            .iter()
            .find(|entry| entry.chapter == Some(index))
            .map(|entry| entry.label.clone())
            .or_else(|| document_title(&chapter.markup))
            .unwrap_or_else(|| format!("Chapter {}", index + 1));
    }

    let title = doc
        .mdata("title")
        .map(|meta| meta.value.trim().to_string())
        .filter(|title| !title.is_empty())
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Untitled".to_string());

    info!(
        %title,
        chapters = chapters.len(),
        toc_entries = toc.len(),
        "Finished loading EPUB"
    );
    Ok(LoadedBook {
        title,
        chapters,
        toc,
    })
}

fn flatten_toc(points: &[NavPoint], depth: usize, out: &mut Vec<TocEntry>) {
    for point in points {
        out.push(TocEntry {
            label: point.label.trim().to_string(),
            href: point.content.to_string_lossy().replace('\\', "/"),
            depth,
            chapter: None,
        });
        flatten_toc(&point.children, depth + 1, out);
    }
}

/// Spine index for a TOC target. Fragments are ignored and either path may be
/// relative to the other, since TOC files and the package file often sit in
/// different directories.
pub fn chapter_index_for_href(chapters: &[Chapter], href: &str) -> Option<usize> {
    let target = href.split('#').next().unwrap_or(href).trim_start_matches("./");
    if target.is_empty() {
        return None;
    }
    chapters
        .iter()
        .position(|chapter| chapter.href == target)
        .or_else(|| {
            chapters.iter().position(|chapter| {
                path_suffix_matches(&chapter.href, target) || path_suffix_matches(target, &chapter.href)
            })
        })
}

fn path_suffix_matches(path: &str, suffix: &str) -> bool {
    path.strip_suffix(suffix)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(hrefs: &[&str]) -> Vec<Chapter> {
        hrefs
            .iter()
            .map(|href| Chapter {
                href: href.to_string(),
                title: String::new(),
                markup: String::new(),
            })
            .collect()
    }

    #[test]
    fn exact_hrefs_resolve() {
        let book = chapters(&["OEBPS/intro.xhtml", "OEBPS/ch1.xhtml"]);
        assert_eq!(chapter_index_for_href(&book, "OEBPS/ch1.xhtml"), Some(1));
    }

    #[test]
    fn fragments_and_relative_prefixes_are_ignored() {
        let book = chapters(&["OEBPS/text/intro.xhtml", "OEBPS/text/ch1.xhtml"]);
        assert_eq!(chapter_index_for_href(&book, "text/ch1.xhtml#sec2"), Some(1));
        assert_eq!(chapter_index_for_href(&book, "./text/intro.xhtml"), Some(0));
    }

    #[test]
    fn partial_file_names_do_not_match() {
        let book = chapters(&["OEBPS/ch11.xhtml"]);
        assert_eq!(chapter_index_for_href(&book, "1.xhtml"), None);
        assert_eq!(chapter_index_for_href(&book, "#top"), None);
    }

    #[test]
    fn missing_files_fail_to_load() {
        let err = load_book(Path::new("does/not/exist.epub")).expect_err("missing");
        assert!(err.to_string().contains("Failed to open EPUB"));
    }
}
