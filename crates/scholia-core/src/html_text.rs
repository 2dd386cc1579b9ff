//! Plain-text rendering of chapter markup.
//!
//! Every call parses its own copy of the markup, so the document a surface
//! holds is never touched. Script-like subtrees are dropped and block
//! elements become line breaks, which keeps the reading order of the chapter.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));

const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "head"];

const PARAGRAPHS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "figure",
    "table",
];

const BLOCKS: &[&str] = &[
    "div", "section", "article", "aside", "header", "footer", "nav", "main", "li", "ul", "ol",
    "dl", "dt", "dd", "tr", "figcaption", "hr", "address",
];

/// Visible text of the document body.
pub fn plain_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut sink = TextSink::default();
    collect(root, &mut sink);
    sink.finish()
}

/// Trimmed `<title>` text, if the document has a non-empty one.
pub fn document_title(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let title = document.select(&TITLE).next()?;
    let text = title.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn collect(element: ElementRef<'_>, sink: &mut TextSink) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => sink.push_text(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if name == "br" {
                    sink.line_break();
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if PARAGRAPHS.contains(&name) {
                    sink.paragraph_break();
                    collect(child_el, sink);
                    sink.paragraph_break();
                } else if BLOCKS.contains(&name) {
                    sink.line_break();
                    collect(child_el, sink);
                    sink.line_break();
                } else {
                    collect(child_el, sink);
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct TextSink {
    buf: String,
    pending_space: bool,
}

impl TextSink {
    fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.buf.is_empty() && !self.buf.ends_with('\n') {
                self.buf.push(' ');
            }
            self.pending_space = false;
            self.buf.push(ch);
        }
    }

    fn line_break(&mut self) {
        self.buf.push('\n');
        self.pending_space = false;
    }

    fn paragraph_break(&mut self) {
        self.buf.push_str("\n\n");
        self.pending_space = false;
    }

    fn finish(self) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for line in self.buf.lines().map(str::trim) {
            if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
                continue;
            }
            lines.push(line);
        }
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_script_and_style_content() {
        let markup = r#"<html><head><title>Ch 1</title><style>p { color: red }</style></head>
            <body><p>First line.</p><script>var hidden = 1;</script><p>Second line.</p></body></html>"#;
        let text = plain_text(markup);
        assert_eq!(text, "First line.\n\nSecond line.");
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn keeps_reading_order_and_collapses_whitespace() {
        let markup = "<body><h1>Chapter   One</h1>\n<p>Once   upon\n a <em>time</em>.</p>\
                      <div>Line<br/>break</div></body>";
        assert_eq!(
            plain_text(markup),
            "Chapter One\n\nOnce upon a time.\n\nLine\nbreak"
        );
    }

    #[test]
    fn empty_body_yields_empty_text() {
        assert_eq!(plain_text("<html><body>  \n </body></html>"), "");
        assert_eq!(plain_text(""), "");
    }

    #[test]
    fn fragments_without_body_still_render() {
        assert_eq!(plain_text("<p>loose</p>"), "loose");
    }

    #[test]
    fn title_is_trimmed_and_optional() {
        assert_eq!(
            document_title("<html><head><title>  The\n Castle </title></head></html>"),
            Some("The Castle".to_string())
        );
        assert_eq!(document_title("<html><head><title> </title></head></html>"), None);
        assert_eq!(document_title("<p>no head</p>"), None);
    }
}
