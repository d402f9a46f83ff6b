//! Multi-page assembly.

use serde::Serialize;

use crate::lines::Line;
use crate::links::ResolvedLink;

/// Characters that end a sentence, including CJK full stops and closing quotes.
const SENTENCE_ENDINGS: [char; 8] = ['.', '?', '!', '。', '」', '』', '"', '\''];

/// Everything recovered from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number.
    pub page_number: usize,
    pub lines: Vec<Line>,
    pub raw_text: String,
    pub links: Vec<ResolvedLink>,
}

/// Ordered pages plus all of their links, flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<PageText>,
    pub all_links: Vec<ResolvedLink>,
}

impl Document {
    pub fn from_pages(pages: Vec<PageText>) -> Self {
        let all_links = pages.iter().flat_map(|p| p.links.iter().cloned()).collect();
        Self { pages, all_links }
    }

    /// Page texts joined with boundary-aware separators.
    pub fn full_text(&self) -> String {
        join_pages(self.pages.iter().map(|p| p.raw_text.as_str()))
    }

    /// Text of the first page, used for filename derivation.
    pub fn first_page_text(&self) -> &str {
        self.pages.first().map(|p| p.raw_text.as_str()).unwrap_or("")
    }
}

/// Per-document counts shown by the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub pages: usize,
    pub lines: usize,
    pub links: usize,
}

impl From<&Document> for DocumentStats {
    fn from(doc: &Document) -> Self {
        Self {
            pages: doc.pages.len(),
            lines: doc.pages.iter().map(|p| p.lines.len()).sum(),
            links: doc.all_links.len(),
        }
    }
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(|c| SENTENCE_ENDINGS.contains(&c))
}

/// Join page texts. A page ending a sentence is followed by a newline,
/// otherwise the next page continues after a single space.
pub fn join_pages<'a>(pages: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;

    for text in pages {
        if let Some(prev) = previous {
            out.push(if ends_sentence(prev) { '\n' } else { ' ' });
        }
        out.push_str(text);
        previous = Some(text);
    }

    out
}
