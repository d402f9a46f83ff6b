//! Markdown generation.
//!
//! Turns assembled document text plus resolved links into Markdown:
//!
//! 1. whitespace cleanup
//! 2. link embedding, longest anchor text first, each URL at most once
//! 3. removal of bare copies of the URLs that were embedded, so a line left
//!    with only its text can still become a heading
//! 4. heading detection from an ordered rule table
//! 5. spacing normalization around headings and item markers
//!
//! Every step is a heuristic. A miss leaves the line as plain text.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::assemble::Document;
use crate::links::ResolvedLink;
use crate::preview;

/// Anchor texts shorter than this (in characters) are never embedded.
pub const MIN_ANCHOR_CHARS: usize = 3;

/// Longest line that may be promoted to a section heading.
const MAX_SECTION_CHARS: usize = 50;

/// Keyword headings must be shorter than this.
const MAX_KEYWORD_SECTION_CHARS: usize = 30;

const SECTION_KEYWORDS: [&str; 9] = [
    "뉴스", "기사", "요약", "분석", "전망", "이슈", "개별주", "시장", "종목",
];

/// Item markers that get a blank line in front of them.
const ITEM_MARKERS: [char; 6] = ['●', '◆', '★', '■', '▶', '►'];

/// Generated Markdown plus its HTML preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkupDocument {
    pub content: String,
    pub preview: String,
}

/// Heading level assigned to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// `#`, a dated report header.
    Date,
    /// `##`, a section title.
    Section,
}

impl HeadingLevel {
    pub fn marker(&self) -> &'static str {
        match self {
            HeadingLevel::Date => "#",
            HeadingLevel::Section => "##",
        }
    }
}

fn date_heading_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            r"^[0-9]{4}\.[0-9]{1,2}\.[0-9]{1,2}",
            r"^[0-9]{6}\s*\([월화수목금토일]\)",
            r"^\[\s*[0-9]+월\s*[0-9]+일",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn section_heading_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        [r"^<\s*.+\s*>$", r"^【.+】$", r"^\[.+\]$"]
            .iter()
            .map(|p| Regex::new(p).unwrap())
            .collect()
    })
}

fn heading_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}(\s|$)").unwrap())
}

/// An inline `[text](url)` link. The URL may hold one level of balanced
/// parentheses, as in `https://en.wikipedia.org/wiki/Rust_(language)`.
/// Anchor text containing `]` is not recognized.
fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]\((?:[^()\s]|\([^()\s]*\))*\)").unwrap())
}

fn collapse_blank_lines(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap());
    re.replace_all(text, "\n\n").to_string()
}

/// Collapse runs of spaces/tabs, cap blank lines at one, trim every line.
pub fn clean_text(text: &str) -> String {
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t]+").unwrap());

    let result = re_spaces.replace_all(text, " ");
    let result = collapse_blank_lines(&result);
    trim_lines(&result)
}

fn trim_lines(text: &str) -> String {
    text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n")
}

/// True when the line already starts with an ATX heading marker.
pub fn is_heading_line(line: &str) -> bool {
    heading_marker_re().is_match(line)
}

/// Classify a line, first matching rule wins.
pub fn classify_heading(line: &str) -> Option<HeadingLevel> {
    let trimmed = line.trim();

    if date_heading_rules().iter().any(|re| re.is_match(trimmed)) {
        return Some(HeadingLevel::Date);
    }

    let chars = trimmed.chars().count();
    if chars == 0 || chars > MAX_SECTION_CHARS {
        return None;
    }

    if section_heading_rules().iter().any(|re| re.is_match(trimmed)) {
        return Some(HeadingLevel::Section);
    }

    if chars < MAX_KEYWORD_SECTION_CHARS && SECTION_KEYWORDS.iter().any(|k| trimmed.contains(k)) {
        return Some(HeadingLevel::Section);
    }

    None
}

/// Prefix heading lines with their marker. Lines that are already headings
/// are left alone.
pub fn format_headings(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if is_heading_line(line) {
                return line.to_string();
            }
            match classify_heading(line) {
                Some(level) => format!("{} {}", level.marker(), line),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Link embedding state for one document.
///
/// Remembers which URLs were embedded, in embedding order, so their bare
/// copies can be removed afterwards.
#[derive(Debug, Default)]
pub struct LinkEmbedder {
    consumed: HashSet<String>,
    order: Vec<String>,
}

impl LinkEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs embedded so far, in order.
    pub fn consumed(&self) -> &[String] {
        &self.order
    }

    /// Splice `[text](url)` over the first free occurrence of each anchor.
    ///
    /// Candidates are tried longest first so a short anchor cannot break up a
    /// longer one that contains it.
    pub fn embed(&mut self, text: &str, links: &[ResolvedLink]) -> String {
        let mut candidates: Vec<&ResolvedLink> = links.iter().collect();
        candidates.sort_by(|a, b| b.text.chars().count().cmp(&a.text.chars().count()));

        let mut result = text.to_string();

        for link in candidates {
            let anchor = link.text.trim();

            if anchor.chars().count() < MIN_ANCHOR_CHARS || anchor.starts_with("http") {
                log::debug!("skipping link anchor {anchor:?}");
                continue;
            }
            if self.consumed.contains(&link.url) {
                continue;
            }
            if result.contains(&format!("[{anchor}](")) {
                continue;
            }

            let Some(range) = first_free_occurrence(&result, anchor) else {
                log::debug!("anchor {anchor:?} not found in text");
                continue;
            };

            result.replace_range(range, &format!("[{anchor}]({})", link.url));
            self.consumed.insert(link.url.clone());
            self.order.push(link.url.clone());
        }

        result
    }

    /// Remove bare occurrences of embedded URLs, keeping the ones that are the
    /// target of a `](url)` link.
    pub fn remove_standalone_urls(&self, text: &str) -> String {
        let mut result = text.to_string();
        for url in &self.order {
            result = remove_bare(&result, url);
        }
        collapse_blank_lines(&result)
    }
}

/// Byte range of the first occurrence of `needle` that does not overlap an
/// existing Markdown link.
fn first_free_occurrence(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let taken: Vec<Range<usize>> = markdown_link_re()
        .find_iter(haystack)
        .map(|m| m.range())
        .collect();

    haystack
        .match_indices(needle)
        .map(|(start, _)| start..start + needle.len())
        .find(|r| !taken.iter().any(|t| r.start < t.end && t.start < r.end))
}

fn remove_bare(text: &str, url: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for (start, _) in text.match_indices(url) {
        let end = start + url.len();
        let is_target = text[..start].ends_with("](") || text[end..].starts_with(')');
        if is_target {
            continue;
        }
        out.push_str(&text[cursor..start]);
        cursor = end;
    }

    out.push_str(&text[cursor..]);
    out
}

fn starts_with_item_marker(line: &str) -> bool {
    line.chars().next().is_some_and(|c| ITEM_MARKERS.contains(&c))
}

/// Blank line before item markers, exactly one blank line around headings,
/// no runs of blank lines.
pub fn normalize_spacing(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let after_heading = out.last().is_some_and(|l| is_heading_line(l));
        if after_heading && !line.is_empty() {
            out.push("");
        }

        let needs_gap = is_heading_line(line) || starts_with_item_marker(line);
        if needs_gap && out.last().is_some_and(|l| !l.is_empty()) {
            out.push("");
        }

        if line.is_empty() && out.last().is_some_and(|l| l.is_empty()) {
            continue;
        }

        out.push(line);
    }

    collapse_blank_lines(&out.join("\n")).trim().to_string()
}

/// Format already assembled text.
pub fn format_text(text: &str, links: &[ResolvedLink]) -> String {
    let mut embedder = LinkEmbedder::new();

    let cleaned = clean_text(text);
    let linked = embedder.embed(&cleaned, links);
    let stripped = trim_lines(&embedder.remove_standalone_urls(&linked));
    let headed = format_headings(&stripped);

    normalize_spacing(&headed)
}

/// Generate Markdown and its preview for a whole document.
pub fn generate(document: &Document) -> MarkupDocument {
    let content = format_text(&document.full_text(), &document.all_links);
    let preview = preview::to_html(&content);
    MarkupDocument { content, preview }
}
