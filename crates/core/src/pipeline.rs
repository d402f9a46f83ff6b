//! Document conversion driver.
//!
//! The core never touches PDF bytes. A [`PageSource`] hands over one page at
//! a time as raw glyph runs plus annotations; everything after that is pure.

use chrono::NaiveDate;
use serde::Serialize;

use crate::assemble::{Document, DocumentStats, PageText};
use crate::config::LayoutConfig;
use crate::error::{ConvertError, DecodeError};
use crate::filename;
use crate::glyph::{GlyphIndex, RawGlyph};
use crate::lines;
use crate::links::{self, Annotation};
use crate::markup::{self, MarkupDocument};

/// One page as delivered by the decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub glyphs: Vec<RawGlyph>,
    pub annotations: Vec<Annotation>,
}

/// External page decoder.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Load a page by 1-based number.
    fn load_page(&mut self, number: usize) -> Result<RawPage, DecodeError>;
}

/// The JSON body sent to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadPayload {
    pub filename: String,
    pub content: String,
}

/// Result of converting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedDocument {
    /// Name of the input file.
    pub source_name: String,
    /// Derived output name, without extension.
    pub filename: String,
    pub markup: MarkupDocument,
    pub page_count: usize,
    pub link_count: usize,
}

impl ConvertedDocument {
    pub fn markdown_name(&self) -> String {
        format!("{}.md", self.filename)
    }

    pub fn upload_payload(&self) -> UploadPayload {
        UploadPayload {
            filename: self.markdown_name(),
            content: self.markup.content.clone(),
        }
    }
}

/// Percentage of pages done, rounded to the nearest integer.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Decode and reconstruct one page.
pub fn read_page(
    source: &mut dyn PageSource,
    number: usize,
    config: &LayoutConfig,
) -> Result<PageText, ConvertError> {
    let raw = source
        .load_page(number)
        .map_err(|source| ConvertError::Decode { page: number, source })?;

    let index = GlyphIndex::build(number, raw.glyphs)?;
    let (lines, raw_text) = lines::reconstruct(&index, config);
    let links = links::associate(&raw.annotations, &index, config.link_padding);

    log::debug!(
        "page {number}: {} runs, {} lines, {}/{} links resolved",
        index.len(),
        lines.len(),
        links.len(),
        raw.annotations.len()
    );

    Ok(PageText {
        page_number: number,
        lines,
        raw_text,
        links,
    })
}

/// Read every page in order. Any failure discards the pages read so far.
pub fn read_document(
    source: &mut dyn PageSource,
    config: &LayoutConfig,
    progress: &mut dyn FnMut(u8),
) -> Result<Document, ConvertError> {
    let total = source.page_count();
    let mut pages = Vec::with_capacity(total);

    for number in 1..=total {
        pages.push(read_page(source, number, config)?);
        progress(progress_percent(number, total));
    }

    Ok(Document::from_pages(pages))
}

/// Convert one document end to end.
///
/// `today` feeds the filename fallback and the year of month/day-only dates.
pub fn convert_document(
    source: &mut dyn PageSource,
    original_name: &str,
    today: NaiveDate,
    config: &LayoutConfig,
    progress: &mut dyn FnMut(u8),
) -> Result<ConvertedDocument, ConvertError> {
    let document = read_document(source, config, progress)?;

    let markup = markup::generate(&document);
    let filename = filename::generate(document.first_page_text(), original_name, today);
    let stats = DocumentStats::from(&document);

    log::info!(
        "converted {original_name} -> {filename}.md ({} pages, {} links)",
        stats.pages,
        stats.links
    );

    Ok(ConvertedDocument {
        source_name: original_name.to_string(),
        filename,
        markup,
        page_count: stats.pages,
        link_count: stats.links,
    })
}
