//! `lopdf` adapter for the pdfmark pipeline.
//!
//! [`LopdfSource`] implements the core's [`PageSource`]: each page's content
//! stream is walked by the span extractor and its link annotations are read
//! from `/Annots`.
//!
//! [`PageSource`]: pdfmark_core::pipeline::PageSource

use pdfmark_core::error::DecodeError;
use thiserror::Error;

pub mod parser;
pub mod source;
pub mod text;

pub use source::LopdfSource;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page not found: {0}")]
    PageNotFound(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for DecodeError {
    fn from(e: PdfError) -> Self {
        DecodeError::new(e.to_string())
    }
}
