//! Core library for pdfmark
//!
//! This crate implements the **Functional Core** of the pdfmark application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The pdfmark project is split in three crates:
//!
//! - **`pdfmark_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: The `lopdf` decoder adapter, implementing [`pipeline::PageSource`]
//! - **`pdfmark`**: File I/O, progress reporting and uploads (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no clock reads; "today" is passed in
//! - **Testable**: Tested with fixture glyph runs, no PDF files required
//!
//! # Module Organization
//!
//! Modules follow the data flow of a conversion:
//!
//! - [`glyph`]: Normalizes decoder glyph runs and their bounding boxes
//! - [`lines`]: Clusters runs into visual lines and page text
//! - [`links`]: Recovers anchor text for link annotations
//! - [`assemble`]: Joins pages and flattens their links
//! - [`markup`]: Markdown generation (links, headings, spacing)
//! - [`preview`]: Simplified HTML preview of the generated Markdown
//! - [`filename`]: Output names, sanitization and de-duplication keys
//! - [`pipeline`]: Drives a [`pipeline::PageSource`] through all of the above
//! - [`batch`]: Sequential conversion of many documents
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use pdfmark_core::markup::format_text;
//! use pdfmark_core::links::ResolvedLink;
//!
//! let links = vec![ResolvedLink {
//!     text: "삼성전자".to_string(),
//!     url: "https://ex.com".to_string(),
//!     rect: [0.0, 0.0, 0.0, 0.0],
//! }];
//!
//! let markdown = format_text("2024.10.18.(금)\n삼성전자 목표가 상향", &links);
//! assert_eq!(markdown, "# 2024.10.18.(금)\n\n[삼성전자](https://ex.com) 목표가 상향");
//! ```

pub mod assemble;
pub mod batch;
pub mod config;
pub mod error;
pub mod filename;
pub mod glyph;
pub mod lines;
pub mod links;
pub mod markup;
pub mod pipeline;
pub mod preview;

pub use config::LayoutConfig;
pub use error::{ConvertError, DecodeError};
