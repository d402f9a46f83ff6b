use std::path::{Path, PathBuf};

use crate::prelude::*;
use chrono::NaiveDate;
use pdf::LopdfSource;
use pdfmark_core::error::{ConvertError, DecodeError};
use pdfmark_core::pipeline::ConvertedDocument;

/// The local calendar date, fed to name derivation.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// File name of an input path, used as the document's original name.
pub fn display_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidInput(path.display().to_string()).into())
}

pub fn open_source(path: &Path) -> Result<LopdfSource, ConvertError> {
    LopdfSource::open(path).map_err(|err| ConvertError::Open(DecodeError::from(err)))
}

/// Write `<name>.md`, and `<name>.html` when `preview` is set, into `out_dir`.
pub fn write_document(
    document: &ConvertedDocument,
    out_dir: &Path,
    preview: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| f!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::new();

    let markdown = out_dir.join(document.markdown_name());
    std::fs::write(&markdown, &document.markup.content)
        .with_context(|| f!("Failed to write {}", markdown.display()))?;
    written.push(markdown);

    if preview {
        let html = out_dir.join(f!("{}.html", document.filename));
        std::fs::write(&html, &document.markup.preview)
            .with_context(|| f!("Failed to write {}", html.display()))?;
        written.push(html);
    }

    Ok(written)
}
