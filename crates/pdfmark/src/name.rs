use std::path::{Path, PathBuf};

use crate::prelude::{println, *};
use chrono::NaiveDate;
use pdfmark_core::pipeline::{self, PageSource};
use pdfmark_core::{filename, LayoutConfig};

#[derive(Debug, clap::Parser)]
#[command(name = "name")]
#[command(about = "Print the output name derived for a PDF")]
pub struct App {
    /// Path to the PDF file
    pub path: PathBuf,
}

/// Derive the output name from the first page only.
pub fn derive_name(
    source: &mut dyn PageSource,
    original_name: &str,
    today: NaiveDate,
    config: &LayoutConfig,
) -> Result<String> {
    let first_page = if source.page_count() == 0 {
        String::new()
    } else {
        pipeline::read_page(source, 1, config)?.raw_text
    };

    Ok(filename::generate(&first_page, original_name, today))
}

fn name_for(path: &Path, config: &LayoutConfig) -> Result<String> {
    let original_name = crate::output::display_name(path)?;
    let mut source = crate::output::open_source(path)
        .with_context(|| f!("Failed to open {}", path.display()))?;

    derive_name(&mut source, &original_name, crate::output::today(), config)
        .with_context(|| f!("Failed to read the first page of {}", path.display()))
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let name = name_for(&app.path, &global.layout())?;
    println!("{name}");
    Ok(())
}
