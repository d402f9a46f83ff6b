use std::path::PathBuf;

use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pdfmark_core::pipeline::{self, ConvertedDocument};
use pdfmark_core::LayoutConfig;

#[derive(Debug, clap::Parser)]
#[command(name = "convert")]
#[command(about = "Convert a single PDF to Markdown")]
pub struct App {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Write `<name>.md` into this directory instead of printing to stdout
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Also write the HTML preview (requires --out-dir)
    #[arg(long, requires = "out_dir")]
    pub preview: bool,

    /// Print the conversion result as JSON
    #[arg(long, conflicts_with = "out_dir")]
    pub json: bool,
}

/// Page progress bar, 0 to 100.
pub fn progress_bar(name: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos:>3}%")
            .map_err(|e| eyre!("Invalid progress template: {}", e))?
            .progress_chars("=> "),
    );
    bar.set_message(name.to_string());
    Ok(bar)
}

/// Open and convert one file, reporting page progress on `bar`.
pub fn convert_file(
    path: &std::path::Path,
    config: &LayoutConfig,
    bar: &ProgressBar,
) -> Result<ConvertedDocument> {
    let name = crate::output::display_name(path)?;
    let mut source = crate::output::open_source(path)
        .with_context(|| f!("Failed to open {}", path.display()))?;

    pipeline::convert_document(
        &mut source,
        &name,
        crate::output::today(),
        config,
        &mut |percent| bar.set_position(u64::from(percent)),
    )
    .with_context(|| f!("Failed to convert {}", path.display()))
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = global.layout();
    if global.verbose {
        eprintln!(
            "Layout: line gap {}, word gap {}, link padding {}",
            config.line_gap, config.word_gap, config.link_padding
        );
    }

    let bar = progress_bar(&app.path.display().to_string())?;
    let document = convert_file(&app.path, &config, &bar);
    bar.finish_and_clear();
    let document = document?;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    match app.out_dir {
        Some(dir) => {
            let written = crate::output::write_document(&document, &dir, app.preview)?;
            for path in written {
                eprintln!("{} {}", "Wrote".green().bold(), path.display());
            }
            if global.verbose {
                eprintln!(
                    "{} pages, {} links",
                    document.page_count, document.link_count
                );
            }
        }
        None => println!("{}", document.markup.content),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_preview_requires_out_dir() {
        assert!(App::try_parse_from(["convert", "a.pdf", "--preview"]).is_err());
        assert!(App::try_parse_from(["convert", "a.pdf", "--preview", "-o", "out"]).is_ok());
    }

    #[test]
    fn test_json_conflicts_with_out_dir() {
        assert!(App::try_parse_from(["convert", "a.pdf", "--json", "--out-dir", "out"]).is_err());
    }

    #[test]
    fn test_convert_file_reports_missing_input() {
        let bar = ProgressBar::hidden();
        let err = convert_file(
            std::path::Path::new("/nonexistent/241018 저녁시그널.pdf"),
            &LayoutConfig::default(),
            &bar,
        )
        .unwrap_err();

        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_convert_file_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, "not a pdf").unwrap();

        let bar = ProgressBar::hidden();
        assert!(convert_file(&path, &LayoutConfig::default(), &bar).is_err());
    }
}
