use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use pdfmark_core::batch::{convert_batch, BatchEvent, BatchFailure, BatchReport};
use pdfmark_core::error::{ConvertError, DecodeError};

#[derive(Debug, clap::Parser)]
#[command(name = "batch")]
#[command(about = "Convert many PDFs, skipping duplicates")]
pub struct App {
    /// PDF files to convert, in order
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Directory the Markdown files are written to
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Also write HTML previews
    #[arg(long)]
    pub preview: bool,

    /// Upload every converted document afterwards
    #[arg(long)]
    pub upload: bool,

    /// Upload endpoint (overrides PDFMARK_UPLOAD_URL)
    #[arg(long, requires = "upload")]
    pub endpoint: Option<String>,
}

/// Input file names, keyed back to their paths.
///
/// Names drive de-duplication and name derivation; a later path with an
/// already seen file name is a duplicate anyway.
fn index_inputs(paths: &[PathBuf]) -> Result<(Vec<String>, HashMap<String, PathBuf>)> {
    let mut names = Vec::with_capacity(paths.len());
    let mut by_name = HashMap::new();

    for path in paths {
        let name = crate::output::display_name(path)?;
        by_name.entry(name.clone()).or_insert_with(|| path.clone());
        names.push(name);
    }

    Ok((names, by_name))
}

/// Run the batch and write every converted document into `out_dir`.
pub fn run_batch(
    paths: &[PathBuf],
    out_dir: &Path,
    preview: bool,
    config: &pdfmark_core::LayoutConfig,
) -> Result<BatchReport> {
    let (names, by_name) = index_inputs(paths)?;

    let bar = crate::convert::progress_bar("")?;
    let mut report = convert_batch(
        &names,
        |name| match by_name.get(name) {
            Some(path) => crate::output::open_source(path),
            None => Err(ConvertError::Open(DecodeError::new(f!("unknown input {name}")))),
        },
        crate::output::today(),
        config,
        &mut |event| match event {
            BatchEvent::Skipped { name } => {
                bar.println(f!("{} {name}", "Skipped".yellow().bold()));
            }
            BatchEvent::Started {
                name,
                position,
                total,
            } => {
                bar.reset();
                bar.set_message(f!("[{position}/{total}] {name}"));
            }
            BatchEvent::Page { percent, .. } => bar.set_position(u64::from(percent)),
            BatchEvent::Converted { document } => {
                bar.println(f!(
                    "{} {} -> {}",
                    "Converted".green().bold(),
                    document.source_name,
                    document.markdown_name()
                ));
            }
            BatchEvent::Failed { name, error } => {
                bar.println(f!("{} {name}: {error}", "Failed".red().bold()));
            }
        },
    );
    bar.finish_and_clear();

    write_all(&mut report, out_dir, preview);

    Ok(report)
}

/// Write every converted document. A document that cannot be written, or
/// whose output name was already written by an earlier input, moves from
/// `converted` to `failures`.
pub fn write_all(report: &mut BatchReport, out_dir: &Path, preview: bool) {
    let mut written = HashSet::new();

    for document in std::mem::take(&mut report.converted) {
        let name = document.markdown_name();
        let result = if written.contains(&name) {
            Err(eyre!("output {name} already written by an earlier input"))
        } else {
            crate::output::write_document(&document, out_dir, preview)
        };

        match result {
            Ok(_) => {
                written.insert(name);
                report.converted.push(document);
            }
            Err(err) => {
                log::warn!("failed to write {}: {err:#}", document.source_name);
                report.failures.push(BatchFailure {
                    source_name: document.source_name,
                    message: f!("{err:#}"),
                });
            }
        }
    }
}

pub fn print_summary(report: &BatchReport) {
    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "Input".bold().cyan(),
        "Result".bold().cyan(),
        "Detail".bold().cyan()
    ]);

    for document in &report.converted {
        table.add_row(prettytable::row![
            document.source_name,
            "converted".green(),
            f!(
                "{} ({} pages, {} links)",
                document.markdown_name(),
                document.page_count,
                document.link_count
            )
        ]);
    }
    for failure in &report.failures {
        table.add_row(prettytable::row![
            failure.source_name,
            "failed".red(),
            failure.message
        ]);
    }
    for name in &report.duplicates {
        table.add_row(prettytable::row![name, "skipped".yellow(), "duplicate"]);
    }

    table.printstd();
    println!(
        "\n{} converted, {} failed, {} skipped",
        report.converted.len(),
        report.failures.len(),
        report.duplicates.len()
    );
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    // Resolve upload settings before spending time on conversion.
    let upload_config = if app.upload {
        Some(crate::upload::UploadConfig::from_env(app.endpoint.clone())?)
    } else {
        None
    };

    let report = run_batch(&app.paths, &app.out_dir, app.preview, &global.layout())?;
    print_summary(&report);

    if let Some(config) = upload_config {
        let payloads: Vec<_> = report
            .converted
            .iter()
            .map(|document| document.upload_payload())
            .collect();
        crate::upload::upload_and_report(&payloads, &config).await?;
    }

    if !report.failures.is_empty() {
        eprintln!(
            "{}",
            f!("{} of {} inputs failed", report.failures.len(), report.total()).red()
        );
    }

    Ok(())
}
