//! Sequential multi-document conversion.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::ConvertError;
use crate::filename;
use crate::pipeline::{self, ConvertedDocument, PageSource};

/// A document that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub source_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub converted: Vec<ConvertedDocument>,
    pub failures: Vec<BatchFailure>,
    /// Inputs skipped because an earlier input has the same de-duplication key.
    pub duplicates: Vec<String>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failures.len() + self.duplicates.len()
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Skipped { name: &'a str },
    Started { name: &'a str, position: usize, total: usize },
    Page { name: &'a str, percent: u8 },
    Converted { document: &'a ConvertedDocument },
    Failed { name: &'a str, error: &'a ConvertError },
}

/// Convert many documents one after another.
///
/// Names are de-duplicated first; only the first of each group is opened.
/// A document that fails to open or convert is recorded and the batch moves
/// on to the next one.
pub fn convert_batch<S, F>(
    names: &[String],
    mut open: F,
    today: NaiveDate,
    config: &LayoutConfig,
    observer: &mut dyn FnMut(BatchEvent<'_>),
) -> BatchReport
where
    S: PageSource,
    F: FnMut(&str) -> Result<S, ConvertError>,
{
    let (unique, duplicates) = filename::partition_duplicates(names.iter().map(String::as_str));
    for name in duplicates.iter().copied() {
        log::debug!("skipping duplicate input {name}");
        observer(BatchEvent::Skipped { name });
    }

    let mut report = BatchReport {
        duplicates: duplicates.into_iter().map(str::to_string).collect(),
        ..BatchReport::default()
    };

    let total = unique.len();
    for (i, name) in unique.into_iter().enumerate() {
        observer(BatchEvent::Started {
            name,
            position: i + 1,
            total,
        });

        let result = open(name).and_then(|mut source| {
            pipeline::convert_document(&mut source, name, today, config, &mut |percent| {
                observer(BatchEvent::Page { name, percent })
            })
        });

        match result {
            Ok(document) => {
                observer(BatchEvent::Converted { document: &document });
                report.converted.push(document);
            }
            Err(error) => {
                log::warn!("failed to convert {name}: {error}");
                observer(BatchEvent::Failed { name, error: &error });
                report.failures.push(BatchFailure {
                    source_name: name.to_string(),
                    message: error.to_string(),
                });
            }
        }
    }

    report
}
