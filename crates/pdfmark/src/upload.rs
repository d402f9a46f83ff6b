use std::path::PathBuf;
use std::time::Duration;

use crate::prelude::{println, *};
use colored::Colorize;
use pdfmark_core::pipeline::UploadPayload;

#[derive(Debug, clap::Parser)]
#[command(name = "upload")]
#[command(about = "Upload existing Markdown files")]
pub struct App {
    /// Markdown files to upload, in order
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Upload endpoint (overrides PDFMARK_UPLOAD_URL)
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Upload configuration from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    pub endpoint: String,
    /// Extra attempts after the first failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl UploadConfig {
    pub const DEFAULT_RETRIES: u32 = 2;
    pub const RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Load configuration from environment variables
    /// Uses PDFMARK_UPLOAD_URL unless `endpoint_override` is set
    /// Uses PDFMARK_UPLOAD_RETRIES with default fallback
    pub fn from_env(endpoint_override: Option<String>) -> Result<Self> {
        Ok(Self::from_lookup(
            |key| std::env::var(key).ok(),
            endpoint_override,
        )?)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        endpoint_override: Option<String>,
    ) -> std::result::Result<Self, Error> {
        let endpoint = endpoint_override
            .or_else(|| lookup("PDFMARK_UPLOAD_URL"))
            .filter(|url| !url.trim().is_empty())
            .ok_or(Error::MissingEndpoint)?;

        let retries = match lookup("PDFMARK_UPLOAD_RETRIES") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidRetries(value))?,
            None => Self::DEFAULT_RETRIES,
        };

        Ok(Self {
            endpoint,
            retries,
            retry_delay: Self::RETRY_DELAY,
        })
    }
}

/// POST one payload. Any non-2xx status is a failure.
async fn post(
    client: &reqwest::Client,
    endpoint: &str,
    payload: &UploadPayload,
) -> std::result::Result<(), Error> {
    let response = client
        .post(endpoint)
        .json(payload)
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Rejected {
            filename: payload.filename.clone(),
            status: status.as_u16(),
        });
    }

    Ok(())
}

/// POST one payload, retrying after a fixed delay.
pub async fn upload_one(
    client: &reqwest::Client,
    config: &UploadConfig,
    payload: &UploadPayload,
) -> std::result::Result<(), Error> {
    let mut attempt = 0;
    loop {
        match post(client, &config.endpoint, payload).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < config.retries => {
                attempt += 1;
                log::warn!(
                    "upload of {} failed ({err}), retry {attempt}/{}",
                    payload.filename,
                    config.retries
                );
                tokio::time::sleep(config.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Upload payloads one at a time. A failed upload does not stop the rest.
pub async fn upload_all(
    payloads: &[UploadPayload],
    config: &UploadConfig,
) -> Vec<(String, std::result::Result<(), Error>)> {
    let client = reqwest::Client::new();
    let mut results = Vec::with_capacity(payloads.len());

    for payload in payloads {
        let result = upload_one(&client, config, payload).await;
        match &result {
            Ok(()) => log::info!("uploaded {}", payload.filename),
            Err(err) => log::warn!("giving up on {}: {err}", payload.filename),
        }
        results.push((payload.filename.clone(), result));
    }

    results
}

/// Upload, print a result table and fail if any upload failed.
pub async fn upload_and_report(payloads: &[UploadPayload], config: &UploadConfig) -> Result<()> {
    let results = upload_all(payloads, config).await;

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "File".bold().cyan(),
        "Upload".bold().cyan()
    ]);
    for (filename, result) in &results {
        let status = match result {
            Ok(()) => "ok".green().to_string(),
            Err(err) => err.to_string().red().to_string(),
        };
        table.add_row(prettytable::row![filename, status]);
    }
    table.printstd();

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    if failed > 0 {
        return Err(eyre!("{} of {} uploads failed", failed, results.len()));
    }

    Ok(())
}

/// Build a payload from a Markdown file on disk.
pub fn payload_from_file(path: &std::path::Path) -> Result<UploadPayload> {
    let filename = crate::output::display_name(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| f!("Failed to read {}", path.display()))?;
    Ok(UploadPayload { filename, content })
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = UploadConfig::from_env(app.endpoint)?;
    if global.verbose {
        println!("Upload endpoint: {}", config.endpoint);
        println!();
    }

    let payloads = app
        .paths
        .iter()
        .map(|path| payload_from_file(path))
        .collect::<Result<Vec<_>>>()?;

    upload_and_report(&payloads, &config).await
}
