#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Upload endpoint not configured: set PDFMARK_UPLOAD_URL or pass --endpoint")]
    MissingEndpoint,

    #[error("Invalid PDFMARK_UPLOAD_RETRIES value: {0}")]
    InvalidRetries(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload of {filename} rejected with HTTP {status}")]
    Rejected { filename: String, status: u16 },

    #[error("Input has no file name: {0}")]
    InvalidInput(String),
}
