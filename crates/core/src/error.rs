use thiserror::Error;

/// Failure reported by the external page decoder.
///
/// The core never decodes PDF bytes itself; whatever sits behind
/// [`crate::pipeline::PageSource`] converts its own errors into this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("failed to open document: {0}")]
    Open(DecodeError),

    #[error("failed to decode page {page}: {source}")]
    Decode {
        page: usize,
        #[source]
        source: DecodeError,
    },

    #[error("malformed glyph run on page {page}: {reason}")]
    MalformedGlyph { page: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_message_is_surfaced() {
        let err = ConvertError::Decode {
            page: 3,
            source: DecodeError::new("content stream decode error"),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode page 3: content stream decode error"
        );
    }

    #[test]
    fn test_open_error_message() {
        let err = ConvertError::Open(DecodeError::new("Document is encrypted"));
        assert_eq!(
            err.to_string(),
            "failed to open document: Document is encrypted"
        );
    }
}
