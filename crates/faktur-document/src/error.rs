//! Error types for attachment normalization.

use faktur_core::BoxedError;

/// Result type alias for document loading operations.
pub type Result<T, E = DocumentError> = std::result::Result<T, E>;

/// Errors raised while normalizing an attachment into page images.
///
/// `UnsupportedFormat` and `CorruptDocument` are input-stage failures: they
/// cannot succeed on retry without new input from the sender.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The declared media type is neither a supported image format nor PDF.
    #[error("unsupported media type: {media_type}")]
    UnsupportedFormat {
        /// Media type as declared by the channel.
        media_type: String,
    },

    /// The payload could not be decoded (truncated or invalid bytes).
    #[error("corrupt document: {message}")]
    CorruptDocument {
        /// What failed to decode.
        message: String,
        /// Underlying decoder error, when available.
        #[source]
        source: Option<BoxedError>,
    },

    /// The document exceeds the configured page budget.
    #[error("document has {count} pages, limit is {limit}")]
    PageLimitExceeded {
        /// Pages found in the document.
        count: u32,
        /// Configured maximum.
        limit: u32,
    },

    /// The PDF rasterizer library could not be loaded.
    ///
    /// Infrastructure-level: the input itself may be fine.
    #[error("PDF rasterizer unavailable: {message}")]
    RasterizerUnavailable {
        /// Why binding failed.
        message: String,
    },
}

impl DocumentError {
    /// Creates a corrupt-document error with a source.
    pub fn corrupt(message: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::CorruptDocument {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a corrupt-document error without a source.
    pub fn corrupt_message(message: impl Into<String>) -> Self {
        Self::CorruptDocument {
            message: message.into(),
            source: None,
        }
    }

    /// Returns whether this failure is tied to the input bytes themselves.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::RasterizerUnavailable { .. })
    }
}
