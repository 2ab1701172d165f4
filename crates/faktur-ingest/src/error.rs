//! Ingestion error types and the recorded failure taxonomy.

use std::borrow::Cow;

use faktur_core::BoxedError;
use faktur_core::ocr;
use faktur_document::DocumentError;
use strum::{Display, EnumString};

use crate::store::StoreError;

/// Result type alias for ingestion operations.
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// Error kind recorded on a `failed` row for operator triage.
///
/// The string form (`unsupported_format`, ...) is what lands in the
/// `failure_kind` column; no stack traces are persisted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The declared media type is not ingestible. Redelivery of the same
    /// bytes cannot succeed.
    UnsupportedFormat,
    /// The payload failed to decode. Redelivery of the same bytes cannot
    /// succeed.
    CorruptDocument,
    /// The OCR engine or rasterizer infrastructure failed. The channel may
    /// redeliver.
    OcrEngine,
}

impl FailureKind {
    /// The string recorded in the `failure_kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::CorruptDocument => "corrupt_document",
            Self::OcrEngine => "ocr_engine",
        }
    }
}

/// Errors raised while ingesting one attachment.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Attachment normalization failed.
    #[error("document loading failed: {0}")]
    Document(#[from] DocumentError),

    /// The OCR engine failed after retries.
    #[error("ocr failed: {0}")]
    Ocr(#[from] ocr::Error),

    /// The reconciliation store failed.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    /// The runtime failed outside any stage (task panic, shutdown).
    ///
    /// No failure kind is recorded: the row keeps its last durable status,
    /// same as a crash mid-pipeline.
    #[error("ingestion runtime error: {message}")]
    Runtime {
        /// What went wrong.
        message: Cow<'static, str>,
        /// Underlying error, when available.
        #[source]
        source: Option<BoxedError>,
    },
}

impl IngestError {
    /// Creates a runtime error with a message.
    pub fn runtime(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Runtime {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a runtime error with a message and source.
    pub fn runtime_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl Into<BoxedError>,
    ) -> Self {
        Self::Runtime {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Maps this error to the failure kind recorded on the row.
    ///
    /// `None` means the failure is not a stage failure (store or runtime
    /// trouble) and the row is left at its last durable status instead of
    /// being marked `failed`.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Document(DocumentError::UnsupportedFormat { .. }) => {
                Some(FailureKind::UnsupportedFormat)
            }
            Self::Document(DocumentError::CorruptDocument { .. }) => {
                Some(FailureKind::CorruptDocument)
            }
            Self::Document(DocumentError::PageLimitExceeded { .. }) => {
                Some(FailureKind::CorruptDocument)
            }
            Self::Document(DocumentError::RasterizerUnavailable { .. }) => {
                Some(FailureKind::OcrEngine)
            }
            Self::Ocr(_) => Some(FailureKind::OcrEngine),
            Self::Store(_) | Self::Runtime { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_strings() {
        assert_eq!(FailureKind::UnsupportedFormat.as_str(), "unsupported_format");
        assert_eq!(FailureKind::CorruptDocument.as_str(), "corrupt_document");
        assert_eq!(FailureKind::OcrEngine.as_str(), "ocr_engine");
    }

    #[test]
    fn test_display_matches_column_string() {
        assert_eq!(
            FailureKind::CorruptDocument.to_string(),
            FailureKind::CorruptDocument.as_str()
        );
    }

    #[test]
    fn test_document_errors_map_to_input_kinds() {
        let err = IngestError::from(DocumentError::UnsupportedFormat {
            media_type: "application/zip".into(),
        });
        assert_eq!(err.failure_kind(), Some(FailureKind::UnsupportedFormat));

        let err = IngestError::from(DocumentError::corrupt_message("bad bytes"));
        assert_eq!(err.failure_kind(), Some(FailureKind::CorruptDocument));
    }

    #[test]
    fn test_ocr_errors_map_to_engine_kind() {
        let err = IngestError::from(ocr::Error::timeout());
        assert_eq!(err.failure_kind(), Some(FailureKind::OcrEngine));
    }

    #[test]
    fn test_runtime_errors_record_nothing() {
        assert_eq!(IngestError::runtime("task panicked").failure_kind(), None);
    }
}
