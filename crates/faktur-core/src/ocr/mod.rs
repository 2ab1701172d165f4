//! Optical Character Recognition (OCR) abstractions.
//!
//! This module defines the capability interface the pipeline consumes:
//! given one rasterized page, an engine returns recognized text fragments
//! with bounding boxes and confidence scores. Exactly one concrete adapter
//! is wired at deployment time; the pipeline never sees engine details.
//!
//! Confidence scores pass through unmodified. Thresholding is the field
//! extractor's responsibility, not the adapter's.

use std::sync::Arc;

use futures_util::Stream;

pub mod error;
pub mod request;
pub mod response;
pub mod service;

pub use error::{Error, ErrorKind, Result};
pub use request::{Request, RequestOptions};
pub use response::Response;
pub use service::OcrService;

use crate::health::ServiceHealth;
use crate::types::TextFragment;

/// Type alias for a shared, boxed OCR provider.
pub type BoxedOcrProvider = Arc<dyn OcrProvider + Send + Sync>;

/// Type alias for a boxed fragment stream.
pub type BoxedStream<T> = Box<dyn Stream<Item = Result<T>> + Send + Unpin>;

/// Tracing target for OCR operations.
pub const TRACING_TARGET: &str = "faktur_core::ocr";

/// Core trait for OCR engines.
///
/// Implementations wrap one concrete text-detection + text-recognition
/// engine. Engine warm-up (model load, connection setup) belongs in the
/// implementation's constructor so that per-call cost stays bounded.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Recognizes text on a single page.
    ///
    /// A page without readable text yields an empty fragment list, not an
    /// error. Engine-level failures (model load, timeout, transport) surface
    /// as [`Error`] with a kind that classifies retryability.
    async fn recognize(&self, request: Request) -> Result<Response>;

    /// Recognizes text on a single page, yielding fragments lazily.
    ///
    /// The stream is finite and non-restartable. Implementations backed by
    /// whole-page engines may buffer internally and replay the fragments.
    async fn recognize_stream(&self, request: Request) -> Result<BoxedStream<TextFragment>>;

    /// Performs a health check against the engine.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
