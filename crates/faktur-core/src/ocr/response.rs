//! Response types for OCR operations.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::TextFragment;

/// Response from recognizing one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request this response corresponds to.
    pub request_id: Uuid,
    /// Recognized fragments in the engine's reading order. Empty when the
    /// page carries no readable text.
    pub fragments: Vec<TextFragment>,
    /// Engine-side processing time in milliseconds, if reported.
    pub processing_time_ms: Option<u64>,
    /// When this response was produced.
    pub timestamp: Timestamp,
}

impl Response {
    /// Creates a response for the given request.
    pub fn new(request_id: Uuid, fragments: Vec<TextFragment>) -> Self {
        Self {
            request_id,
            fragments,
            processing_time_ms: None,
            timestamp: Timestamp::now(),
        }
    }

    /// Sets the engine-side processing time.
    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    /// Returns whether any text was recognized.
    #[inline]
    pub fn has_text(&self) -> bool {
        self.fragments.iter().any(TextFragment::has_text)
    }

    /// Mean confidence across fragments, `None` when the page is empty.
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.fragments.is_empty() {
            return None;
        }
        let sum: f32 = self.fragments.iter().map(|f| f.confidence).sum();
        Some(sum / self.fragments.len() as f32)
    }
}
