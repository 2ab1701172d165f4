//! Mock OCR provider for testing.
//!
//! Returns a configured set of fragments for every page, regardless of the
//! pixel content, so pipeline behavior can be tested without a real engine.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! faktur-core = { version = "...", features = ["test-utils"] }
//! ```

use std::sync::Arc;

use crate::health::ServiceHealth;
use crate::ocr::{BoxedStream, Error, OcrProvider, Request, Response, Result};
use crate::types::TextFragment;

/// Scripted behavior of a [`MockOcr`] call.
#[derive(Debug, Clone)]
enum MockBehavior {
    /// Return the configured fragments.
    Fragments(Arc<Vec<TextFragment>>),
    /// Fail every call with the given error kind.
    Fail(crate::ocr::ErrorKind),
}

/// Mock OCR provider returning scripted results.
///
/// Fragments keep the page index of the incoming request so multi-page
/// documents behave like a real engine would.
#[derive(Debug, Clone)]
pub struct MockOcr {
    behavior: MockBehavior,
}

impl Default for MockOcr {
    fn default() -> Self {
        Self::with_fragments(Vec::new())
    }
}

impl MockOcr {
    /// Creates a mock that recognizes the given fragments on every page.
    pub fn with_fragments(fragments: Vec<TextFragment>) -> Self {
        Self {
            behavior: MockBehavior::Fragments(Arc::new(fragments)),
        }
    }

    /// Creates a mock that fails every call with the given error kind.
    pub fn failing(kind: crate::ocr::ErrorKind) -> Self {
        Self {
            behavior: MockBehavior::Fail(kind),
        }
    }

    fn fragments_for(&self, page_index: u32) -> Result<Vec<TextFragment>> {
        match &self.behavior {
            MockBehavior::Fragments(fragments) => Ok(fragments
                .iter()
                .cloned()
                .map(|mut fragment| {
                    fragment.page_index = page_index;
                    fragment
                })
                .collect()),
            MockBehavior::Fail(kind) => Err(Error::new(*kind)),
        }
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockOcr {
    async fn recognize(&self, request: Request) -> Result<Response> {
        let fragments = self.fragments_for(request.page.page_index)?;
        Ok(Response::new(request.request_id, fragments).with_processing_time(0))
    }

    async fn recognize_stream(&self, request: Request) -> Result<BoxedStream<TextFragment>> {
        let fragments = self.fragments_for(request.page.page_index)?;
        Ok(Box::new(futures_util::stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        match &self.behavior {
            MockBehavior::Fragments(_) => Ok(ServiceHealth::healthy()),
            MockBehavior::Fail(kind) => Ok(ServiceHealth::unhealthy(kind.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, PageImage};

    #[tokio::test]
    async fn test_mock_returns_fragments_with_request_page_index() {
        let mock = MockOcr::with_fragments(vec![TextFragment::new(
            "Total: 12.00",
            BoundingBox::new(0.0, 0.0, 80.0, 12.0),
            0.9,
            0,
        )]);

        let request = Request::new(PageImage::new(3, 1, 1, vec![0u8]));
        let response = mock.recognize(request).await.unwrap();
        assert_eq!(response.fragments.len(), 1);
        assert_eq!(response.fragments[0].page_index, 3);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockOcr::failing(crate::ocr::ErrorKind::ServiceUnavailable);
        let request = Request::new(PageImage::new(0, 1, 1, vec![0u8]));
        let err = mock.recognize(request).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
