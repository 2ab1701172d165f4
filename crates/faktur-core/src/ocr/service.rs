//! OCR service wrapper with retry logic, timeouts, and observability.
//!
//! Wraps any [`OcrProvider`] with automatic retries of retryable failures,
//! a configurable per-call timeout, and optional logging. The pipeline
//! consumes engines through this wrapper so that transient engine hiccups
//! do not fail a unit of work outright.

use std::sync::Arc;
use std::time::Duration;

use super::{BoxedStream, Error, OcrProvider, Request, Response, Result, TRACING_TARGET};
use crate::health::ServiceHealth;
use crate::types::TextFragment;

/// OCR service wrapper with additional functionality.
///
/// The inner provider is wrapped in an `Arc`, making this wrapper cheap to
/// clone. Only retryable errors (network issues, timeouts, rate limits) are
/// retried; client errors fail immediately.
#[derive(Clone)]
pub struct OcrService<T> {
    inner: Arc<T>,
    retry_attempts: u32,
    timeout: Duration,
    enable_logging: bool,
    service_name: String,
}

impl<T> OcrService<T> {
    /// Creates a new service wrapper with default configuration.
    ///
    /// Default configuration:
    /// - 3 retry attempts
    /// - 30 second timeout
    /// - Logging disabled
    /// - Service name: "ocr-service"
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_attempts: 3,
            timeout: Duration::from_secs(30),
            enable_logging: false,
            service_name: "ocr-service".to_string(),
        }
    }

    /// Sets the number of retry attempts for failed requests.
    pub fn with_retry_policy(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Sets the timeout duration for OCR operations.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables logging for OCR operations.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Sets the service name used in logs.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Returns a reference to the inner provider.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T> OcrProvider for OcrService<T>
where
    T: OcrProvider + Send + Sync,
{
    async fn recognize(&self, request: Request) -> Result<Response> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            if self.enable_logging {
                tracing::debug!(
                    target: TRACING_TARGET,
                    service = %self.service_name,
                    attempt,
                    max_attempts = self.retry_attempts,
                    page = request.page.page_index,
                    "Processing OCR request"
                );
            }

            let start = std::time::Instant::now();

            // Clone request for each attempt
            let request_clone = request.clone();

            match tokio::time::timeout(self.timeout, self.inner.recognize(request_clone)).await {
                Ok(Ok(response)) => {
                    if self.enable_logging {
                        tracing::debug!(
                            target: TRACING_TARGET,
                            service = %self.service_name,
                            elapsed = ?start.elapsed(),
                            fragments = response.fragments.len(),
                            "OCR request successful"
                        );
                    }
                    return Ok(response);
                }
                Ok(Err(error)) => {
                    if self.enable_logging {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            service = %self.service_name,
                            attempt,
                            error = %error,
                            "OCR request failed"
                        );
                    }

                    if !error.is_retryable() || attempt == self.retry_attempts {
                        return Err(error);
                    }

                    if let Some(delay) = error.retry_delay() {
                        tokio::time::sleep(delay).await;
                    }

                    last_error = Some(error);
                }
                Err(_) => {
                    let error = Error::timeout();
                    if self.enable_logging {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            service = %self.service_name,
                            attempt,
                            "OCR request timed out"
                        );
                    }

                    if attempt == self.retry_attempts {
                        return Err(error);
                    }

                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(Error::internal_error))
    }

    async fn recognize_stream(&self, request: Request) -> Result<BoxedStream<TextFragment>> {
        tokio::time::timeout(self.timeout, self.inner.recognize_stream(request))
            .await
            .map_err(|_| Error::timeout())?
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        self.inner.health_check().await
    }
}
