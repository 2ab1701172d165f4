//! [`OcrProvider`] implementation for the PaddleOCR client.

use std::time::Instant;

use faktur_core::ServiceHealth;
use faktur_core::ocr::{BoxedStream, OcrProvider, Request, Response, Result};
use faktur_core::types::TextFragment;

use crate::PaddleClient;

#[async_trait::async_trait]
impl OcrProvider for PaddleClient {
    async fn recognize(&self, request: Request) -> Result<Response> {
        let page = self
            .recognize_page(
                &request.page.png_data,
                request.page.page_index,
                &request.options.language,
            )
            .await?;

        let mut response = Response::new(request.request_id, page.fragments);
        if let Some(ms) = page.processing_time_ms {
            response = response.with_processing_time(ms);
        }

        Ok(response)
    }

    async fn recognize_stream(&self, request: Request) -> Result<BoxedStream<TextFragment>> {
        // The serving endpoint answers whole pages; replay the fragments as
        // a finite stream for lazy consumers.
        let response = self.recognize(request).await?;
        Ok(Box::new(futures_util::stream::iter(
            response.fragments.into_iter().map(Ok),
        )))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let start = Instant::now();
        match PaddleClient::health_check(self).await {
            Ok(()) => Ok(ServiceHealth::healthy().with_latency(start.elapsed())),
            Err(error) => Ok(ServiceHealth::unhealthy(error.to_string())),
        }
    }
}
