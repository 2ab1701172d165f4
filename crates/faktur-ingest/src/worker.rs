//! Bounded worker pool over the ingestion pipeline.

use std::sync::Arc;

use faktur_core::ocr::OcrProvider;
use faktur_core::types::Attachment;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::pipeline::{IngestOutcome, IngestionPipeline};
use crate::store::ReconciliationStore;
use crate::TRACING_TARGET_WORKER;

/// One queued unit of work.
struct IngestJob {
    attachment: Attachment,
    reply: oneshot::Sender<Result<IngestOutcome>>,
}

/// Accepts attachments through a bounded queue and processes them on a
/// bounded set of concurrent jobs.
///
/// Both bounds come from [`IngestConfig`]: the queue capacity gives
/// callers backpressure (submission waits when the queue is full instead
/// of buffering without limit), and the job semaphore caps in-flight
/// pipeline runs. Dropping every handle shuts the worker down after the
/// queue drains.
#[derive(Clone)]
pub struct IngestWorker {
    sender: mpsc::Sender<IngestJob>,
}

impl IngestWorker {
    /// Spawns the worker loop over a shared pipeline.
    ///
    /// Returns the submission handle and the loop's join handle.
    pub fn spawn<S, O>(
        pipeline: Arc<IngestionPipeline<S, O>>,
        config: &IngestConfig,
    ) -> (Self, JoinHandle<()>)
    where
        S: ReconciliationStore + 'static,
        O: OcrProvider + 'static,
    {
        let (sender, mut receiver) = mpsc::channel::<IngestJob>(config.queue_capacity.max(1));
        let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        info!(
            target: TRACING_TARGET_WORKER,
            max_concurrent_jobs = config.max_concurrent_jobs,
            queue_capacity = config.queue_capacity,
            "Ingest worker started"
        );

        let handle = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let permit = match permits.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    // Semaphore closes only on shutdown; stop draining.
                    Err(_) => break,
                };

                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let result = pipeline.ingest(job.attachment).await;
                    // The submitter may have gone away; that is fine.
                    let _ = job.reply.send(result);
                    drop(permit);
                });
            }

            debug!(target: TRACING_TARGET_WORKER, "Ingest worker stopped");
        });

        (Self { sender }, handle)
    }

    /// Submits one attachment and waits for its outcome.
    ///
    /// Waits for queue space when the queue is full; this is the
    /// backpressure point for callers.
    pub async fn submit(&self, attachment: Attachment) -> Result<IngestOutcome> {
        let (reply, response) = oneshot::channel();

        self.sender
            .send(IngestJob { attachment, reply })
            .await
            .map_err(|_| IngestError::runtime("ingest worker has shut down"))?;

        response
            .await
            .map_err(|_| IngestError::runtime("ingest worker dropped the job"))?
    }

    /// Submits without waiting for queue space.
    ///
    /// Returns the job's outcome future on success, or the attachment back
    /// when the queue is full so the channel can redeliver later.
    pub fn try_submit(
        &self,
        attachment: Attachment,
    ) -> std::result::Result<oneshot::Receiver<Result<IngestOutcome>>, Attachment> {
        let (reply, response) = oneshot::channel();

        match self.sender.try_send(IngestJob { attachment, reply }) {
            Ok(()) => Ok(response),
            Err(mpsc::error::TrySendError::Full(job))
            | Err(mpsc::error::TrySendError::Closed(job)) => Err(job.attachment),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use faktur_core::mock::MockOcr;
    use faktur_core::types::{BoundingBox, TextFragment};
    use faktur_document::DocumentLoader;
    use faktur_extract::{FieldExtractor, Validator};
    use faktur_postgres::types::InvoiceStatus;
    use image::{DynamicImage, ImageFormat};

    use super::*;
    use crate::store::MemoryInvoiceStore;

    fn png_attachment() -> Attachment {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        Attachment::new(buffer.into_inner(), "image/png", "whatsapp:+1").unwrap()
    }

    fn test_pipeline() -> Arc<IngestionPipeline<MemoryInvoiceStore, MockOcr>> {
        let fragments = vec![
            TextFragment::new(
                "Invoice No: INV-9",
                BoundingBox::new(40.0, 60.0, 160.0, 14.0),
                0.95,
                0,
            ),
            TextFragment::new(
                "Total: 99.00",
                BoundingBox::new(40.0, 600.0, 160.0, 14.0),
                0.95,
                0,
            ),
        ];

        Arc::new(IngestionPipeline::new(
            DocumentLoader::default(),
            MockOcr::with_fragments(fragments),
            FieldExtractor::default(),
            Validator::default(),
            MemoryInvoiceStore::new(),
            &IngestConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_submit_processes_through_pipeline() {
        let pipeline = test_pipeline();
        let (worker, handle) = IngestWorker::spawn(pipeline, &IngestConfig::default());

        let outcome = worker.submit(png_attachment()).await.unwrap();
        assert_eq!(outcome.status, InvoiceStatus::Processed);
        assert_eq!(outcome.invoice_number.as_deref(), Some("INV-9"));

        drop(worker);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_try_submit_returns_attachment_when_full() {
        let pipeline = test_pipeline();
        let config = IngestConfig::default()
            .with_queue_capacity(1)
            .with_max_concurrent_jobs(1);
        let (worker, _handle) = IngestWorker::spawn(pipeline, &config);

        // Fill the single queue slot without giving the loop a chance to
        // drain it, then observe backpressure on the next submission.
        let mut accepted = 0usize;
        loop {
            match worker.try_submit(png_attachment()) {
                Ok(_receiver) => accepted += 1,
                Err(attachment) => {
                    assert!(accepted >= 1);
                    assert_eq!(attachment.sender(), "whatsapp:+1");
                    break;
                }
            }
            assert!(accepted < 64, "queue never filled");
        }
    }
}
