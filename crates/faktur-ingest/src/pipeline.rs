//! Ingestion pipeline orchestration.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use faktur_core::ocr::{OcrProvider, Request};
use faktur_core::types::{Attachment, TextFragment};
use faktur_document::DocumentLoader;
use faktur_extract::{FieldExtractor, ValidatedRecord, Validator};
use faktur_postgres::types::InvoiceStatus;
use jiff::civil::Date;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::error::{FailureKind, IngestError, Result};
use crate::lock::KeyedLocks;
use crate::store::{FinalizeOutcome, ReconciliationStore, StoredInvoice};
use crate::TRACING_TARGET_PIPELINE;

/// Result of ingesting one attachment.
///
/// Returned on every path: a failed unit still reports its row id and
/// terminal status so the caller can surface it.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Row the unit resolved to. After a dedup fold this is the surviving
    /// prior row, not the redelivered unit's own.
    pub invoice_id: Uuid,
    /// Terminal status the unit reached.
    pub status: InvoiceStatus,
    /// Resolved invoice number, when any.
    pub invoice_number: Option<String>,
    /// Resolved total amount, when any.
    pub total_amount: Option<BigDecimal>,
    /// Resolved due date, when any.
    pub due_date: Option<Date>,
    /// Failure kind recorded on the failed path.
    pub failure_kind: Option<FailureKind>,
    /// Set when the unit was folded into a prior processed row.
    pub deduplicated: bool,
}

impl IngestOutcome {
    fn from_finalize(outcome: FinalizeOutcome) -> Self {
        let FinalizeOutcome {
            invoice,
            deduplicated,
        } = outcome;
        Self {
            invoice_id: invoice.id,
            status: invoice.status,
            invoice_number: invoice.invoice_number,
            total_amount: invoice.total_amount,
            due_date: invoice.due_date,
            failure_kind: None,
            deduplicated,
        }
    }

    fn from_failed(invoice: StoredInvoice, kind: FailureKind) -> Self {
        Self {
            invoice_id: invoice.id,
            status: invoice.status,
            invoice_number: invoice.invoice_number,
            total_amount: invoice.total_amount,
            due_date: invoice.due_date,
            failure_kind: Some(kind),
            deduplicated: false,
        }
    }
}

/// Orchestrates the ingestion stages strictly in order.
///
/// Rasterize → recognize (per page, in page order) → extract → validate →
/// reconcile. A durable status write happens at each stage boundary, so a
/// crash mid-pipeline leaves an inspectable `processing` row rather than
/// an orphan. Stage failures short-circuit the rest and land the unit on
/// `failed` with its error kind recorded; partial progress is never rolled
/// back.
pub struct IngestionPipeline<S, O> {
    loader: DocumentLoader,
    ocr: O,
    extractor: FieldExtractor,
    validator: Validator,
    store: S,
    locks: KeyedLocks,
    ocr_permits: Arc<Semaphore>,
}

impl<S, O> IngestionPipeline<S, O>
where
    S: ReconciliationStore,
    O: OcrProvider,
{
    /// Assembles a pipeline from its stages.
    ///
    /// The OCR provider is typically wrapped in
    /// [`faktur_core::ocr::OcrService`] for retries and timeouts; the
    /// pipeline additionally bounds concurrent engine calls to
    /// `config.max_concurrent_ocr`.
    pub fn new(
        loader: DocumentLoader,
        ocr: O,
        extractor: FieldExtractor,
        validator: Validator,
        store: S,
        config: &IngestConfig,
    ) -> Self {
        Self {
            loader,
            ocr,
            extractor,
            validator,
            store,
            locks: KeyedLocks::new(),
            ocr_permits: Arc::new(Semaphore::new(config.max_concurrent_ocr.max(1))),
        }
    }

    /// Returns the reconciliation store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingests one attachment end to end.
    ///
    /// Returns the outcome on every pipeline path, including stage
    /// failures (which land as `failed` with their kind recorded). An
    /// `Err` means the unit could not even be tracked (store trouble or a
    /// runtime fault); the row, if any, keeps its last durable status.
    pub async fn ingest(&self, attachment: Attachment) -> Result<IngestOutcome> {
        let created = self.store.create_received(attachment.sender()).await?;
        let invoice_id = created.id;

        info!(
            target: TRACING_TARGET_PIPELINE,
            invoice_id = %invoice_id,
            media_type = attachment.media_type(),
            size = attachment.size(),
            "Ingestion unit created"
        );

        let processing = self.store.begin_processing(invoice_id).await?;

        match self.run_stages(&attachment, &processing).await {
            Ok(outcome) => {
                info!(
                    target: TRACING_TARGET_PIPELINE,
                    invoice_id = %outcome.invoice_id,
                    status = %outcome.status,
                    deduplicated = outcome.deduplicated,
                    "Ingestion unit finished"
                );
                Ok(outcome)
            }
            Err(error) => match error.failure_kind() {
                Some(kind) => {
                    warn!(
                        target: TRACING_TARGET_PIPELINE,
                        invoice_id = %invoice_id,
                        kind = %kind,
                        error = %error,
                        "Stage failed, recording terminal failure"
                    );
                    let failed = self.store.mark_failed(invoice_id, kind).await?;
                    Ok(IngestOutcome::from_failed(failed, kind))
                }
                None => Err(error),
            },
        }
    }

    /// Runs the fallible pipeline body on a unit already in `processing`.
    async fn run_stages(
        &self,
        attachment: &Attachment,
        invoice: &StoredInvoice,
    ) -> Result<IngestOutcome> {
        let fragments = self.recognize_document(attachment).await?;

        debug!(
            target: TRACING_TARGET_PIPELINE,
            invoice_id = %invoice.id,
            fragments = fragments.len(),
            "Recognition complete"
        );

        let candidates = self.extractor.extract(&fragments);
        let record = self.validator.validate(candidates, invoice.received_at);

        self.reconcile(invoice, &record).await
    }

    /// Rasterizes the attachment and recognizes every page in page order.
    async fn recognize_document(&self, attachment: &Attachment) -> Result<Vec<TextFragment>> {
        // Rasterization is CPU-bound and pdfium is not async-safe.
        let loader = self.loader.clone();
        let for_loader = attachment.clone();
        let pages = tokio::task::spawn_blocking(move || loader.load(&for_loader))
            .await
            .map_err(|e| IngestError::runtime_with_source("rasterization task failed", e))??;

        let mut fragments = Vec::new();
        for page in pages {
            let _permit = self
                .ocr_permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| IngestError::runtime_with_source("ocr limiter closed", e))?;

            let response = self.ocr.recognize(Request::new(page)).await?;
            fragments.extend(response.fragments);
        }

        Ok(fragments)
    }

    /// Finalizes the unit, serializing same-key units when dedup applies.
    async fn reconcile(
        &self,
        invoice: &StoredInvoice,
        record: &ValidatedRecord,
    ) -> Result<IngestOutcome> {
        let outcome = match record.invoice_number.as_deref() {
            Some(number) if record.is_confident() => {
                let _guard = self.locks.acquire(&invoice.sender_whatsapp, number).await;
                self.store.finalize(invoice.id, record).await?
            }
            // Without a resolved number, uniqueness cannot be established;
            // dedup is skipped and no key lock is needed.
            _ => self.store.finalize(invoice.id, record).await?,
        };

        Ok(IngestOutcome::from_finalize(outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use faktur_core::mock::MockOcr;
    use faktur_core::ocr::ErrorKind;
    use faktur_core::types::BoundingBox;
    use image::{DynamicImage, ImageFormat};

    use super::*;
    use crate::store::MemoryInvoiceStore;

    const SENDER: &str = "whatsapp:+4917012345678";

    fn png_attachment(sender: &str) -> Attachment {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        Attachment::new(buffer.into_inner(), "image/png", sender).unwrap()
    }

    fn fragment(text: &str, y: f32) -> TextFragment {
        TextFragment::new(text, BoundingBox::new(40.0, y, 160.0, 14.0), 0.95, 0)
    }

    /// A due date that passes the validator's grace check relative to the
    /// store's real receipt clock.
    fn upcoming_due_date() -> jiff::civil::Date {
        jiff::Timestamp::now()
            .to_zoned(jiff::tz::TimeZone::UTC)
            .date()
            .checked_add(jiff::Span::new().days(30))
            .unwrap()
    }

    fn invoice_fragments() -> Vec<TextFragment> {
        vec![
            fragment("ACME GmbH", 20.0),
            fragment("Invoice No: INV-2024-001", 60.0),
            fragment("Total: $1,250.00", 600.0),
            fragment(&format!("Due: {}", upcoming_due_date()), 630.0),
        ]
    }

    fn pipeline(ocr: MockOcr) -> IngestionPipeline<MemoryInvoiceStore, MockOcr> {
        IngestionPipeline::new(
            DocumentLoader::default(),
            ocr,
            FieldExtractor::default(),
            Validator::default(),
            MemoryInvoiceStore::new(),
            &IngestConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_round_trip_yields_processed_record() {
        let due = upcoming_due_date();
        let pipeline = pipeline(MockOcr::with_fragments(vec![
            fragment("ACME GmbH", 20.0),
            fragment("Invoice No: INV-2024-001", 60.0),
            fragment("Total: $1,250.00", 600.0),
            fragment(&format!("Due: {due}"), 630.0),
        ]));

        let outcome = pipeline.ingest(png_attachment(SENDER)).await.unwrap();

        assert_eq!(outcome.status, InvoiceStatus::Processed);
        assert_eq!(outcome.invoice_number.as_deref(), Some("INV-2024-001"));
        assert_eq!(outcome.total_amount.unwrap().to_string(), "1250.00");
        assert_eq!(outcome.due_date, Some(due));
        assert!(!outcome.deduplicated);

        // processed implies both required fields are present.
        let rows = pipeline.store().all().await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].invoice_number.is_some());
        assert!(rows[0].total_amount.is_some());
    }

    #[tokio::test]
    async fn test_reingestion_is_idempotent() {
        let pipeline = pipeline(MockOcr::with_fragments(invoice_fragments()));

        let first = pipeline.ingest(png_attachment(SENDER)).await.unwrap();
        let second = pipeline.ingest(png_attachment(SENDER)).await.unwrap();

        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(second.invoice_id, first.invoice_id);
        assert_eq!(second.status, InvoiceStatus::Processed);

        let processed = pipeline
            .store()
            .with_status(InvoiceStatus::Processed)
            .await;
        assert_eq!(processed.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_invoice_never_duplicates() {
        let pipeline = Arc::new(pipeline(MockOcr::with_fragments(invoice_fragments())));

        let (left, right) = tokio::join!(
            pipeline.ingest(png_attachment(SENDER)),
            pipeline.ingest(png_attachment(SENDER)),
        );
        let (left, right) = (left.unwrap(), right.unwrap());

        assert_eq!(left.invoice_id, right.invoice_id);
        assert!(left.deduplicated != right.deduplicated);

        let processed = pipeline
            .store()
            .with_status(InvoiceStatus::Processed)
            .await;
        assert_eq!(processed.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_fails_with_row_preserved() {
        let pipeline = pipeline(MockOcr::with_fragments(invoice_fragments()));

        let attachment =
            Attachment::new(b"definitely not a pdf".to_vec(), "application/pdf", SENDER).unwrap();
        let outcome = pipeline.ingest(attachment).await.unwrap();

        assert_eq!(outcome.status, InvoiceStatus::Failed);
        assert_eq!(outcome.failure_kind, Some(FailureKind::CorruptDocument));

        // The row exists with the sender preserved for audit.
        let row = pipeline
            .store()
            .fetch(outcome.invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.sender_whatsapp, SENDER);
        assert_eq!(row.failure_kind.as_deref(), Some("corrupt_document"));
    }

    #[tokio::test]
    async fn test_unsupported_media_type_fails() {
        let pipeline = pipeline(MockOcr::with_fragments(invoice_fragments()));

        let attachment = Attachment::new(vec![0u8; 64], "application/zip", SENDER).unwrap();
        let outcome = pipeline.ingest(attachment).await.unwrap();

        assert_eq!(outcome.status, InvoiceStatus::Failed);
        assert_eq!(outcome.failure_kind, Some(FailureKind::UnsupportedFormat));
    }

    #[tokio::test]
    async fn test_missing_invoice_number_routes_to_review() {
        let pipeline = pipeline(MockOcr::with_fragments(vec![
            fragment("ACME GmbH", 20.0),
            fragment("Total: $480.00", 600.0),
        ]));

        let outcome = pipeline.ingest(png_attachment(SENDER)).await.unwrap();

        assert_eq!(outcome.status, InvoiceStatus::NeedsReview);
        assert_eq!(outcome.invoice_number, None);
        assert_eq!(outcome.total_amount.unwrap().to_string(), "480.00");
        assert_eq!(outcome.failure_kind, None);
    }

    #[tokio::test]
    async fn test_blank_page_routes_to_review() {
        let pipeline = pipeline(MockOcr::with_fragments(Vec::new()));

        let outcome = pipeline.ingest(png_attachment(SENDER)).await.unwrap();

        assert_eq!(outcome.status, InvoiceStatus::NeedsReview);
        assert_eq!(outcome.invoice_number, None);
        assert_eq!(outcome.total_amount, None);
    }

    #[tokio::test]
    async fn test_engine_failure_fails_with_engine_kind() {
        let pipeline = pipeline(MockOcr::failing(ErrorKind::ServiceUnavailable));

        let outcome = pipeline.ingest(png_attachment(SENDER)).await.unwrap();

        assert_eq!(outcome.status, InvoiceStatus::Failed);
        assert_eq!(outcome.failure_kind, Some(FailureKind::OcrEngine));
    }

    #[tokio::test]
    async fn test_received_at_survives_all_transitions() {
        let pipeline = pipeline(MockOcr::with_fragments(invoice_fragments()));

        let outcome = pipeline.ingest(png_attachment(SENDER)).await.unwrap();
        let rows = pipeline.store().all().await;
        assert_eq!(rows.len(), 1);

        // The terminal row's receipt time predates now and is final;
        // nothing in the pipeline writes the column after insert.
        let row = &rows[0];
        assert_eq!(row.id, outcome.invoice_id);
        assert!(row.received_at <= jiff::Timestamp::now());
    }
}
