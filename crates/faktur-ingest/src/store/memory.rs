//! In-memory reconciliation store for tests.

use std::collections::HashMap;

use faktur_extract::ValidatedRecord;
use faktur_postgres::types::InvoiceStatus;
use jiff::Timestamp;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{FinalizeOutcome, ReconciliationStore, StoreError, StoredInvoice, terminal_status_for};
use crate::error::FailureKind;

/// In-memory [`ReconciliationStore`] with the same semantics as the
/// PostgreSQL implementation: compare-and-swap transitions, write-once
/// `received_at`, and fold-on-dedup. One mutex guards the whole map, so
/// every operation is atomic the way a single SQL statement is.
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    rows: Mutex<HashMap<Uuid, StoredInvoice>>,
}

impl MemoryInvoiceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row, for assertions.
    pub async fn all(&self) -> Vec<StoredInvoice> {
        self.rows.lock().await.values().cloned().collect()
    }

    /// Number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Returns whether the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Rows currently in the given status, for assertions.
    pub async fn with_status(&self, status: InvoiceStatus) -> Vec<StoredInvoice> {
        self.rows
            .lock()
            .await
            .values()
            .filter(|row| row.status == status)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ReconciliationStore for MemoryInvoiceStore {
    async fn create_received(&self, sender_whatsapp: &str) -> Result<StoredInvoice, StoreError> {
        let row = StoredInvoice {
            id: Uuid::new_v4(),
            sender_whatsapp: sender_whatsapp.to_string(),
            invoice_number: None,
            total_amount: None,
            due_date: None,
            status: InvoiceStatus::Received,
            failure_kind: None,
            received_at: Timestamp::now(),
        };

        self.rows.lock().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn begin_processing(&self, id: Uuid) -> Result<StoredInvoice, StoreError> {
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if !row.status.can_transition_to(InvoiceStatus::Processing) {
            return Err(StoreError::IllegalTransition {
                from: row.status,
                to: InvoiceStatus::Processing,
            });
        }

        row.status = InvoiceStatus::Processing;
        Ok(row.clone())
    }

    async fn finalize(
        &self,
        id: Uuid,
        record: &ValidatedRecord,
    ) -> Result<FinalizeOutcome, StoreError> {
        let target = terminal_status_for(record);
        let mut rows = self.rows.lock().await;

        let current = rows.get(&id).ok_or(StoreError::NotFound(id))?.clone();
        if !current.status.can_transition_to(target) {
            return Err(StoreError::IllegalTransition {
                from: current.status,
                to: target,
            });
        }

        // Fold a redelivery into the surviving processed row.
        if target == InvoiceStatus::Processed {
            if let Some(number) = record.invoice_number.as_deref() {
                let existing = rows
                    .values()
                    .find(|row| {
                        row.id != id
                            && row.status == InvoiceStatus::Processed
                            && row.sender_whatsapp == current.sender_whatsapp
                            && row.invoice_number.as_deref() == Some(number)
                    })
                    .cloned();

                if let Some(existing) = existing {
                    rows.remove(&id);
                    return Ok(FinalizeOutcome {
                        invoice: existing,
                        deduplicated: true,
                    });
                }
            }
        }

        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.invoice_number = record.invoice_number.clone();
        row.total_amount = record.total_amount.clone();
        row.due_date = record.due_date;
        row.status = target;

        Ok(FinalizeOutcome {
            invoice: row.clone(),
            deduplicated: false,
        })
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        kind: FailureKind,
    ) -> Result<StoredInvoice, StoreError> {
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if !row.status.can_transition_to(InvoiceStatus::Failed) {
            return Err(StoreError::IllegalTransition {
                from: row.status,
                to: InvoiceStatus::Failed,
            });
        }

        row.status = InvoiceStatus::Failed;
        row.failure_kind = Some(kind.as_str().to_string());
        Ok(row.clone())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<StoredInvoice>, StoreError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use faktur_extract::ExtractionConfidence;

    use super::*;

    fn confident_record(number: &str, amount: &str) -> ValidatedRecord {
        ValidatedRecord {
            invoice_number: Some(number.to_string()),
            total_amount: Some(amount.parse::<BigDecimal>().unwrap()),
            due_date: None,
            confidence: ExtractionConfidence::Confident,
        }
    }

    fn ambiguous_record() -> ValidatedRecord {
        ValidatedRecord {
            invoice_number: None,
            total_amount: Some("42.00".parse::<BigDecimal>().unwrap()),
            due_date: None,
            confidence: ExtractionConfidence::Ambiguous,
        }
    }

    #[tokio::test]
    async fn test_received_at_is_write_once() {
        let store = MemoryInvoiceStore::new();
        let created = store.create_received("whatsapp:+1").await.unwrap();

        let processing = store.begin_processing(created.id).await.unwrap();
        assert_eq!(processing.received_at, created.received_at);

        let outcome = store
            .finalize(created.id, &confident_record("INV-1", "10.00"))
            .await
            .unwrap();
        assert_eq!(outcome.invoice.received_at, created.received_at);
    }

    #[tokio::test]
    async fn test_finalize_requires_processing_status() {
        let store = MemoryInvoiceStore::new();
        let created = store.create_received("whatsapp:+1").await.unwrap();

        // received -> processed skips processing and must be rejected.
        let err = store
            .finalize(created.id, &confident_record("INV-1", "10.00"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn test_ambiguous_record_lands_on_needs_review() {
        let store = MemoryInvoiceStore::new();
        let created = store.create_received("whatsapp:+1").await.unwrap();
        store.begin_processing(created.id).await.unwrap();

        let outcome = store.finalize(created.id, &ambiguous_record()).await.unwrap();
        assert_eq!(outcome.invoice.status, InvoiceStatus::NeedsReview);
        assert_eq!(outcome.invoice.invoice_number, None);
        assert!(outcome.invoice.total_amount.is_some());
    }

    #[tokio::test]
    async fn test_dedup_folds_second_unit() {
        let store = MemoryInvoiceStore::new();
        let record = confident_record("INV-1", "10.00");

        let first = store.create_received("whatsapp:+1").await.unwrap();
        store.begin_processing(first.id).await.unwrap();
        let first_outcome = store.finalize(first.id, &record).await.unwrap();
        assert!(!first_outcome.deduplicated);

        let second = store.create_received("whatsapp:+1").await.unwrap();
        store.begin_processing(second.id).await.unwrap();
        let second_outcome = store.finalize(second.id, &record).await.unwrap();

        assert!(second_outcome.deduplicated);
        assert_eq!(second_outcome.invoice.id, first_outcome.invoice.id);
        assert_eq!(store.with_status(InvoiceStatus::Processed).await.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_different_senders_do_not_dedup() {
        let store = MemoryInvoiceStore::new();
        let record = confident_record("INV-1", "10.00");

        for sender in ["whatsapp:+1", "whatsapp:+2"] {
            let row = store.create_received(sender).await.unwrap();
            store.begin_processing(row.id).await.unwrap();
            let outcome = store.finalize(row.id, &record).await.unwrap();
            assert!(!outcome.deduplicated);
        }

        assert_eq!(store.with_status(InvoiceStatus::Processed).await.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_failed_records_kind() {
        let store = MemoryInvoiceStore::new();
        let created = store.create_received("whatsapp:+1").await.unwrap();
        store.begin_processing(created.id).await.unwrap();

        let failed = store
            .mark_failed(created.id, FailureKind::CorruptDocument)
            .await
            .unwrap();
        assert_eq!(failed.status, InvoiceStatus::Failed);
        assert_eq!(failed.failure_kind.as_deref(), Some("corrupt_document"));
        // Sender preserved for audit.
        assert_eq!(failed.sender_whatsapp, "whatsapp:+1");
    }
}
