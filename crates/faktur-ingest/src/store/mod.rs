//! Reconciliation store: status machine enforcement and deduplication.
//!
//! The pipeline talks to storage through [`ReconciliationStore`], which
//! enforces the forward-only status machine and folds redelivered units
//! into their surviving `processed` row. [`PgInvoiceStore`] is the
//! production implementation; [`MemoryInvoiceStore`] backs tests.

mod postgres;

#[cfg(any(test, feature = "test-utils"))]
mod memory;

pub use postgres::PgInvoiceStore;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use memory::MemoryInvoiceStore;

use bigdecimal::BigDecimal;
use faktur_core::BoxedError;
use faktur_extract::ValidatedRecord;
use faktur_postgres::types::InvoiceStatus;
use jiff::Timestamp;
use jiff::civil::Date;
use uuid::Uuid;

use crate::error::FailureKind;

/// Storage-agnostic view of one invoice row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredInvoice {
    /// Unique row identifier.
    pub id: Uuid,
    /// Sender handle. Never empty.
    pub sender_whatsapp: String,
    /// Resolved invoice number, when any.
    pub invoice_number: Option<String>,
    /// Resolved total amount, when any.
    pub total_amount: Option<BigDecimal>,
    /// Resolved due date, when any.
    pub due_date: Option<Date>,
    /// Current status.
    pub status: InvoiceStatus,
    /// Recorded failure kind on the failed path.
    pub failure_kind: Option<String>,
    /// Receipt time. Written once, never mutated.
    pub received_at: Timestamp,
}

/// Result of finalizing one unit.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    /// The surviving row: the unit's own row, or the prior `processed` row
    /// it folded into.
    pub invoice: StoredInvoice,
    /// Set when the unit was a redelivery and folded into a prior row.
    pub deduplicated: bool,
}

/// Errors raised by reconciliation store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row exists for the given id.
    #[error("invoice {0} not found")]
    NotFound(Uuid),

    /// The requested transition is not a legal edge of the status machine.
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Status the row is actually in.
        from: InvoiceStatus,
        /// Status that was requested.
        to: InvoiceStatus,
    },

    /// The storage backend failed.
    #[error("store backend error: {source}")]
    Backend {
        /// Underlying backend error.
        #[source]
        source: BoxedError,
    },
}

impl StoreError {
    /// Wraps a backend error.
    pub fn backend(source: impl Into<BoxedError>) -> Self {
        Self::Backend {
            source: source.into(),
        }
    }
}

impl From<faktur_postgres::PgError> for StoreError {
    fn from(error: faktur_postgres::PgError) -> Self {
        Self::backend(error)
    }
}

/// Persistence seam for the ingestion pipeline.
///
/// Implementations enforce two invariants regardless of backend:
///
/// 1. Status only moves along the legal edges, checked against the row's
///    current status at write time (compare-and-swap, never blind writes).
/// 2. At most one `processed` row exists per `(sender_whatsapp,
///    invoice_number)` key; a redelivered unit folds into the survivor.
#[async_trait::async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// Creates the unit's row at message receipt with status `received`.
    ///
    /// The sender is always known at this point, so a row exists for audit
    /// even when every later stage fails.
    async fn create_received(&self, sender_whatsapp: &str) -> Result<StoredInvoice, StoreError>;

    /// Transitions `received → processing` as the pipeline body starts.
    async fn begin_processing(&self, id: Uuid) -> Result<StoredInvoice, StoreError>;

    /// Finalizes a `processing` unit from its validated record.
    ///
    /// A confident record with both required fields lands on `processed`,
    /// subject to dedup; anything else lands on `needs_review` with
    /// whatever fields did resolve.
    async fn finalize(
        &self,
        id: Uuid,
        record: &ValidatedRecord,
    ) -> Result<FinalizeOutcome, StoreError>;

    /// Transitions `processing → failed`, recording the failure kind.
    async fn mark_failed(&self, id: Uuid, kind: FailureKind)
        -> Result<StoredInvoice, StoreError>;

    /// Fetches a row by id.
    async fn fetch(&self, id: Uuid) -> Result<Option<StoredInvoice>, StoreError>;
}

/// Decides the terminal status for a validated record.
///
/// Shared across implementations so both enforce the same invariant:
/// `processed` requires a confident record with both required fields.
pub(crate) fn terminal_status_for(record: &ValidatedRecord) -> InvoiceStatus {
    if record.is_confident() && record.invoice_number.is_some() && record.total_amount.is_some() {
        InvoiceStatus::Processed
    } else {
        InvoiceStatus::NeedsReview
    }
}
