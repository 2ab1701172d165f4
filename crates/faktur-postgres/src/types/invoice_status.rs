//! Invoice processing status enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Processing status of one ingestion unit.
///
/// Corresponds to the `INVOICE_STATUS` PostgreSQL enum. The status machine
/// moves strictly forward: `received → processing → {processed,
/// needs_review, failed}`. No transition skips `processing`, and terminal
/// states have no successors. [`InvoiceStatus::can_transition_to`] encodes
/// the legal edges exhaustively; every store update is a compare-and-swap
/// against the expected current status.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::InvoiceStatus"]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    /// Row created at message receipt; nothing has run yet.
    #[db_rename = "received"]
    #[serde(rename = "received")]
    #[default]
    Received,

    /// The pipeline body (OCR + extraction) has started.
    #[db_rename = "processing"]
    #[serde(rename = "processing")]
    Processing,

    /// Validation returned a confident record. Terminal.
    #[db_rename = "processed"]
    #[serde(rename = "processed")]
    Processed,

    /// Validation returned an ambiguous record; a human decides. Terminal.
    #[db_rename = "needs_review"]
    #[serde(rename = "needs_review")]
    NeedsReview,

    /// A stage raised an unrecoverable error. Terminal.
    #[db_rename = "failed"]
    #[serde(rename = "failed")]
    Failed,
}

impl InvoiceStatus {
    /// Returns whether this status is terminal.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvoiceStatus::Processed | InvoiceStatus::NeedsReview | InvoiceStatus::Failed
        )
    }

    /// Returns whether the unit is mid-pipeline.
    #[inline]
    pub fn is_processing(self) -> bool {
        matches!(self, InvoiceStatus::Processing)
    }

    /// Returns whether `next` is a legal direct successor of `self`.
    ///
    /// The match is exhaustive: a new status cannot be added without
    /// deciding its edges here.
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        match (self, next) {
            (InvoiceStatus::Received, InvoiceStatus::Processing) => true,
            (InvoiceStatus::Received, _) => false,
            (
                InvoiceStatus::Processing,
                InvoiceStatus::Processed | InvoiceStatus::NeedsReview | InvoiceStatus::Failed,
            ) => true,
            (InvoiceStatus::Processing, _) => false,
            (InvoiceStatus::Processed | InvoiceStatus::NeedsReview | InvoiceStatus::Failed, _) => {
                false
            }
        }
    }

    /// Terminal statuses an operator review queue cares about.
    pub fn review_statuses() -> &'static [InvoiceStatus] {
        &[InvoiceStatus::NeedsReview, InvoiceStatus::Failed]
    }
}
