//! Invoice model for PostgreSQL database operations.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff_diesel::{Date, Timestamp};
use uuid::Uuid;

use crate::schema::invoices;
use crate::types::InvoiceStatus;

/// One ingestion unit and, once processed, one invoice.
///
/// `received_at` is written by the database at insert and never updated;
/// no changeset in this crate carries the column.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = invoices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Invoice {
    /// Unique row identifier.
    pub id: Uuid,
    /// Extracted invoice number; null until resolved, possibly forever.
    pub invoice_number: Option<String>,
    /// Extracted total, NUMERIC(10,2); null until resolved.
    pub total_amount: Option<BigDecimal>,
    /// Extracted due date; legitimately optional.
    pub due_date: Option<Date>,
    /// WhatsApp handle of the sender. Never empty.
    pub sender_whatsapp: String,
    /// Current position in the status machine.
    pub status: InvoiceStatus,
    /// Error kind recorded when the unit failed, for operator triage.
    pub failure_kind: Option<String>,
    /// When the message was received. Immutable after insert.
    pub received_at: Timestamp,
}

/// Data for creating a new invoice row at message receipt.
///
/// Only the sender and initial status are known at that point; the
/// database stamps `received_at`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invoices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewInvoice {
    /// Sender handle from the inbound message.
    pub sender_whatsapp: String,
    /// Initial status; always [`InvoiceStatus::Received`] in practice.
    pub status: InvoiceStatus,
}

/// Data for updating an invoice row at a stage boundary.
///
/// `None` fields are left untouched. `received_at` is deliberately absent.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = invoices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateInvoice {
    /// Resolved invoice number.
    pub invoice_number: Option<String>,
    /// Resolved total amount.
    pub total_amount: Option<BigDecimal>,
    /// Resolved due date.
    pub due_date: Option<Date>,
    /// New status.
    pub status: Option<InvoiceStatus>,
    /// Failure kind, recorded only on the failed path.
    pub failure_kind: Option<String>,
}

impl Invoice {
    /// Receipt time as a jiff timestamp.
    pub fn received_at(&self) -> jiff::Timestamp {
        self.received_at.into()
    }

    /// Due date as a jiff civil date, when resolved.
    pub fn due_date(&self) -> Option<jiff::civil::Date> {
        self.due_date.map(Into::into)
    }

    /// Returns whether the unit reached a terminal status.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns whether this row satisfies the processed-row invariant:
    /// `processed` implies both required fields are present.
    pub fn satisfies_processed_invariant(&self) -> bool {
        self.status != InvoiceStatus::Processed
            || (self.invoice_number.is_some() && self.total_amount.is_some())
    }
}

impl NewInvoice {
    /// Creates the row data for a freshly received message.
    pub fn received(sender_whatsapp: impl Into<String>) -> Self {
        Self {
            sender_whatsapp: sender_whatsapp.into(),
            status: InvoiceStatus::Received,
        }
    }
}
