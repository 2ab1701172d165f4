//! Invoice repository for ingestion and reconciliation operations.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::Pagination;
use crate::model::{Invoice, NewInvoice, UpdateInvoice};
use crate::types::InvoiceStatus;
use crate::{PgError, PgResult, schema};

/// Repository for invoice database operations.
///
/// Provides the operations the ingestion pipeline and the reconciliation
/// logic need: row creation at receipt, compare-and-swap status updates at
/// stage boundaries, and the `(sender_whatsapp, invoice_number)` dedup
/// lookup. The repository is stateless; callers supply the connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvoiceRepository;

impl InvoiceRepository {
    /// Creates a new invoice repository instance.
    pub fn new() -> Self {
        Self
    }

    /// Creates a new invoice row at message receipt.
    ///
    /// The database stamps `received_at`; the caller never supplies it.
    ///
    /// # Returns
    ///
    /// The created [`Invoice`] with database-generated id and timestamp.
    pub async fn create_invoice(
        conn: &mut AsyncPgConnection,
        new_invoice: NewInvoice,
    ) -> PgResult<Invoice> {
        use schema::invoices;

        let invoice = diesel::insert_into(invoices::table)
            .values(&new_invoice)
            .returning(Invoice::as_returning())
            .get_result(conn)
            .await
            .map_err(PgError::from)?;

        Ok(invoice)
    }

    /// Finds an invoice by its unique identifier.
    pub async fn find_invoice_by_id(
        conn: &mut AsyncPgConnection,
        invoice_id: Uuid,
    ) -> PgResult<Option<Invoice>> {
        use schema::invoices::{self, dsl};

        let invoice = invoices::table
            .filter(dsl::id.eq(invoice_id))
            .select(Invoice::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(invoice)
    }

    /// Finds a prior `processed` row for the same `(sender, invoice
    /// number)` key, excluding the in-flight row itself.
    ///
    /// This is the dedup lookup: a hit means the key already reached
    /// `processed` and the in-flight unit is a redelivery.
    pub async fn find_processed_duplicate(
        conn: &mut AsyncPgConnection,
        sender_whatsapp: &str,
        invoice_number: &str,
        exclude_id: Uuid,
    ) -> PgResult<Option<Invoice>> {
        use schema::invoices::{self, dsl};

        let invoice = invoices::table
            .filter(dsl::sender_whatsapp.eq(sender_whatsapp))
            .filter(dsl::invoice_number.eq(invoice_number))
            .filter(dsl::status.eq(InvoiceStatus::Processed))
            .filter(dsl::id.ne(exclude_id))
            .select(Invoice::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(invoice)
    }

    /// Compare-and-swap status transition.
    ///
    /// Updates the row only when its current status equals `expected`,
    /// which makes concurrent stage writes race-safe: the loser observes
    /// `None` instead of clobbering a terminal status.
    ///
    /// # Returns
    ///
    /// The updated row, or `None` when the row does not exist or its
    /// status no longer matches `expected`.
    pub async fn transition_status(
        conn: &mut AsyncPgConnection,
        invoice_id: Uuid,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> PgResult<Option<Invoice>> {
        use schema::invoices::{self, dsl};

        let invoice = diesel::update(invoices::table)
            .filter(dsl::id.eq(invoice_id))
            .filter(dsl::status.eq(expected))
            .set(dsl::status.eq(next))
            .returning(Invoice::as_returning())
            .get_result(conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(invoice)
    }

    /// Finalizes a `processing` row with extracted fields and a terminal
    /// status, as one compare-and-swap write.
    ///
    /// A unique-violation on the processed partial index surfaces as a
    /// [`PgError::Query`] whose constraint the caller inspects; the
    /// reconciliation logic treats it as dedup-success.
    pub async fn finalize_invoice(
        conn: &mut AsyncPgConnection,
        invoice_id: Uuid,
        changes: UpdateInvoice,
    ) -> PgResult<Option<Invoice>> {
        use schema::invoices::{self, dsl};

        let invoice = diesel::update(invoices::table)
            .filter(dsl::id.eq(invoice_id))
            .filter(dsl::status.eq(InvoiceStatus::Processing))
            .set(&changes)
            .returning(Invoice::as_returning())
            .get_result(conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(invoice)
    }

    /// Removes a redelivered unit's in-flight row after a dedup hit.
    ///
    /// This is the only deletion in the system. It is not part of any
    /// public archival surface: the surviving `processed` row keeps the
    /// audit trail, and the fold happens before the duplicate reaches a
    /// terminal status.
    pub async fn delete_duplicate_row(
        conn: &mut AsyncPgConnection,
        invoice_id: Uuid,
    ) -> PgResult<bool> {
        use schema::invoices::{self, dsl};

        let deleted = diesel::delete(invoices::table.filter(dsl::id.eq(invoice_id)))
            .execute(conn)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    /// Lists invoices for one sender, most recent first.
    pub async fn find_invoices_by_sender(
        conn: &mut AsyncPgConnection,
        sender_whatsapp: &str,
        pagination: Pagination,
    ) -> PgResult<Vec<Invoice>> {
        use schema::invoices::{self, dsl};

        let invoices = invoices::table
            .filter(dsl::sender_whatsapp.eq(sender_whatsapp))
            .order(dsl::received_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(Invoice::as_select())
            .load(conn)
            .await
            .map_err(PgError::from)?;

        Ok(invoices)
    }

    /// Lists invoices awaiting operator attention, oldest first.
    ///
    /// Feeds the review queue for `needs_review` and `failed` rows.
    pub async fn find_invoices_for_review(
        conn: &mut AsyncPgConnection,
        pagination: Pagination,
    ) -> PgResult<Vec<Invoice>> {
        use schema::invoices::{self, dsl};

        let invoices = invoices::table
            .filter(dsl::status.eq_any(InvoiceStatus::review_statuses()))
            .order(dsl::received_at.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(Invoice::as_select())
            .load(conn)
            .await
            .map_err(PgError::from)?;

        Ok(invoices)
    }
}
