//! PostgreSQL-backed reconciliation store.

use faktur_extract::ValidatedRecord;
use faktur_postgres::model::{Invoice, NewInvoice, UpdateInvoice};
use faktur_postgres::query::InvoiceRepository;
use faktur_postgres::types::InvoiceStatus;
use faktur_postgres::{PgClient, PgError};
use tracing::{debug, info};
use uuid::Uuid;

use super::{FinalizeOutcome, ReconciliationStore, StoreError, StoredInvoice, terminal_status_for};
use crate::TRACING_TARGET_STORE;
use crate::error::FailureKind;

/// Reconciliation store over the faktur PostgreSQL layer.
///
/// Dedup relies on two layers: callers serialize same-key finalization via
/// [`KeyedLocks`], and the partial unique index over processed rows turns
/// any remaining race into a constraint violation this store resolves as
/// dedup-success.
///
/// [`KeyedLocks`]: crate::KeyedLocks
#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    client: PgClient,
}

impl PgInvoiceStore {
    /// Creates a store over an existing database client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Returns the underlying database client.
    pub fn client(&self) -> &PgClient {
        &self.client
    }

    /// Distinguishes not-found from illegal-transition after a CAS miss.
    async fn explain_cas_miss(
        &self,
        id: Uuid,
        to: InvoiceStatus,
    ) -> Result<StoreError, StoreError> {
        let mut conn = self.client.get_connection().await?;
        match InvoiceRepository::find_invoice_by_id(&mut conn, id).await? {
            None => Ok(StoreError::NotFound(id)),
            Some(row) => Ok(StoreError::IllegalTransition {
                from: row.status,
                to,
            }),
        }
    }
}

impl From<Invoice> for StoredInvoice {
    fn from(row: Invoice) -> Self {
        Self {
            id: row.id,
            received_at: row.received_at(),
            due_date: row.due_date(),
            sender_whatsapp: row.sender_whatsapp,
            invoice_number: row.invoice_number,
            total_amount: row.total_amount,
            status: row.status,
            failure_kind: row.failure_kind,
        }
    }
}

#[async_trait::async_trait]
impl ReconciliationStore for PgInvoiceStore {
    async fn create_received(&self, sender_whatsapp: &str) -> Result<StoredInvoice, StoreError> {
        let mut conn = self.client.get_connection().await?;
        let row =
            InvoiceRepository::create_invoice(&mut conn, NewInvoice::received(sender_whatsapp))
                .await?;

        debug!(
            target: TRACING_TARGET_STORE,
            invoice_id = %row.id,
            "Created received row"
        );

        Ok(row.into())
    }

    async fn begin_processing(&self, id: Uuid) -> Result<StoredInvoice, StoreError> {
        let mut conn = self.client.get_connection().await?;
        let updated = InvoiceRepository::transition_status(
            &mut conn,
            id,
            InvoiceStatus::Received,
            InvoiceStatus::Processing,
        )
        .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None => Err(self.explain_cas_miss(id, InvoiceStatus::Processing).await?),
        }
    }

    async fn finalize(
        &self,
        id: Uuid,
        record: &ValidatedRecord,
    ) -> Result<FinalizeOutcome, StoreError> {
        let target = terminal_status_for(record);
        let mut conn = self.client.get_connection().await?;

        // Dedup applies only when the unit can become a processed invoice.
        if target == InvoiceStatus::Processed {
            let Some(number) = record.invoice_number.as_deref() else {
                // terminal_status_for only returns Processed with a number.
                return Err(StoreError::backend(PgError::Unexpected(
                    "processed target without invoice number".into(),
                )));
            };

            let current = InvoiceRepository::find_invoice_by_id(&mut conn, id)
                .await?
                .ok_or(StoreError::NotFound(id))?;

            if let Some(existing) = InvoiceRepository::find_processed_duplicate(
                &mut conn,
                &current.sender_whatsapp,
                number,
                id,
            )
            .await?
            {
                InvoiceRepository::delete_duplicate_row(&mut conn, id).await?;

                info!(
                    target: TRACING_TARGET_STORE,
                    invoice_id = %existing.id,
                    duplicate_of = %id,
                    "Redelivered unit folded into prior processed row"
                );

                return Ok(FinalizeOutcome {
                    invoice: existing.into(),
                    deduplicated: true,
                });
            }
        }

        let changes = UpdateInvoice {
            invoice_number: record.invoice_number.clone(),
            total_amount: record.total_amount.clone(),
            due_date: record.due_date.map(Into::into),
            status: Some(target),
            failure_kind: None,
        };

        match InvoiceRepository::finalize_invoice(&mut conn, id, changes).await {
            Ok(Some(row)) => Ok(FinalizeOutcome {
                invoice: row.into(),
                deduplicated: false,
            }),
            Ok(None) => Err(self.explain_cas_miss(id, target).await?),
            Err(error) if error.is_dedup_conflict() => {
                // Lost the cross-process race: another delivery reached
                // processed first. Resolve exactly like the lookup path.
                let current = InvoiceRepository::find_invoice_by_id(&mut conn, id)
                    .await?
                    .ok_or(StoreError::NotFound(id))?;
                let number = record.invoice_number.as_deref().unwrap_or_default();

                let existing = InvoiceRepository::find_processed_duplicate(
                    &mut conn,
                    &current.sender_whatsapp,
                    number,
                    id,
                )
                .await?
                .ok_or_else(|| StoreError::backend(error))?;

                InvoiceRepository::delete_duplicate_row(&mut conn, id).await?;

                Ok(FinalizeOutcome {
                    invoice: existing.into(),
                    deduplicated: true,
                })
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        kind: FailureKind,
    ) -> Result<StoredInvoice, StoreError> {
        let mut conn = self.client.get_connection().await?;

        let changes = UpdateInvoice {
            status: Some(InvoiceStatus::Failed),
            failure_kind: Some(kind.as_str().to_string()),
            ..UpdateInvoice::default()
        };

        match InvoiceRepository::finalize_invoice(&mut conn, id, changes).await? {
            Some(row) => Ok(row.into()),
            None => Err(self.explain_cas_miss(id, InvoiceStatus::Failed).await?),
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<StoredInvoice>, StoreError> {
        let mut conn = self.client.get_connection().await?;
        let row = InvoiceRepository::find_invoice_by_id(&mut conn, id).await?;
        Ok(row.map(Into::into))
    }
}
