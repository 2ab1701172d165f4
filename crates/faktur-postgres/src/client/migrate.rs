//! Embedded migration runner.

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

impl PgClient {
    /// Runs all pending migrations on the database.
    ///
    /// Migrations execute on a blocking thread because the diesel
    /// migration harness is synchronous; the pooled async connection is
    /// wrapped for the duration of the run.
    ///
    /// # Returns
    ///
    /// The versions of the migrations that were applied, in order. Empty
    /// when the schema was already up to date.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    pub async fn run_pending_migrations(&self) -> PgResult<Vec<String>> {
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            "Starting database migration process"
        );

        let conn = self.get_pooled_connection().await?;
        let mut conn: AsyncConnectionWrapper<_> = conn.into();

        let applied = spawn_blocking(move || {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| {
                    versions
                        .into_iter()
                        .map(|version| version.to_string())
                        .collect::<Vec<_>>()
                })
                .map_err(PgError::Migration)
        })
        .await
        .map_err(|join_error| {
            tracing::error!(
                target: TRACING_TARGET_MIGRATION,
                error = %join_error,
                "Migration task panicked"
            );
            PgError::Unexpected(format!("migration task panicked: {join_error}").into())
        })??;

        if applied.is_empty() {
            tracing::info!(
                target: TRACING_TARGET_MIGRATION,
                "Database schema is already up to date"
            );
        } else {
            tracing::info!(
                target: TRACING_TARGET_MIGRATION,
                applied = applied.len(),
                versions = ?applied,
                "Applied pending migrations"
            );
        }

        Ok(applied)
    }
}
