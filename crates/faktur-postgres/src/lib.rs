#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Embeds all migrations into the final binary.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

// Tracing target constants for consistent logging.

/// Tracing target for client-related operations.
///
/// Use this target for logging client initialization, configuration, and lifecycle events.
pub const TRACING_TARGET_CLIENT: &str = "faktur_postgres::client";

/// Tracing target for database query operations.
///
/// Use this target for logging query execution, results, and query-related errors.
pub const TRACING_TARGET_QUERY: &str = "faktur_postgres::query";

/// Tracing target for database migration operations.
///
/// Use this target for logging migration application and status checks.
pub const TRACING_TARGET_MIGRATION: &str = "faktur_postgres::migrations";

/// Tracing target for database connection operations.
///
/// Use this target for logging connection establishment, pool management, and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "faktur_postgres::connection";

mod client;
mod error;
pub mod model;
pub mod query;
mod schema;
pub mod types;

pub use client::{PgClient, PgConfig, PgConn, PgPoolStatus};
pub use error::{BoxError, PgError, PgResult};

/// The async PostgreSQL connection type used throughout this crate.
pub type PgConnection = diesel_async::AsyncPgConnection;

/// Deadpool-managed connection pool over [`PgConnection`].
pub(crate) type ConnectionPool = diesel_async::pooled_connection::deadpool::Pool<PgConnection>;

/// One pooled connection checked out of the [`ConnectionPool`].
pub(crate) type PooledConnection = diesel_async::pooled_connection::deadpool::Object<PgConnection>;
