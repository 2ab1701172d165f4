#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for pipeline orchestration.
pub const TRACING_TARGET_PIPELINE: &str = "faktur_ingest::pipeline";

/// Tracing target for reconciliation store operations.
pub const TRACING_TARGET_STORE: &str = "faktur_ingest::store";

/// Tracing target for worker pool operations.
pub const TRACING_TARGET_WORKER: &str = "faktur_ingest::worker";

mod config;
mod error;
mod lock;
mod pipeline;
mod worker;

pub mod store;

pub use config::IngestConfig;
pub use error::{FailureKind, IngestError, Result};
pub use lock::KeyedLocks;
pub use pipeline::{IngestOutcome, IngestionPipeline};
pub use store::{FinalizeOutcome, PgInvoiceStore, ReconciliationStore, StoreError, StoredInvoice};
pub use worker::IngestWorker;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use store::MemoryInvoiceStore;
