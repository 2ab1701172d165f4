#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for document loading operations.
pub const TRACING_TARGET: &str = "faktur_document";

mod error;
mod loader;

pub use error::{DocumentError, Result};
pub use loader::{DocumentLoader, LoaderConfig};
