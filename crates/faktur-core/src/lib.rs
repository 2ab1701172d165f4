#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Faktur Core
//!
//! This crate provides the foundational abstractions for the faktur invoice
//! ingestion pipeline. It defines the attachment/page/fragment data model and
//! the Optical Character Recognition (OCR) capability trait without depending
//! on any concrete engine implementation.

mod error;
mod health;

pub mod ocr;
pub mod types;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

// Re-export key types for convenience
pub use error::BoxedError;
pub use health::{ServiceHealth, ServiceStatus};
pub use types::{Attachment, BoundingBox, MediaType, PageImage, TextFragment};
