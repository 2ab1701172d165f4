#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for PaddleOCR client operations.
pub const TRACING_TARGET: &str = "faktur_paddle";

mod client;
mod provider;

pub use client::{PaddleClient, PaddleConfig, PaddleConfigBuilder};

// The adapter speaks the shared OCR error vocabulary.
pub use faktur_core::ocr::{Error, ErrorKind, Result};
