#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for extraction operations.
pub const TRACING_TARGET_EXTRACT: &str = "faktur_extract::extractor";

/// Tracing target for validation operations.
pub const TRACING_TARGET_VALIDATE: &str = "faktur_extract::validator";

mod candidate;
mod layout;
mod validator;

pub mod extractor;

pub use candidate::{Candidate, CandidateSet, FieldKind};
pub use extractor::{ExtractorConfig, FieldExtractor};
pub use validator::{ExtractionConfidence, ValidatedRecord, Validator, ValidatorConfig};
