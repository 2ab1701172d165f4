//! Shared error utilities.

/// Type-erased error type for dynamic error handling.
///
/// Used as the `source` payload of structured errors across faktur crates.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;
