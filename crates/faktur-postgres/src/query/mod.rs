//! Stateless repositories over the schema.

mod invoice;

pub use invoice::InvoiceRepository;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Maximum rows returned.
    pub limit: i64,
    /// Rows skipped before the first returned row.
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Creates pagination with the given limit and offset.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, 500),
            offset: offset.max(0),
        }
    }
}
