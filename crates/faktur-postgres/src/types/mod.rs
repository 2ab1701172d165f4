//! Shared database types: enums and constraint mappings.

mod constraint;
mod invoice_status;

pub use constraint::ConstraintViolation;
pub use invoice_status::InvoiceStatus;
