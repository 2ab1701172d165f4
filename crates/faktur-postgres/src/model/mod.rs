//! Database models for the invoices table.

mod invoice;

pub use invoice::{Invoice, NewInvoice, UpdateInvoice};
