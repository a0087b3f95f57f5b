//! External API integrations

pub mod invoice_api;

pub use invoice_api::InvoiceApiClient;
