//! Invoice aggregate
//!
//! Contains the Invoice entity, money types, and repository interface.

pub mod model;
pub mod repository;

pub use model::{Currency, Invoice, InvoiceStatus, Money};
pub use repository::InvoiceRepository;
