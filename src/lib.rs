//! # Invoice Billing
//!
//! Charges pending invoices through an external payment provider on a
//! schedule, one task per customer, and reports what happened per customer.
//!
//! ## Architecture
//!
//! - **domain**: invoices, customers, billing results and the outbound ports
//! - **application**: billing orchestration, scheduler and read/edit services
//! - **infrastructure**: in-memory storage, payment providers, demo data
//! - **shared**: errors, retry with backoff, shutdown signal
//! - **runtime**: wiring, tracing setup and lifecycle

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod runtime;
pub mod shared;

pub use application::{BillingScheduler, BillingService, CustomerService, InvoiceService};
pub use config::{default_config_path, AppConfig};
pub use domain::{BillingProcessingResults, CustomerProcessingResults};
pub use runtime::{init_tracing, RuntimeHandle, RuntimeOptions};
