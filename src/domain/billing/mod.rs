//! Billing results model

pub mod model;

pub use model::{BillingProcessingResults, CustomerProcessingResults};
