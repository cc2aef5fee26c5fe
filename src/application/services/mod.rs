//! Application services

mod billing;
mod billing_scheduler;
mod customer;
mod invoice;

pub use billing::BillingService;
pub use billing_scheduler::BillingScheduler;
pub use customer::CustomerService;
pub use invoice::InvoiceService;
