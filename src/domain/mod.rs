pub mod billing;
pub mod customer;
pub mod invoice;
pub mod ports;
pub mod repositories;

// Re-export commonly used types
pub use billing::{BillingProcessingResults, CustomerProcessingResults};
pub use customer::{Customer, CustomerRepository};
pub use invoice::{Currency, Invoice, InvoiceRepository, InvoiceStatus, Money};
pub use ports::{InvoiceStatusPort, PaymentProvider, PendingInvoiceSource};
pub use repositories::{DomainResult, RepositoryProvider};

// Re-export errors from shared for convenience
pub use crate::shared::errors::{DomainError, PaymentError};
