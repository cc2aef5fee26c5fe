//! Payment provider adapters

mod retrying;
mod simulated;

pub use retrying::RetryingPaymentProvider;
pub use simulated::SimulatedPaymentProvider;
