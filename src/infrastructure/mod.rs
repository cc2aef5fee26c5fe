//! Infrastructure layer - external concerns

pub mod payment;
pub mod seed;
pub mod storage;

pub use payment::{RetryingPaymentProvider, SimulatedPaymentProvider};
pub use seed::setup_initial_data;
pub use storage::InMemoryStorage;
