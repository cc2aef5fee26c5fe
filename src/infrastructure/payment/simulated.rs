//! Simulated payment provider
//!
//! Stand-in for a real provider when running locally. Validates the
//! customer and currency against storage, then rolls dice for network
//! failures and declines.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::trace;

use crate::config::SimulatorConfig;
use crate::domain::{Invoice, PaymentProvider, RepositoryProvider};
use crate::shared::errors::PaymentError;

pub struct SimulatedPaymentProvider {
    repos: Arc<dyn RepositoryProvider>,
    network_error_rate: f64,
    decline_rate: f64,
}

impl SimulatedPaymentProvider {
    pub fn new(repos: Arc<dyn RepositoryProvider>, config: &SimulatorConfig) -> Self {
        Self {
            repos,
            network_error_rate: config.network_error_rate,
            decline_rate: config.decline_rate,
        }
    }
}

#[async_trait]
impl PaymentProvider for SimulatedPaymentProvider {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError> {
        let customer = self
            .repos
            .customers()
            .find_by_id(invoice.customer_id)
            .await
            .map_err(|e| PaymentError::Unexpected(e.to_string()))?
            .ok_or(PaymentError::CustomerNotFound {
                customer_id: invoice.customer_id,
            })?;

        if customer.currency != invoice.amount.currency {
            return Err(PaymentError::CurrencyMismatch {
                invoice_id: invoice.id,
                customer_id: customer.id,
            });
        }

        let (network_roll, decline_roll) = {
            let mut rng = rand::thread_rng();
            (rng.gen::<f64>(), rng.gen::<f64>())
        };

        if network_roll < self.network_error_rate {
            trace!(invoice_id = invoice.id, "Simulated network failure");
            return Err(PaymentError::Network);
        }

        Ok(decline_roll >= self.decline_rate)
    }
}
