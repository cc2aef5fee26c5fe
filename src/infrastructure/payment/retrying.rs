//! Retrying payment provider decorator

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Invoice, PaymentProvider};
use crate::shared::errors::PaymentError;
use crate::shared::retry::{retry_with_backoff, RetryConfig};

/// Wraps a provider and re-issues charges that failed with
/// [`PaymentError::Network`], backing off between attempts.
///
/// Declines and permanent errors pass through on the first attempt.
/// When attempts run out the last network error is returned.
pub struct RetryingPaymentProvider {
    inner: Arc<dyn PaymentProvider>,
    config: RetryConfig,
}

impl RetryingPaymentProvider {
    pub fn new(inner: Arc<dyn PaymentProvider>) -> Self {
        Self {
            inner,
            config: RetryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl PaymentProvider for RetryingPaymentProvider {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError> {
        retry_with_backoff(
            self.config.clone(),
            || {
                debug!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    "Charging invoice through payment provider"
                );
                self.inner.charge(invoice)
            },
            PaymentError::is_transient,
            "charge_invoice",
        )
        .await
    }
}
