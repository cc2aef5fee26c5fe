//! Billing service: charges every pending invoice once per run
//!
//! Customers are charged concurrently (bounded), invoices of one customer
//! strictly in order. Failures are classified per invoice and never abort
//! the run; the returned results describe exactly what happened.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::services::InvoiceService;
use crate::domain::{
    BillingProcessingResults, CustomerProcessingResults, Invoice, InvoiceStatus,
    InvoiceStatusPort, PaymentProvider, PendingInvoiceSource,
};
use crate::shared::errors::PaymentError;
use crate::shared::shutdown::ShutdownSignal;

const DEFAULT_MAX_CONCURRENT_CUSTOMERS: usize = 8;

/// What a single charge attempt means for the rest of the customer's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvoiceOutcome {
    Charged,
    Failed,
    /// Provider does not know the customer; skip the rest of their invoices.
    AbortCustomer,
}

/// Service for charging pending invoices
pub struct BillingService {
    payment_provider: Arc<dyn PaymentProvider>,
    pending_invoices: Arc<dyn PendingInvoiceSource>,
    invoice_status: Arc<dyn InvoiceStatusPort>,
    max_concurrent_customers: usize,
    shutdown: Option<ShutdownSignal>,
}

impl BillingService {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, invoices: Arc<InvoiceService>) -> Self {
        Self::with_ports(payment_provider, invoices.clone(), invoices)
    }

    pub fn with_ports(
        payment_provider: Arc<dyn PaymentProvider>,
        pending_invoices: Arc<dyn PendingInvoiceSource>,
        invoice_status: Arc<dyn InvoiceStatusPort>,
    ) -> Self {
        Self {
            payment_provider,
            pending_invoices,
            invoice_status,
            max_concurrent_customers: DEFAULT_MAX_CONCURRENT_CUSTOMERS,
            shutdown: None,
        }
    }

    pub fn with_max_concurrent_customers(mut self, max: usize) -> Self {
        self.max_concurrent_customers = max.max(1);
        self
    }

    /// Stop between invoice attempts once `signal` fires.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Charge every pending invoice once and report per-customer counts.
    ///
    /// Never fails: fetch errors yield an empty result, per-invoice and
    /// per-customer errors are logged and counted.
    pub async fn charge_invoices(&self) -> BillingProcessingResults {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();

        info!(%run_id, "Starting to charge invoices for all customers");

        let invoices_by_customer = match self.pending_invoices.fetch_pending_by_customer().await {
            Ok(invoices) => invoices,
            Err(e) => {
                error!(%run_id, error = %e, "Failed to fetch pending invoices, skipping run");
                return BillingProcessingResults::new(run_id, started_at, Utc::now(), Vec::new());
            }
        };

        let permits = Arc::new(Semaphore::new(self.max_concurrent_customers));
        let mut join_set = JoinSet::new();
        let mut spawned = HashMap::new();

        for (customer_id, invoices) in invoices_by_customer {
            if invoices.is_empty() {
                continue;
            }

            let invoice_count = invoices.len();
            let charger = CustomerCharger {
                payment_provider: self.payment_provider.clone(),
                invoice_status: self.invoice_status.clone(),
                shutdown: self.shutdown.clone(),
            };
            let permits = permits.clone();

            let handle = join_set.spawn(async move {
                // Semaphore is never closed, so acquire only fails if it were.
                let _permit = permits.acquire_owned().await.ok();
                charger.charge_customer(customer_id, invoices).await
            });
            spawned.insert(handle.id(), (customer_id, invoice_count));
        }

        let mut results = Vec::with_capacity(spawned.len());
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, result)) => results.push(result),
                Err(join_error) => {
                    let Some(&(customer_id, invoice_count)) = spawned.get(&join_error.id()) else {
                        error!(%run_id, error = %join_error, "Unknown billing task failed");
                        continue;
                    };
                    error!(
                        %run_id,
                        customer_id,
                        error = %join_error,
                        "Customer billing task panicked, counting all invoices as failed"
                    );
                    results.push(CustomerProcessingResults::all_failed(customer_id, invoice_count));
                }
            }
        }

        let results = BillingProcessingResults::new(run_id, started_at, Utc::now(), results);
        let elapsed = timer.elapsed();

        metrics::counter!("billing_runs_total").increment(1);
        metrics::histogram!("billing_run_duration_seconds").record(elapsed.as_secs_f64());

        info!(
            %run_id,
            customers = results.len(),
            invoices = results.total_invoices(),
            successful = results.total_successful(),
            failed = results.total_failed(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Finished charging invoices for all customers"
        );

        results
    }
}

/// Per-customer worker. Owns clones of the shared ports so it can run on its own task.
struct CustomerCharger {
    payment_provider: Arc<dyn PaymentProvider>,
    invoice_status: Arc<dyn InvoiceStatusPort>,
    shutdown: Option<ShutdownSignal>,
}

impl CustomerCharger {
    async fn charge_customer(
        &self,
        customer_id: i32,
        invoices: Vec<Invoice>,
    ) -> CustomerProcessingResults {
        debug!(customer_id, invoices = invoices.len(), "Processing customer invoices");

        let mut successful = 0;
        let mut failed = 0;

        for (position, invoice) in invoices.iter().enumerate() {
            let remaining = invoices.len() - position;

            if self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered) {
                warn!(
                    customer_id,
                    remaining, "Shutdown requested, leaving remaining invoices pending"
                );
                failed += remaining;
                break;
            }

            let outcome = AssertUnwindSafe(self.charge_invoice(invoice))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    error!(
                        invoice_id = invoice.id,
                        customer_id,
                        "Charging invoice panicked, counting it as failed"
                    );
                    metrics::counter!("billing_invoices_charged_total", "outcome" => "panicked")
                        .increment(1);
                    InvoiceOutcome::Failed
                });

            match outcome {
                InvoiceOutcome::Charged => successful += 1,
                InvoiceOutcome::Failed => failed += 1,
                InvoiceOutcome::AbortCustomer => {
                    failed += remaining;
                    break;
                }
            }
        }

        let result = CustomerProcessingResults::new(customer_id, successful, failed);
        debug!(
            customer_id,
            total = result.total(),
            successful = result.successful(),
            failed = result.failed(),
            "Finished customer invoices"
        );
        result
    }

    async fn charge_invoice(&self, invoice: &Invoice) -> InvoiceOutcome {
        let outcome = match self.payment_provider.charge(invoice).await {
            Ok(true) => {
                info!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    amount = %invoice.amount,
                    "Invoice charged"
                );
                // Money was collected; a failed write is an anomaly, not a failed charge.
                self.set_status(invoice, InvoiceStatus::Paid).await;
                InvoiceOutcome::Charged
            }
            Ok(false) => {
                info!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    "Charge declined by payment provider, invoice stays pending"
                );
                InvoiceOutcome::Failed
            }
            Err(PaymentError::Network) => {
                error!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    "Network error when charging invoice, retries exhausted"
                );
                InvoiceOutcome::Failed
            }
            Err(PaymentError::CurrencyMismatch { .. }) => {
                // No customer notification exists yet; invalid invoices need manual correction.
                error!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    currency = %invoice.amount.currency,
                    "Invoice currency does not match the customer account, marking it invalid"
                );
                self.set_status(invoice, InvoiceStatus::Invalid).await;
                InvoiceOutcome::Failed
            }
            Err(PaymentError::CustomerNotFound { .. }) => {
                error!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    "Customer not found at payment provider, stopping charges for this customer"
                );
                InvoiceOutcome::AbortCustomer
            }
            Err(PaymentError::Unexpected(reason)) => {
                error!(
                    invoice_id = invoice.id,
                    customer_id = invoice.customer_id,
                    %reason,
                    "Unexpected error when charging invoice"
                );
                InvoiceOutcome::Failed
            }
        };

        let label = match outcome {
            InvoiceOutcome::Charged => "charged",
            InvoiceOutcome::Failed => "failed",
            InvoiceOutcome::AbortCustomer => "customer_not_found",
        };
        metrics::counter!("billing_invoices_charged_total", "outcome" => label).increment(1);

        outcome
    }

    async fn set_status(&self, invoice: &Invoice, status: InvoiceStatus) {
        if let Err(e) = self.invoice_status.set_status(invoice.id, status).await {
            metrics::counter!("billing_status_update_failures_total").increment(1);
            error!(
                invoice_id = invoice.id,
                customer_id = invoice.customer_id,
                %status,
                error = %e,
                "Failed to update invoice status, invoice changed or disappeared during the run"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::domain::{Currency, DomainError, DomainResult, Money};
    use crate::infrastructure::storage::InMemoryStorage;

    /// Panics on one invoice id, charges everything else.
    struct PanickingProvider {
        panic_on: i32,
    }

    #[async_trait]
    impl PaymentProvider for PanickingProvider {
        async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError> {
            if invoice.id == self.panic_on {
                panic!("provider client bug");
            }
            Ok(true)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PendingInvoiceSource for FailingSource {
        async fn fetch_pending_by_customer(&self) -> DomainResult<HashMap<i32, Vec<Invoice>>> {
            Err(DomainError::Storage("connection refused".into()))
        }
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PaymentProvider for CountingProvider {
        async fn charge(&self, _invoice: &Invoice) -> Result<bool, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn pending(id: i32, customer_id: i32) -> Invoice {
        Invoice {
            id,
            customer_id,
            amount: Money::new(Decimal::TEN, Currency::Eur),
            status: InvoiceStatus::Pending,
        }
    }

    fn storage_with(invoices: &[Invoice]) -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        for invoice in invoices {
            storage.insert_invoice(invoice.clone());
        }
        storage
    }

    #[tokio::test]
    async fn panic_in_one_customer_does_not_touch_others() {
        let storage = storage_with(&[pending(1, 1), pending(2, 2), pending(3, 2)]);
        let invoices = Arc::new(InvoiceService::new(storage.clone()));
        let service = BillingService::new(Arc::new(PanickingProvider { panic_on: 2 }), invoices);

        let results = service.charge_invoices().await;

        assert_eq!(results.get(1), Some(&CustomerProcessingResults::new(1, 1, 0)));
        assert_eq!(results.get(2), Some(&CustomerProcessingResults::new(2, 1, 1)));
        assert_eq!(storage.invoice_status(1), Some(InvoiceStatus::Paid));
        assert_eq!(storage.invoice_status(2), Some(InvoiceStatus::Pending));
        assert_eq!(storage.invoice_status(3), Some(InvoiceStatus::Paid));
    }

    #[tokio::test]
    async fn invoices_paid_before_a_panic_stay_counted_as_paid() {
        let storage = storage_with(&[pending(1, 1), pending(2, 1), pending(3, 1)]);
        let invoices = Arc::new(InvoiceService::new(storage.clone()));
        let service = BillingService::new(Arc::new(PanickingProvider { panic_on: 2 }), invoices);

        let results = service.charge_invoices().await;

        let customer = results.get(1).expect("customer 1 processed");
        assert_eq!(customer.total(), 3);
        assert_eq!(customer.successful(), 2);
        assert_eq!(customer.failed(), 1);
        assert_eq!(storage.invoice_status(1), Some(InvoiceStatus::Paid));
        assert_eq!(storage.invoice_status(2), Some(InvoiceStatus::Pending));
        assert_eq!(storage.invoice_status(3), Some(InvoiceStatus::Paid));
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty_results() {
        let storage = storage_with(&[]);
        let invoices = Arc::new(InvoiceService::new(storage));
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service =
            BillingService::with_ports(provider.clone(), Arc::new(FailingSource), invoices);

        let results = service.charge_invoices().await;

        assert!(results.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn triggered_shutdown_leaves_invoices_pending() {
        let storage = storage_with(&[pending(1, 1), pending(2, 1)]);
        let invoices = Arc::new(InvoiceService::new(storage.clone()));
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let service = BillingService::new(provider.clone(), invoices).with_shutdown(shutdown);
        let results = service.charge_invoices().await;

        assert_eq!(results.get(1), Some(&CustomerProcessingResults::new(1, 0, 2)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(storage.invoice_status(1), Some(InvoiceStatus::Pending));
        assert_eq!(storage.invoice_status(2), Some(InvoiceStatus::Pending));
    }

    #[tokio::test]
    async fn single_worker_still_processes_every_customer() {
        let invoices: Vec<Invoice> = (1..=6).map(|id| pending(id, id % 3 + 1)).collect();
        let storage = storage_with(&invoices);
        let service = BillingService::new(
            Arc::new(CountingProvider {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(InvoiceService::new(storage)),
        )
        .with_max_concurrent_customers(1);

        let results = service.charge_invoices().await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.total_successful(), 6);
    }
}
