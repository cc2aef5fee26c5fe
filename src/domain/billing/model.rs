//! Billing run results

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of charging one customer's pending invoices in a run.
///
/// `total == successful + failed` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CustomerProcessingResults {
    customer_id: i32,
    total_invoices_processed: usize,
    successful_invoices_processed: usize,
    failed_invoices_processed: usize,
}

impl CustomerProcessingResults {
    pub fn new(customer_id: i32, successful: usize, failed: usize) -> Self {
        Self {
            customer_id,
            total_invoices_processed: successful + failed,
            successful_invoices_processed: successful,
            failed_invoices_processed: failed,
        }
    }

    /// Every invoice handed to the customer counted as failed.
    pub fn all_failed(customer_id: i32, invoices: usize) -> Self {
        Self::new(customer_id, 0, invoices)
    }

    pub fn customer_id(&self) -> i32 {
        self.customer_id
    }

    pub fn total(&self) -> usize {
        self.total_invoices_processed
    }

    pub fn successful(&self) -> usize {
        self.successful_invoices_processed
    }

    pub fn failed(&self) -> usize {
        self.failed_invoices_processed
    }
}

/// Aggregated results of one `charge_invoices` run, one entry per customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingProcessingResults {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    results_by_customer: BTreeMap<i32, CustomerProcessingResults>,
}

impl BillingProcessingResults {
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: impl IntoIterator<Item = CustomerProcessingResults>,
    ) -> Self {
        let results_by_customer = results
            .into_iter()
            .map(|result| (result.customer_id(), result))
            .collect();

        Self {
            run_id,
            started_at,
            finished_at,
            results_by_customer,
        }
    }

    pub fn results_by_customer(&self) -> &BTreeMap<i32, CustomerProcessingResults> {
        &self.results_by_customer
    }

    pub fn get(&self, customer_id: i32) -> Option<&CustomerProcessingResults> {
        self.results_by_customer.get(&customer_id)
    }

    pub fn len(&self) -> usize {
        self.results_by_customer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results_by_customer.is_empty()
    }

    pub fn total_invoices(&self) -> usize {
        self.results_by_customer.values().map(|r| r.total()).sum()
    }

    pub fn total_successful(&self) -> usize {
        self.results_by_customer.values().map(|r| r.successful()).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.results_by_customer.values().map(|r| r.failed()).sum()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
