//! Outbound ports: capabilities the billing core calls out to
//!
//! The orchestrator only sees these traits. Payment providers, the
//! pending-invoice query and the status writer are plugged in by the
//! runtime (or by fakes in tests).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{DomainResult, Invoice, InvoiceStatus};
use crate::shared::errors::PaymentError;

// ── PaymentProvider ────────────────────────────────────────────

/// External payment provider.
///
/// Shared across concurrent customer tasks, so implementations must be
/// stateless or synchronize internally.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charge the invoice amount from the customer's account.
    ///
    /// `Ok(true)` when charged, `Ok(false)` when the provider declined
    /// (e.g. insufficient funds). Errors carry the failure kind.
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError>;
}

// ── PendingInvoiceSource ───────────────────────────────────────

/// Supplies the invoices a billing run should attempt.
#[async_trait]
pub trait PendingInvoiceSource: Send + Sync {
    /// Only `Pending` invoices, grouped by customer, in charge order. Empty map if none.
    async fn fetch_pending_by_customer(&self) -> DomainResult<HashMap<i32, Vec<Invoice>>>;
}

// ── InvoiceStatusPort ──────────────────────────────────────────

/// Persists invoice status transitions made by a billing run.
#[async_trait]
pub trait InvoiceStatusPort: Send + Sync {
    /// Fails with `DomainError::NotFound` if the invoice no longer exists.
    async fn set_status(&self, invoice_id: i32, status: InvoiceStatus) -> DomainResult<()>;
}
