//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::customer::CustomerRepository;
use super::invoice::InvoiceRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let invoice = repos.invoices().find_by_id(1).await?;
///     let customer = repos.customers().find_by_id(invoice.customer_id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn invoices(&self) -> &dyn InvoiceRepository;
    fn customers(&self) -> &dyn CustomerRepository;
}
