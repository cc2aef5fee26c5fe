//! Invoice repository interface

use std::collections::HashMap;

use async_trait::async_trait;

use super::model::{Invoice, InvoiceStatus, Money};
use crate::domain::DomainResult;

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Invoice>>;
    async fn find_all(&self) -> DomainResult<Vec<Invoice>>;
    /// Invoices in any of `statuses`, grouped by customer, each group ordered by invoice id.
    async fn find_by_status_grouped_by_customer(
        &self,
        statuses: &[InvoiceStatus],
    ) -> DomainResult<HashMap<i32, Vec<Invoice>>>;
    async fn create(
        &self,
        customer_id: i32,
        amount: Money,
        status: InvoiceStatus,
    ) -> DomainResult<Invoice>;
    /// Fails with `NotFound` when the invoice does not exist.
    async fn update_status(&self, id: i32, status: InvoiceStatus) -> DomainResult<()>;
    /// Edits amount and status of a non-paid invoice. `None` when missing or already paid.
    async fn update(
        &self,
        id: i32,
        amount: Money,
        status: InvoiceStatus,
    ) -> DomainResult<Option<Invoice>>;
}
