//! Invoice service: reads and edits over the invoice repository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{
    DomainError, DomainResult, Invoice, InvoiceStatus, InvoiceStatusPort, Money,
    PendingInvoiceSource, RepositoryProvider,
};

pub struct InvoiceService {
    repos: Arc<dyn RepositoryProvider>,
}

impl InvoiceService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn fetch_all(&self) -> DomainResult<Vec<Invoice>> {
        self.repos.invoices().find_all().await
    }

    pub async fn fetch(&self, id: i32) -> DomainResult<Invoice> {
        self.repos
            .invoices()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::invoice_not_found(id))
    }

    pub async fn fetch_pending_by_customer(&self) -> DomainResult<HashMap<i32, Vec<Invoice>>> {
        self.repos
            .invoices()
            .find_by_status_grouped_by_customer(&[InvoiceStatus::Pending])
            .await
    }

    /// Edit amount and status. Paid invoices are frozen and report `NotFound`.
    pub async fn update_invoice(
        &self,
        id: i32,
        amount: Money,
        status: InvoiceStatus,
    ) -> DomainResult<Invoice> {
        let invoice = self
            .repos
            .invoices()
            .update(id, amount, status)
            .await?
            .ok_or_else(|| DomainError::invoice_not_found(id))?;

        info!(
            invoice_id = id,
            amount = %invoice.amount,
            status = %invoice.status,
            "Invoice updated"
        );
        Ok(invoice)
    }

    pub async fn update_status(&self, id: i32, status: InvoiceStatus) -> DomainResult<()> {
        self.repos.invoices().update_status(id, status).await
    }
}

#[async_trait]
impl PendingInvoiceSource for InvoiceService {
    async fn fetch_pending_by_customer(&self) -> DomainResult<HashMap<i32, Vec<Invoice>>> {
        InvoiceService::fetch_pending_by_customer(self).await
    }
}

#[async_trait]
impl InvoiceStatusPort for InvoiceService {
    async fn set_status(&self, invoice_id: i32, status: InvoiceStatus) -> DomainResult<()> {
        self.update_status(invoice_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::domain::Currency;
    use crate::infrastructure::storage::InMemoryStorage;

    async fn service_with_invoices() -> (InvoiceService, Vec<Invoice>) {
        let storage = Arc::new(InMemoryStorage::new());
        let c1 = storage.customers().create(Currency::Eur).await.unwrap();
        let c2 = storage.customers().create(Currency::Eur).await.unwrap();
        let ten = Money::new(Decimal::TEN, Currency::Eur);

        let mut invoices = Vec::new();
        for (customer, status) in [
            (c1.id, InvoiceStatus::Pending),
            (c1.id, InvoiceStatus::Pending),
            (c2.id, InvoiceStatus::Pending),
            (c2.id, InvoiceStatus::Paid),
        ] {
            invoices.push(
                storage
                    .invoices()
                    .create(customer, ten.clone(), status)
                    .await
                    .unwrap(),
            );
        }

        (InvoiceService::new(storage), invoices)
    }

    #[tokio::test]
    async fn fetch_missing_invoice_is_not_found() {
        let (service, _) = service_with_invoices().await;
        assert!(service.fetch(404).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn pending_invoices_are_grouped_by_customer() {
        let (service, invoices) = service_with_invoices().await;

        let grouped = InvoiceService::fetch_pending_by_customer(&service).await.unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&invoices[0].customer_id], invoices[0..2].to_vec());
        assert_eq!(grouped[&invoices[2].customer_id], vec![invoices[2].clone()]);
    }

    #[tokio::test]
    async fn updating_paid_invoice_is_not_found() {
        let (service, invoices) = service_with_invoices().await;
        let paid = &invoices[3];

        let err = service
            .update_invoice(paid.id, paid.amount.clone(), InvoiceStatus::Pending)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn updating_status_of_missing_invoice_is_not_found() {
        let (service, _) = service_with_invoices().await;
        let err = service
            .set_status(404, InvoiceStatus::Paid)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn set_status_persists() {
        let (service, invoices) = service_with_invoices().await;
        service
            .set_status(invoices[0].id, InvoiceStatus::Invalid)
            .await
            .unwrap();
        assert_eq!(
            service.fetch(invoices[0].id).await.unwrap().status,
            InvoiceStatus::Invalid
        );
    }
}
