//! In-memory storage implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{
    Currency, Customer, CustomerRepository, DomainError, DomainResult, Invoice,
    InvoiceRepository, InvoiceStatus, Money, RepositoryProvider,
};

/// In-memory storage for development and testing
pub struct InMemoryStorage {
    customers: DashMap<i32, Customer>,
    invoices: DashMap<i32, Invoice>,
    customer_counter: AtomicI32,
    invoice_counter: AtomicI32,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            invoices: DashMap::new(),
            customer_counter: AtomicI32::new(1),
            invoice_counter: AtomicI32::new(1),
        }
    }

    /// Insert an invoice with a caller-chosen id. Replaces any invoice with the same id.
    pub fn insert_invoice(&self, invoice: Invoice) {
        self.invoice_counter
            .fetch_max(invoice.id + 1, Ordering::SeqCst);
        self.invoices.insert(invoice.id, invoice);
    }

    /// Insert a customer with a caller-chosen id. Replaces any customer with the same id.
    pub fn insert_customer(&self, customer: Customer) {
        self.customer_counter
            .fetch_max(customer.id + 1, Ordering::SeqCst);
        self.customers.insert(customer.id, customer);
    }

    pub fn remove_invoice(&self, id: i32) -> Option<Invoice> {
        self.invoices.remove(&id).map(|(_, invoice)| invoice)
    }

    pub fn invoice_status(&self, id: i32) -> Option<InvoiceStatus> {
        self.invoices.get(&id).map(|invoice| invoice.status)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryStorage {
    fn invoices(&self) -> &dyn InvoiceRepository {
        self
    }

    fn customers(&self) -> &dyn CustomerRepository {
        self
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Invoice>> {
        Ok(self.invoices.get(&id).map(|invoice| invoice.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.invoices.iter().map(|e| e.value().clone()).collect();
        invoices.sort_by_key(|invoice| invoice.id);
        Ok(invoices)
    }

    async fn find_by_status_grouped_by_customer(
        &self,
        statuses: &[InvoiceStatus],
    ) -> DomainResult<HashMap<i32, Vec<Invoice>>> {
        let mut grouped: HashMap<i32, Vec<Invoice>> = HashMap::new();
        for entry in self.invoices.iter() {
            if statuses.contains(&entry.status) {
                grouped
                    .entry(entry.customer_id)
                    .or_default()
                    .push(entry.value().clone());
            }
        }

        for invoices in grouped.values_mut() {
            invoices.sort_by_key(|invoice| invoice.id);
        }

        Ok(grouped)
    }

    async fn create(
        &self,
        customer_id: i32,
        amount: Money,
        status: InvoiceStatus,
    ) -> DomainResult<Invoice> {
        if !self.customers.contains_key(&customer_id) {
            return Err(DomainError::customer_not_found(customer_id));
        }

        let id = self.invoice_counter.fetch_add(1, Ordering::SeqCst);
        let invoice = Invoice {
            id,
            customer_id,
            amount,
            status,
        };
        self.invoices.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn update_status(&self, id: i32, status: InvoiceStatus) -> DomainResult<()> {
        if let Some(mut invoice) = self.invoices.get_mut(&id) {
            invoice.status = status;
            Ok(())
        } else {
            Err(DomainError::invoice_not_found(id))
        }
    }

    async fn update(
        &self,
        id: i32,
        amount: Money,
        status: InvoiceStatus,
    ) -> DomainResult<Option<Invoice>> {
        match self.invoices.get_mut(&id) {
            Some(mut invoice) if invoice.status != InvoiceStatus::Paid => {
                invoice.amount = amount;
                invoice.status = status;
                Ok(Some(invoice.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        Ok(self.customers.get(&id).map(|customer| customer.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Customer>> {
        let mut customers: Vec<Customer> =
            self.customers.iter().map(|e| e.value().clone()).collect();
        customers.sort_by_key(|customer| customer.id);
        Ok(customers)
    }

    async fn create(&self, currency: Currency) -> DomainResult<Customer> {
        let id = self.customer_counter.fetch_add(1, Ordering::SeqCst);
        let customer = Customer { id, currency };
        self.customers.insert(id, customer.clone());
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn eur(value: i64) -> Money {
        Money::new(Decimal::from(value), Currency::Eur)
    }

    #[tokio::test]
    async fn groups_pending_invoices_by_customer_in_id_order() {
        let storage = InMemoryStorage::new();
        let alice = CustomerRepository::create(&storage, Currency::Eur).await.unwrap();
        let bob = CustomerRepository::create(&storage, Currency::Eur).await.unwrap();

        let a2 = InvoiceRepository::create(&storage, alice.id, eur(10), InvoiceStatus::Pending)
            .await
            .unwrap();
        let b1 = InvoiceRepository::create(&storage, bob.id, eur(20), InvoiceStatus::Pending)
            .await
            .unwrap();
        InvoiceRepository::create(&storage, bob.id, eur(30), InvoiceStatus::Paid)
            .await
            .unwrap();
        let a3 = InvoiceRepository::create(&storage, alice.id, eur(40), InvoiceStatus::Pending)
            .await
            .unwrap();

        let grouped = storage
            .find_by_status_grouped_by_customer(&[InvoiceStatus::Pending])
            .await
            .unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&alice.id], vec![a2, a3]);
        assert_eq!(grouped[&bob.id], vec![b1]);
    }

    #[tokio::test]
    async fn update_status_of_missing_invoice_is_not_found() {
        let storage = InMemoryStorage::new();
        let err = storage
            .update_status(404, InvoiceStatus::Paid)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn paid_invoices_cannot_be_edited() {
        let storage = InMemoryStorage::new();
        let customer = CustomerRepository::create(&storage, Currency::Eur).await.unwrap();
        let paid = InvoiceRepository::create(&storage, customer.id, eur(10), InvoiceStatus::Paid)
            .await
            .unwrap();
        let pending =
            InvoiceRepository::create(&storage, customer.id, eur(10), InvoiceStatus::Pending)
                .await
                .unwrap();

        let edited = storage
            .update(paid.id, eur(99), InvoiceStatus::Pending)
            .await
            .unwrap();
        assert!(edited.is_none());

        let edited = storage
            .update(pending.id, eur(99), InvoiceStatus::Pending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.amount, eur(99));
    }

    #[tokio::test]
    async fn invoices_require_existing_customer() {
        let storage = InMemoryStorage::new();
        let err = InvoiceRepository::create(&storage, 9, eur(10), InvoiceStatus::Pending)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn inserted_ids_advance_counters() {
        let storage = InMemoryStorage::new();
        storage.insert_invoice(Invoice {
            id: 41,
            customer_id: 1,
            amount: eur(1),
            status: InvoiceStatus::Pending,
        });
        assert_eq!(storage.invoice_counter.load(Ordering::SeqCst), 42);
        assert_eq!(storage.invoice_status(41), Some(InvoiceStatus::Pending));
        assert!(storage.remove_invoice(41).is_some());
        assert_eq!(storage.invoice_status(41), None);
    }
}
