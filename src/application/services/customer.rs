use std::sync::Arc;

use crate::domain::{Customer, DomainError, DomainResult, RepositoryProvider};

pub struct CustomerService {
    repos: Arc<dyn RepositoryProvider>,
}

impl CustomerService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn fetch_all(&self) -> DomainResult<Vec<Customer>> {
        self.repos.customers().find_all().await
    }

    pub async fn fetch(&self, id: i32) -> DomainResult<Customer> {
        self.repos
            .customers()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::customer_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use crate::infrastructure::storage::InMemoryStorage;

    #[tokio::test]
    async fn fetch_missing_customer_is_not_found() {
        let service = CustomerService::new(Arc::new(InMemoryStorage::new()));
        let err = service.fetch(404).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: Customer with id=404");
    }

    #[tokio::test]
    async fn fetch_all_lists_customers() {
        let storage = Arc::new(InMemoryStorage::new());
        let created = storage.customers().create(Currency::Sek).await.unwrap();
        let service = CustomerService::new(storage);

        assert_eq!(service.fetch_all().await.unwrap(), vec![created.clone()]);
        assert_eq!(service.fetch(created.id).await.unwrap(), created);
    }
}
