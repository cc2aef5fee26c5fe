use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn invoice_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "Invoice",
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn customer_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "Customer",
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure kinds a payment provider may signal for a single charge.
///
/// A decline is not an error: providers report it as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The provider could not be reached or the call did not complete.
    #[error("Network error while contacting the payment provider")]
    Network,

    #[error("Invoice {invoice_id} currency does not match the account currency of customer {customer_id}")]
    CurrencyMismatch { invoice_id: i32, customer_id: i32 },

    #[error("Customer {customer_id} is unknown to the payment provider")]
    CustomerNotFound { customer_id: i32 },

    #[error("Unexpected payment provider error: {0}")]
    Unexpected(String),
}

impl PaymentError {
    /// Whether the charge may succeed if issued again.
    pub fn is_transient(&self) -> bool {
        matches!(self, PaymentError::Network)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
