//! Customer domain entity

use serde::{Deserialize, Serialize};

use crate::domain::invoice::Currency;

/// Billed customer. Invoices are expected in the account currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub currency: Currency,
}
