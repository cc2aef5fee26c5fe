//! Demo data for local runs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::SimulatorConfig;
use crate::domain::{Currency, DomainResult, InvoiceStatus, Money, RepositoryProvider};

/// Creates `seed_customers` customers, each with `invoices_per_customer`
/// invoices. The last invoice of every customer is pending, the rest are paid.
pub async fn setup_initial_data(
    repos: &dyn RepositoryProvider,
    config: &SimulatorConfig,
) -> DomainResult<()> {
    let mut rng = StdRng::from_entropy();
    let mut pending = 0usize;

    for _ in 0..config.seed_customers {
        let currency = *Currency::ALL
            .choose(&mut rng)
            .unwrap_or(&Currency::Eur);
        let customer = repos.customers().create(currency).await?;

        for n in 0..config.invoices_per_customer {
            let status = if n + 1 == config.invoices_per_customer {
                pending += 1;
                InvoiceStatus::Pending
            } else {
                InvoiceStatus::Paid
            };
            // 10.00 ..= 500.99
            let cents: i64 = rng.gen_range(1_000..=50_099);
            let amount = Money::new(Decimal::new(cents, 2), customer.currency);

            repos.invoices().create(customer.id, amount, status).await?;
        }
    }

    info!(
        customers = config.seed_customers,
        invoices_per_customer = config.invoices_per_customer,
        pending,
        "Seeded demo customers and invoices"
    );

    Ok(())
}
