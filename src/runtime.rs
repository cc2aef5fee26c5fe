//! Reusable billing runtime.
//!
//! [`RuntimeHandle`] wires storage, the payment provider stack, the services
//! and the scheduler together, and owns graceful shutdown. The CLI binary
//! and the integration tests both start the system through it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::services::{
    BillingScheduler, BillingService, CustomerService, InvoiceService,
};
use crate::config::AppConfig;
use crate::domain::{BillingProcessingResults, DomainResult, RepositoryProvider};
use crate::infrastructure::{
    setup_initial_data, InMemoryStorage, RetryingPaymentProvider, SimulatedPaymentProvider,
};
use crate::shared::retry::RetryConfig;
use crate::shared::shutdown::{trigger_on_os_signal, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the billing runtime.
pub struct RuntimeOptions {
    pub config: AppConfig,
    /// Populate storage with random customers and invoices (default: true).
    pub seed_demo_data: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            seed_demo_data: true,
        }
    }
}

// ── RuntimeHandle ──────────────────────────────────────────────────

/// Handle to a wired billing system.
///
/// ```rust,no_run
/// use invoice_billing::runtime::{RuntimeHandle, RuntimeOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut handle = RuntimeHandle::build(RuntimeOptions::default()).await?;
///     handle.start_scheduler();
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct RuntimeHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub invoices: Arc<InvoiceService>,
    pub customers: Arc<CustomerService>,
    pub billing: Arc<BillingService>,
    pub scheduler: Arc<BillingScheduler>,
    pub config: AppConfig,

    shutdown: ShutdownSignal,
    scheduler_task: Option<JoinHandle<()>>,
}

impl RuntimeHandle {
    /// Wire every component without starting the scheduler loop.
    pub async fn build(opts: RuntimeOptions) -> DomainResult<Self> {
        let config = opts.config;

        info!("Starting invoice billing runtime...");

        let storage = Arc::new(InMemoryStorage::new());
        if opts.seed_demo_data {
            setup_initial_data(storage.as_ref(), &config.simulator).await?;
        }
        let repos: Arc<dyn RepositoryProvider> = storage;

        let shutdown = ShutdownSignal::new();

        let simulated = Arc::new(SimulatedPaymentProvider::new(
            repos.clone(),
            &config.simulator,
        ));
        let provider = Arc::new(
            RetryingPaymentProvider::new(simulated)
                .with_config(RetryConfig::from(&config.billing.retry)),
        );

        let invoices = Arc::new(InvoiceService::new(repos.clone()));
        let customers = Arc::new(CustomerService::new(repos.clone()));
        let billing = Arc::new(
            BillingService::new(provider, invoices.clone())
                .with_max_concurrent_customers(config.billing.max_concurrent_customers)
                .with_shutdown(shutdown.clone()),
        );
        let scheduler = Arc::new(BillingScheduler::new(
            billing.clone(),
            config.billing.schedule_interval(),
        ));

        Ok(Self {
            repos,
            invoices,
            customers,
            billing,
            scheduler,
            config,
            shutdown,
            scheduler_task: None,
        })
    }

    /// Wire everything and start the scheduler loop.
    pub async fn start(opts: RuntimeOptions) -> DomainResult<Self> {
        let mut handle = Self::build(opts).await?;
        handle.start_scheduler();
        Ok(handle)
    }

    /// Start the scheduler loop. Calling it twice is a no-op.
    pub fn start_scheduler(&mut self) {
        if self.scheduler_task.is_none() {
            self.scheduler_task = Some(self.scheduler.start(self.shutdown.clone()));
        }
    }

    /// Run a single billing pass now, respecting the overlap guard.
    pub async fn run_once(&self) -> Option<BillingProcessingResults> {
        self.scheduler.trigger().await
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        tokio::spawn(trigger_on_os_signal(self.shutdown.clone()));
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the scheduler, including any in-flight run, to stop.
    pub async fn wait(self) {
        if let Some(task) = self.scheduler_task {
            info!("Waiting for billing scheduler to finish...");
            if let Err(e) = task.await {
                error!(error = %e, "Billing scheduler task panicked");
            }
        }
        info!("Invoice billing runtime stopped");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down invoice billing runtime...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        self.scheduler_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup. `RUST_LOG` takes precedence over
/// `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
