//! Billing Scheduler
//!
//! Triggers a billing run on a fixed interval. Runs never overlap: a tick
//! that fires while a run is still in flight is skipped and logged.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::BillingService;
use crate::domain::BillingProcessingResults;
use crate::shared::shutdown::ShutdownSignal;

pub struct BillingScheduler {
    billing: Arc<BillingService>,
    interval: Duration,
    run_guard: Mutex<()>,
    last_results: RwLock<Option<BillingProcessingResults>>,
}

impl BillingScheduler {
    pub fn new(billing: Arc<BillingService>, interval: Duration) -> Self {
        Self {
            billing,
            interval,
            run_guard: Mutex::new(()),
            last_results: RwLock::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the scheduler background task.
    ///
    /// Each tick runs on its own task so a slow run does not stall the
    /// ticker; the run guard decides whether the tick actually bills. On
    /// shutdown the loop stops ticking and waits for in-flight runs.
    pub fn start(self: &Arc<Self>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        let scheduler = self.clone();

        tokio::spawn(async move {
            info!(
                interval_secs = scheduler.interval.as_secs_f64(),
                "Billing scheduler started"
            );

            let mut ticker = tokio::time::interval(scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut runs = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let scheduler = scheduler.clone();
                        runs.spawn(async move {
                            scheduler.trigger().await;
                        });
                    }
                    _ = shutdown.wait() => {
                        info!("Billing scheduler shutting down");
                        break;
                    }
                }

                while let Some(finished) = runs.try_join_next() {
                    if let Err(e) = finished {
                        warn!(error = %e, "Billing run task failed");
                    }
                }
            }

            while let Some(finished) = runs.join_next().await {
                if let Err(e) = finished {
                    warn!(error = %e, "Billing run task failed");
                }
            }

            info!("Billing scheduler stopped");
        })
    }

    /// Run billing now unless a run is already in flight.
    ///
    /// Returns `None` when the trigger was skipped.
    pub async fn trigger(&self) -> Option<BillingProcessingResults> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            metrics::counter!("billing_runs_skipped_total").increment(1);
            warn!("Billing run still in progress, skipping trigger");
            return None;
        };

        let results = self.billing.charge_invoices().await;

        for (customer_id, result) in results.results_by_customer() {
            debug!(
                run_id = %results.run_id,
                customer_id,
                total = result.total(),
                successful = result.successful(),
                failed = result.failed(),
                "Customer billing result"
            );
        }
        info!(
            run_id = %results.run_id,
            customers = results.len(),
            successful = results.total_successful(),
            failed = results.total_failed(),
            duration_ms = results.duration_ms(),
            "Billing run completed"
        );

        *self.last_results.write().await = Some(results.clone());
        Some(results)
    }

    pub fn is_running(&self) -> bool {
        self.run_guard.try_lock().is_err()
    }

    /// Results of the most recent completed run
    pub async fn last_results(&self) -> Option<BillingProcessingResults> {
        self.last_results.read().await.clone()
    }
}
