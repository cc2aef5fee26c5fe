//! Invoice billing CLI
//!
//! Runs the billing scheduler against in-memory demo data with a simulated
//! payment provider.
//!
//! ```sh
//! # Run with default config (~/.config/invoice-billing/config.toml)
//! billing-cli
//!
//! # Custom config path and a faster schedule
//! billing-cli --config /etc/invoice-billing/config.toml --interval-secs 2
//!
//! # Single run, results printed as JSON
//! billing-cli --once
//!
//! # Validate config without starting
//! billing-cli --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use invoice_billing::config::AppConfig;
use invoice_billing::runtime::{init_tracing, RuntimeHandle, RuntimeOptions};

/// Charges pending invoices on a fixed schedule.
#[derive(Parser, Debug)]
#[command(
    name = "billing-cli",
    version,
    about = "Scheduled invoice charging",
    long_about = "Charges pending invoices through a payment provider on a fixed \
                  schedule and logs per-customer results.\n\n\
                  Default config: ~/.config/invoice-billing/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BILLING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the seconds between billing runs.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Run billing once, print the results as JSON and exit.
    #[arg(long)]
    once: bool,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Start with empty storage instead of random demo data.
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(invoice_billing::default_config_path);

    let loaded = AppConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => AppConfig::default(),
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(secs) = cli.interval_secs {
        config.billing.schedule_interval_secs = secs;
    }

    if cli.check {
        if let Err(e) = loaded {
            eprintln!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        if let Err(e) = config.validate() {
            eprintln!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        println!("Configuration is valid");
        println!("   Config file     : {}", config_path.display());
        println!("   Interval        : {}s", config.billing.schedule_interval_secs);
        println!("   Concurrency     : {}", config.billing.max_concurrent_customers);
        println!("   Retry attempts  : {}", config.billing.retry.max_attempts);
        println!("   Log level       : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    match loaded {
        Ok(_) => info!(path = %config_path.display(), "Configuration loaded"),
        Err(e) => {
            error!(path = %config_path.display(), error = %e, "Failed to load config, using defaults");
        }
    }
    config.validate()?;

    let mut handle = RuntimeHandle::build(RuntimeOptions {
        config,
        seed_demo_data: !cli.no_seed,
    })
    .await?;

    if cli.once {
        if let Some(results) = handle.run_once().await {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        return Ok(());
    }

    handle.start_scheduler();
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
