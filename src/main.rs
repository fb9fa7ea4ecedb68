//! Status Dashboard Poller Binary

use clap::Parser;
use status_poller::{render_dashboard, Config, Result, StatusPoller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line overrides, applied on top of the environment
#[derive(Debug, Parser)]
#[command(name = "status_poller", version, about = "Polls a backend and renders its status")]
struct Cli {
    /// Hostname the dashboard is served from
    #[arg(long)]
    hostname: Option<String>,

    /// Explicit API base URL, e.g. http://localhost:5000/api
    #[arg(long)]
    base_url: Option<String>,

    /// Delay between fetch cycles in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// HTTP timeout per request in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Run a single cycle, print the dashboard and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(hostname) = &self.hostname {
            config.hostname = hostname.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(ms) = self.interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(seconds) = self.timeout_secs {
            config.http_timeout = Duration::from_secs(seconds);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    initialize_tracing();

    let cli = Cli::parse();

    info!("Starting status poller v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = Config::from_env();
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Poller configuration - Hostname: {}, API: {}, Interval: {}ms",
        config.hostname,
        config.api_base_url(),
        config.poll_interval.as_millis()
    );

    let poller = Arc::new(StatusPoller::new(config)?);

    if cli.once {
        let result = poller.run_cycle().await;
        println!("{}", render_dashboard(&poller.snapshot()));
        if let Err(e) = result {
            error!("Fetch cycle failed: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut updates = poller.subscribe();
    let handle = Arc::clone(&poller).start()?;
    let mut rendered_cycles = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.completed_cycles != rendered_cycles {
                    rendered_cycles = snapshot.completed_cycles;
                    println!("{}", render_dashboard(&snapshot));
                }
            }
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    error!("Failed to wait for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down status poller");
    handle.dispose().await;
    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
