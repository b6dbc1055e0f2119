//! `eccmon-agent` -- memory ECC health monitor daemon.
//!
//! Polls the EDAC correctable/uncorrectable error counters of one memory
//! controller, publishes the ECC object's properties and raises SEL records
//! when errors appear or the logging limit is reached.
//!
//! See [`eccmon_agent::config::AgentConfig::from_env`] for the environment
//! variables understood by the daemon.

use std::sync::Arc;
use std::time::Duration;

use eccmon_agent::config::AgentConfig;
use eccmon_agent::monitor::MonitorService;
use eccmon_agent::properties::{self, WatchPublisher};
use eccmon_agent::scheduler;
use eccmon_events::queue::DEFAULT_CAPACITY;
use eccmon_events::{EventQueue, SelJournal};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long background consumers get to drain after the loop stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eccmon_agent=info,eccmon_events=info,eccmon_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        sysfs_root = %config.sysfs_root.display(),
        max_log_file = %config.max_log_file.display(),
        mode = %config.reporting_mode,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting eccmon-agent",
    );

    // --- Event sink ---
    let (event_queue, event_rx) = EventQueue::channel(DEFAULT_CAPACITY);
    let journal_handle = tokio::spawn(SelJournal::new(config.sel_journal.clone()).run(event_rx));

    // --- Property endpoint ---
    let publisher = Arc::new(WatchPublisher::new());
    let properties_handle = tokio::spawn(properties::log_changes(publisher.subscribe()));

    // --- Monitor ---
    let mut service = MonitorService::new(&config, Arc::new(event_queue), publisher.clone());
    service.startup().await;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    let result = scheduler::run(&mut service, config.poll_interval, cancel).await;

    // Dropping every sender closes the channels and lets consumers exit.
    drop(service);
    drop(publisher);
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, journal_handle).await;
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, properties_handle).await;

    if let Err(e) = result {
        tracing::error!(error = %e, "ECC polling loop failed");
        std::process::exit(1);
    }
    tracing::info!("eccmon-agent stopped");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), stopping");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping");
        }
    }
}
