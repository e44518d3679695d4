// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keepsake serve` command implementation.
//!
//! Connects the Telegram transport, wires the Drive backend when it is
//! configured, starts the digest scheduler and health endpoint, and runs
//! the relay loop until a shutdown signal arrives.

use std::sync::Arc;

use keepsake_config::KeepsakeConfig;
use keepsake_core::{KeepsakeError, PluginAdapter, TransportAdapter};
use keepsake_cron::DigestScheduler;
use keepsake_relay::{RelayComponents, RelayLoop, StorageTarget, SystemClock, recording, shutdown};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, error, info, warn};

#[cfg(feature = "telegram")]
use keepsake_telegram::TelegramTransport;

#[cfg(not(feature = "telegram"))]
compile_error!("keepsake requires the 'telegram' feature for its transport");

use crate::health::{self, HealthState};

/// Runs the `keepsake serve` command.
pub async fn run_serve(config: KeepsakeConfig) -> Result<(), KeepsakeError> {
    init_tracing(&config.bot.log_level);
    let prometheus_render = install_metrics_recorder();

    info!(name = config.bot.name.as_str(), "starting keepsake serve");

    let mut telegram = TelegramTransport::new(&config.telegram).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram transport");
        e
    })?;
    telegram.connect().await?;
    let telegram = Arc::new(telegram);
    let transport: Arc<dyn TransportAdapter + Send + Sync> = telegram.clone();

    let mut adapters: Vec<Arc<dyn PluginAdapter + Send + Sync>> = vec![telegram];
    let storage = build_storage(&config).map(|storage| {
        adapters.push(storage.adapter);
        storage.target
    });

    let components =
        RelayComponents::assemble(&config, transport.clone(), storage, Arc::new(SystemClock));

    let cancel = shutdown::install_signal_handler();

    if config.health.enabled {
        let host = config.health.host.clone();
        let port = config.health.port;
        let health_cancel = cancel.clone();
        let state = HealthState {
            adapters,
            prometheus_render,
        };
        tokio::spawn(async move {
            if let Err(e) = health::serve(&host, port, state, health_cancel).await {
                error!(error = %e, "health endpoint stopped");
            }
        });
    } else {
        debug!("health endpoint disabled by configuration");
    }

    if config.digest.enabled {
        match &components.digest {
            Some(job) => {
                let scheduler = DigestScheduler::new(
                    &config.digest.schedule,
                    job.clone(),
                    components.store.clone(),
                    config.digest.topics.clone(),
                )
                .map_err(|e| KeepsakeError::Config(e.to_string()))?;
                info!(
                    schedule = config.digest.schedule.as_str(),
                    topics = config.digest.topics.len(),
                    "daily digest enabled"
                );
                tokio::spawn(scheduler.run(cancel.clone()));
            }
            None => warn!("daily digest enabled but storage is not configured, skipping"),
        }
    } else {
        info!("daily digest disabled");
    }

    let mut relay = RelayLoop::new(transport, components.dispatcher.clone());
    relay.run(cancel.clone()).await?;

    // Stop background tasks when the transport closed on its own.
    cancel.cancel();
    info!("keepsake serve shutdown complete");
    Ok(())
}

/// Installs the global Prometheus recorder and returns its render function.
///
/// Only one recorder can exist per process; a failure leaves the counters as
/// no-ops and `/metrics` answering 404.
fn install_metrics_recorder() -> Option<Arc<dyn Fn() -> String + Send + Sync>> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            recording::register_metrics();
            info!("prometheus metrics recorder installed");
            Some(Arc::new(move || handle.render()))
        }
        Err(e) => {
            warn!(error = %e, "failed to install Prometheus recorder, metrics disabled");
            None
        }
    }
}

/// Configured storage: the relay's view and the adapter view polled by `/ready`.
#[cfg_attr(not(feature = "drive"), allow(dead_code))]
pub(crate) struct Storage {
    pub target: StorageTarget,
    pub adapter: Arc<dyn PluginAdapter + Send + Sync>,
}

/// Builds the Drive backend, or `None` when credentials are missing.
#[cfg(feature = "drive")]
pub(crate) fn build_storage(config: &KeepsakeConfig) -> Option<Storage> {
    match keepsake_drive::GoogleDrive::new(config) {
        Ok(drive) => {
            let root = drive.root().clone();
            let drive = Arc::new(drive);
            Some(Storage {
                target: StorageTarget {
                    backend: drive.clone(),
                    root,
                },
                adapter: drive,
            })
        }
        Err(e) => {
            warn!(error = %e, "Google Drive backend unavailable");
            None
        }
    }
}

#[cfg(not(feature = "drive"))]
pub(crate) fn build_storage(_config: &KeepsakeConfig) -> Option<Storage> {
    warn!("built without the 'drive' feature, storage is not configured");
    None
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `bot.log_level`.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keepsake={log_level},warn")));

    // A second init (tests, repeated commands) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
