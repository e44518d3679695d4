// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the relay loop monitors. Commits already
//! drained are allowed to finish before the process exits.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commit::CommitReport;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
            let _ = ctrl_c.await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Waits up to `timeout` for in-flight commits to finish. Commits still
/// running when the timeout expires are aborted and logged.
pub async fn drain_commits(in_flight: &mut JoinSet<CommitReport>, timeout: Duration) {
    if in_flight.is_empty() {
        info!("no commits in flight");
        return;
    }

    info!(count = in_flight.len(), "waiting for in-flight commits");

    let drained = tokio::time::timeout(timeout, async {
        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "commit task failed");
            }
        }
    })
    .await;

    if drained.is_ok() {
        info!("all commits finished");
    } else {
        warn!(
            remaining = in_flight.len(),
            "timeout reached, aborting unfinished commits"
        );
        in_flight.abort_all();
    }
}
