// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay core for Keepsake.
//!
//! The [`RelayLoop`] is the central coordinator that:
//! - Receives events from a transport adapter, one at a time
//! - Buffers forwarded content per conversation until `/save`
//! - Runs commits in the background so uploads never stall other chats
//! - Lets in-flight commits finish on shutdown

pub mod aggregator;
pub mod clock;
pub mod commit;
pub mod digest;
pub mod dispatch;
pub mod document;
pub mod notify;
pub mod recording;
pub mod resolver;
pub mod session;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use keepsake_config::model::KeepsakeConfig;
use keepsake_core::error::KeepsakeError;
use keepsake_core::types::ContainerHandle;
use keepsake_core::{StorageBackend, TransportAdapter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use aggregator::PendingAggregator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use commit::{CommitPipeline, CommitReport, CommitSettings, CommitStatus, CommitTask};
pub use digest::{DigestJob, DigestOutcome};
pub use dispatch::Dispatcher;
pub use resolver::{FolderResolver, PathGuard, PathLocks};
pub use session::{ConversationMode, PendingBatch, SessionStore};

/// How long shutdown waits for in-flight commits.
const COMMIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Storage wired into the relay: a backend and the folder that holds every topic.
pub struct StorageTarget {
    pub backend: Arc<dyn StorageBackend + Send + Sync>,
    pub root: ContainerHandle,
}

/// The relay's shared components, built once from configuration.
pub struct RelayComponents {
    pub store: Arc<SessionStore>,
    pub aggregator: Arc<PendingAggregator>,
    /// `None` when storage is not configured.
    pub pipeline: Option<Arc<CommitPipeline>>,
    /// `None` when storage is not configured.
    pub digest: Option<Arc<DigestJob>>,
    pub dispatcher: Arc<Dispatcher>,
}

impl RelayComponents {
    /// Wires the session store, aggregator, resolver, pipeline and digest job.
    pub fn assemble(
        config: &KeepsakeConfig,
        transport: Arc<dyn TransportAdapter + Send + Sync>,
        storage: Option<StorageTarget>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let aggregator = Arc::new(PendingAggregator::new(
            store.clone(),
            config.relay.max_video_bytes,
        ));

        let (pipeline, digest) = match storage {
            Some(StorageTarget { backend, root }) => {
                let resolver = Arc::new(FolderResolver::new(backend, root));
                let pipeline = Arc::new(CommitPipeline::new(
                    aggregator.clone(),
                    resolver.clone(),
                    transport.clone(),
                    clock.clone(),
                    CommitSettings {
                        rich_documents: config.drive.rich_documents,
                        max_video_bytes: config.relay.max_video_bytes,
                    },
                ));
                let digest = Arc::new(DigestJob::new(resolver, clock));
                (Some(pipeline), Some(digest))
            }
            None => {
                warn!("storage is not configured; saves will be refused");
                (None, None)
            }
        };

        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            aggregator.clone(),
            transport,
            pipeline.clone(),
        ));

        Self {
            store,
            aggregator,
            pipeline,
            digest,
            dispatcher,
        }
    }
}

/// Receives transport events and dispatches them until cancelled.
///
/// Events are handled strictly in arrival order, so reads and writes of one
/// conversation's batch never interleave. Only the upload half of a commit
/// runs concurrently.
pub struct RelayLoop {
    transport: Arc<dyn TransportAdapter + Send + Sync>,
    dispatcher: Arc<Dispatcher>,
    in_flight: JoinSet<CommitReport>,
}

impl RelayLoop {
    pub fn new(
        transport: Arc<dyn TransportAdapter + Send + Sync>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        info!("relay loop initialized");
        Self {
            transport,
            dispatcher,
            in_flight: JoinSet::new(),
        }
    }

    /// Runs until the cancellation token fires or the transport closes, then
    /// waits for in-flight commits.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), KeepsakeError> {
        info!("relay loop running");

        loop {
            tokio::select! {
                event = self.transport.receive() => {
                    match event {
                        Ok(event) => self.handle_event(event).await,
                        Err(e) => {
                            error!(error = %e, "transport receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping relay loop");
                    break;
                }
            }
            self.reap_finished();
        }

        shutdown::drain_commits(&mut self.in_flight, COMMIT_DRAIN_TIMEOUT).await;
        self.transport.shutdown().await?;

        info!("relay loop stopped");
        Ok(())
    }

    async fn handle_event(&mut self, event: keepsake_core::types::InboundEvent) {
        let Some(task) = self.dispatcher.handle(event).await else {
            return;
        };
        let Some(pipeline) = self.dispatcher.pipeline().cloned() else {
            return;
        };
        self.in_flight
            .spawn(async move { pipeline.finish(task).await });
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.in_flight.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "commit task panicked or was cancelled");
            }
        }
    }
}
