// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folder resolver for the `topic/date/message_<id>` hierarchy.
//!
//! Every level is looked up by name under its parent and created when
//! missing. Nothing is cached between calls, so a topic or date that changes
//! between commits always resolves fresh. Within this process, find-or-create
//! for one `parent/name` pair runs one at a time, which keeps two concurrent
//! commits from both creating the same date folder.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use keepsake_core::StorageBackend;
use keepsake_core::error::KeepsakeError;
use keepsake_core::types::{ContainerHandle, CorrelationId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::clock::date_stamp;

/// Async locks keyed by logical path (`parent/name`).
///
/// An entry lives only while someone holds or waits for it.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive use of one path. Dropping it releases the lock and prunes the
/// entry when no other task is waiting on it.
pub struct PathGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    path: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        // Release first so our Arc clone is gone before counting.
        self.guard.take();
        self.locks
            .remove_if(&self.path, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `parent/name`.
    pub async fn lock(&self, parent: &ContainerHandle, name: &str) -> PathGuard<'_> {
        let path = format!("{parent}/{name}");
        let lock = self.locks.entry(path.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        PathGuard {
            locks: &self.locks,
            path,
            guard: Some(guard),
        }
    }

    /// Number of paths currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Finds or creates the containers for a topic, date and batch.
pub struct FolderResolver {
    backend: Arc<dyn StorageBackend + Send + Sync>,
    root: ContainerHandle,
    locks: PathLocks,
}

impl FolderResolver {
    /// Creates a resolver whose topic folders live directly under `root`.
    pub fn new(backend: Arc<dyn StorageBackend + Send + Sync>, root: ContainerHandle) -> Self {
        Self {
            backend,
            root,
            locks: PathLocks::new(),
        }
    }

    /// The storage backend this resolver creates folders in.
    pub fn backend(&self) -> &Arc<dyn StorageBackend + Send + Sync> {
        &self.backend
    }

    pub fn root(&self) -> &ContainerHandle {
        &self.root
    }

    /// Resolves `topic/<date>/message_<correlation>`.
    ///
    /// Fails as a unit if any level fails. Ancestors created before the
    /// failure stay in place and are found again on the next attempt.
    pub async fn resolve(
        &self,
        topic: &str,
        date: NaiveDate,
        correlation: &CorrelationId,
    ) -> Result<ContainerHandle, KeepsakeError> {
        let date_folder = self.resolve_date(topic, date).await?;
        self.find_or_create(&date_folder, &correlation.folder_name())
            .await
    }

    /// Resolves `topic/<date>` only.
    pub async fn resolve_date(
        &self,
        topic: &str,
        date: NaiveDate,
    ) -> Result<ContainerHandle, KeepsakeError> {
        let topic_folder = self.find_or_create(&self.root, topic).await?;
        self.find_or_create(&topic_folder, &date_stamp(date)).await
    }

    async fn find_or_create(
        &self,
        parent: &ContainerHandle,
        name: &str,
    ) -> Result<ContainerHandle, KeepsakeError> {
        let _guard = self.locks.lock(parent, name).await;
        let handle = self.backend.find_or_create_named(parent, name).await?;
        debug!(parent = %parent, folder = name, handle = %handle, "resolved folder");
        Ok(handle)
    }
}
