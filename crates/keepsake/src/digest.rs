// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keepsake digest` command implementation.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use keepsake_config::KeepsakeConfig;
use keepsake_core::KeepsakeError;
use keepsake_relay::{DigestJob, FolderResolver, SystemClock};
use tracing::info;

use crate::serve::{build_storage, init_tracing};

/// Runs the digest for `topic` on `date` (default: yesterday) once.
pub async fn run_digest(
    config: &KeepsakeConfig,
    topic: &str,
    date: Option<NaiveDate>,
) -> Result<(), KeepsakeError> {
    init_tracing(&config.bot.log_level);

    let date = match date {
        Some(date) => date,
        None => keepsake_cron::previous_date(Local::now().date_naive())
            .ok_or_else(|| KeepsakeError::Internal("no calendar date before today".into()))?,
    };

    let storage = build_storage(config).ok_or_else(|| KeepsakeError::NotConfigured {
        component: "storage backend".into(),
    })?;
    let resolver = Arc::new(FolderResolver::new(
        storage.target.backend,
        storage.target.root,
    ));
    let job = DigestJob::new(resolver, Arc::new(SystemClock));

    let outcome = job.run(topic, date).await?;
    info!(topic, date = %date, batches = outcome.batches.len(), "digest written");
    println!(
        "Digest for {topic} on {date}: {} batch(es), report {}",
        outcome.batches.len(),
        outcome.artifact.display_ref()
    );
    Ok(())
}
