// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven daily digest scheduler.
//!
//! On every tick of the configured schedule (local time) the scheduler runs
//! the digest job for the calendar date before the tick, once per topic. The
//! topics are the configured ones plus every topic a conversation currently
//! has selected.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use keepsake_relay::{DigestJob, SessionStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Scheduler setup errors.
#[derive(Debug, thiserror::Error)]
pub enum CronError {
    #[error("invalid cron expression `{expr}`: {reason}")]
    InvalidSchedule { expr: String, reason: String },
}

/// Outcome of one scheduled run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestRunSummary {
    /// Topics whose report was uploaded.
    pub digested: Vec<String>,
    /// `(topic, error)` for each topic that failed.
    pub failed: Vec<(String, String)>,
}

/// Runs the digest job on a cron schedule.
pub struct DigestScheduler {
    cron: croner::Cron,
    job: Arc<DigestJob>,
    store: Arc<SessionStore>,
    topics: Vec<String>,
}

impl DigestScheduler {
    /// Parses `schedule` (five-field cron) and prepares the scheduler.
    pub fn new(
        schedule: &str,
        job: Arc<DigestJob>,
        store: Arc<SessionStore>,
        topics: Vec<String>,
    ) -> Result<Self, CronError> {
        let cron = croner::Cron::new(schedule)
            .parse()
            .map_err(|e| CronError::InvalidSchedule {
                expr: schedule.to_string(),
                reason: format!("{e}"),
            })?;
        Ok(Self {
            cron,
            job,
            store,
            topics,
        })
    }

    /// Next tick strictly after `after`.
    pub fn next_run_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.cron.find_next_occurrence(after, false).ok()
    }

    /// Configured topics first, then selected topics not already listed.
    pub fn topics_to_digest(&self) -> Vec<String> {
        let mut topics = self.topics.clone();
        for topic in self.store.selected_folders() {
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        topics
    }

    /// Digests every topic for `date`. A failing topic is logged and does
    /// not stop the others.
    pub async fn run_once(&self, date: NaiveDate) -> DigestRunSummary {
        let mut summary = DigestRunSummary::default();
        for topic in self.topics_to_digest() {
            match self.job.run(&topic, date).await {
                Ok(outcome) => {
                    debug!(topic = topic.as_str(), batches = outcome.batches.len(), "topic digested");
                    summary.digested.push(topic);
                }
                Err(e) => {
                    warn!(topic = topic.as_str(), date = %date, error = %e, "digest failed");
                    summary.failed.push((topic, e.to_string()));
                }
            }
        }
        info!(
            date = %date,
            digested = summary.digested.len(),
            failed = summary.failed.len(),
            "daily digest finished"
        );
        summary
    }

    /// Sleeps until each tick and digests the previous date, until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        info!("digest scheduler running");
        loop {
            let now = Local::now();
            let Some(next) = self.next_run_after(&now) else {
                error!("digest schedule has no future occurrence, stopping scheduler");
                return;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, "next digest scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Some(date) = previous_date(next.date_naive()) {
                        self.run_once(date).await;
                    }
                }
                _ = cancel.cancelled() => {
                    info!("digest scheduler stopped");
                    return;
                }
            }
        }
    }
}

/// The calendar date before `date`.
pub fn previous_date(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}
