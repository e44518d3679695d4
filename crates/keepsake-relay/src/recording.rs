// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder these are no-ops.

use metrics::describe_counter;

/// Register all relay metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "keepsake_items_recorded_total",
        "Items buffered into pending batches"
    );
    describe_counter!("keepsake_commits_total", "Commits attempted");
    describe_counter!(
        "keepsake_upload_failures_total",
        "Batch items that failed to upload"
    );
}

/// Record an item buffered into a pending batch.
pub fn record_item(kind: &'static str) {
    metrics::counter!("keepsake_items_recorded_total", "kind" => kind).increment(1);
}

/// Record a commit and its outcome.
pub fn record_commit(succeeded: usize, failed: usize) {
    metrics::counter!("keepsake_commits_total").increment(1);
    if failed > 0 {
        metrics::counter!("keepsake_upload_failures_total").increment(failed as u64);
    }
    tracing::trace!(succeeded, failed, "commit recorded");
}
