//! Routes provider progress to the log and metrics.

use crate::models::QueueUpdate;
use crate::services::metrics;
use tokio::sync::mpsc;

/// Drain `updates` until every sender is dropped.
///
/// Returns the number of updates consumed.
pub async fn relay_queue_updates(mut updates: mpsc::UnboundedReceiver<QueueUpdate>) -> usize {
    let mut seen = 0;

    while let Some(update) = updates.recv().await {
        seen += 1;
        metrics::record_queue_update(update.status.as_str());

        tracing::info!(
            status = %update.status,
            queue_position = ?update.queue_position,
            "Status: {}",
            update.status
        );

        for log in &update.logs {
            tracing::info!(
                log_level = log.level.as_deref().unwrap_or("INFO"),
                log_source = log.source.as_deref().unwrap_or("provider"),
                "Log: {}",
                log.message
            );
        }
    }

    seen
}
