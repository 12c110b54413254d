//! Periodic database health probe.

use std::time::Duration;

use planner_core::db::Database;

const PROBE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Spawn the background probe loop. Failures are logged only; the probe
/// itself is the retry.
pub fn spawn(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("database health check started");
        let mut interval = tokio::time::interval(PROBE_INTERVAL);
        loop {
            interval.tick().await;
            match db.check_connection() {
                Ok(()) => tracing::debug!("database connection ok"),
                Err(e) => tracing::error!("database connection lost: {e}"),
            }
        }
    })
}
