use crate::{database::MongoDB, services::mood_service};
use tokio::time::{interval, Duration};

const PRUNE_EVERY: Duration = Duration::from_secs(6 * 3600);

/// Periodically deletes mood entries older than `retention_days`. 0 disables the job.
pub fn start_mood_retention_job(db: MongoDB, retention_days: i64) {
    if retention_days <= 0 {
        log::info!("🧹 Mood retention disabled (MOOD_HISTORY_DAYS={})", retention_days);
        return;
    }

    log::info!("🧹 Starting mood retention job (keeps {} days, runs every 6h)", retention_days);

    tokio::spawn(async move {
        // First tick fires immediately.
        let mut ticker = interval(PRUNE_EVERY);

        loop {
            ticker.tick().await;

            match mood_service::prune_older_than(&db, retention_days).await {
                Ok(0) => log::debug!("🧹 Mood retention: nothing to prune"),
                Ok(count) => log::info!("🧹 Mood retention: pruned {} entries older than {} days", count, retention_days),
                Err(e) => log::error!("❌ Mood retention run failed: {}", e),
            }
        }
    });
}
