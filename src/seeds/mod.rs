pub mod chat_groups_seed;
pub mod feed_seed;

use crate::database::MongoDB;

/// Startup seeding; failures are logged and never stop the server.
pub async fn run_all(db: &MongoDB) {
    if let Err(e) = chat_groups_seed::seed_default_groups(db).await {
        log::error!("❌ Failed to seed chat groups: {}", e);
    }
    feed_seed::seed_feed(db).await;
}
