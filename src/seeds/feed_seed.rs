use crate::database::{MongoDB, FEEDS};
use crate::models::FeedItem;
use crate::services::feed_service::MEDITATIONS;
use mongodb::bson::{doc, Document};

/// Fills an empty feed with the curated meditations.
pub async fn seed_feed(db: &MongoDB) {
    let count = db
        .collection::<Document>(FEEDS)
        .count_documents(doc! {})
        .await
        .unwrap_or(0);

    if count > 0 {
        log::info!("📰 Feed: {} items already in DB, skipping seed", count);
        return;
    }

    let items: Vec<FeedItem> = MEDITATIONS.iter().map(FeedItem::from).collect();
    match db.collection::<FeedItem>(FEEDS).insert_many(&items).await {
        Ok(result) => log::info!("   ✅ Inserted {} meditations into the feed", result.inserted_ids.len()),
        Err(e) => log::error!("   ❌ Failed to seed feed: {}", e),
    }
}
