use crate::utils::AppError;
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

pub const USERS: &str = "users";
pub const MOODS: &str = "moods";
pub const THERAPISTS: &str = "therapists";
pub const APPOINTMENTS: &str = "appointments";
pub const CHAT_GROUPS: &str = "chatGroups";
pub const FORUM_MESSAGES: &str = "forumMessages";
pub const FEEDS: &str = "feeds";
pub const CHAT_HISTORY: &str = "chatHistory";
pub const CRISIS_EVENTS: &str = "crisisEvents";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(&database_name_from_uri(uri));

        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Creates the indexes the query paths rely on. Failures are logged, not fatal.
    async fn ensure_indexes(&self) {
        log::info!("🔧 Creating database indexes...");

        for (collection, keys, options) in index_specs() {
            let label = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));
            let model = IndexModel::builder().keys(keys).options(options).build();

            match self.collection::<Document>(collection).create_index(model).await {
                Ok(_) => log::info!("   ✅ Index created: {}", label),
                Err(e) => log::debug!("   ℹ️  Index {} not created: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn ping(&self) -> bool {
        match self.db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => true,
            Err(e) => {
                log::error!("❌ Database ping failed: {}", e);
                false
            }
        }
    }

    pub async fn collection_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self.db.list_collection_names().await?)
    }
}

/// Indexes per collection. One mood per user per UTC day is enforced by `moods(userId, day)`.
pub fn index_specs() -> Vec<(&'static str, Document, Option<IndexOptions>)> {
    let unique = IndexOptions::builder().unique(true).build();
    // Entries written before the day key existed are left out of the constraint
    let unique_day = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! { "day": { "$type": "string" } })
        .build();

    vec![
        (USERS, doc! { "email": 1 }, Some(unique)),
        (MOODS, doc! { "userId": 1, "date": -1 }, None),
        (MOODS, doc! { "userId": 1, "day": 1 }, Some(unique_day)),
        (APPOINTMENTS, doc! { "userId": 1, "appointmentTime": 1 }, None),
        (CHAT_GROUPS, doc! { "name": 1 }, None),
        (FORUM_MESSAGES, doc! { "groupId": 1, "timestamp": 1 }, None),
        (CHAT_HISTORY, doc! { "userId": 1, "timestamp": -1 }, None),
        (CRISIS_EVENTS, doc! { "userId": 1, "timestamp": -1 }, None),
        (THERAPISTS, doc! { "isAvailable": 1, "rating": -1 }, None),
    ]
}

/// Database name is the last path segment of the URI, before any query string.
pub fn database_name_from_uri(uri: &str) -> String {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("mindbridge")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/mindbridge_dev"), "mindbridge_dev");
        assert_eq!(
            database_name_from_uri("mongodb+srv://u:p@cluster.example.net/app?retryWrites=true"),
            "app"
        );
        assert_eq!(database_name_from_uri("mongodb://localhost:27017"), "mindbridge");
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/?tls=true"), "mindbridge");
    }

    #[test]
    fn test_mood_day_index_is_unique() {
        let specs = index_specs();
        let (_, _, options) = specs
            .iter()
            .find(|(collection, keys, _)| *collection == MOODS && keys.contains_key("day"))
            .expect("moods day index");

        let options = options.as_ref().unwrap();
        assert_eq!(options.unique, Some(true));
        assert!(options.partial_filter_expression.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/mindbridge_test".to_string());

        let db = MongoDB::new(&uri).await.unwrap();
        assert!(db.ping().await);
    }
}
