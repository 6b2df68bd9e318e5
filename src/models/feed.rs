use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Content item stored in the `feeds` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    pub category: String,
    pub duration: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub url: String,
    pub created_at: BsonDateTime,
}

pub fn default_author() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub duration: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: String,
    pub created_at: String,
}

impl From<FeedItem> for FeedItemResponse {
    fn from(f: FeedItem) -> Self {
        FeedItemResponse {
            id: f.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: f.title,
            author: f.author,
            category: f.category,
            duration: f.duration,
            description: f.description,
            image: f.image,
            url: f.url,
            created_at: f.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreateFeedRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
}

/// Curated meditation served from the static catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct Meditation {
    pub title: &'static str,
    pub duration: &'static str,
    pub category: &'static str,
    pub author: &'static str,
    pub image: &'static str,
    pub description: &'static str,
    pub url: &'static str,
}
