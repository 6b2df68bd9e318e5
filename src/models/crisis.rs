use super::EmergencyContact;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Where the crisis message was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrisisSource {
    Assistant,
    Forum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrisisStatus {
    Notified,
    PartiallyNotified,
    Failed,
}

/// Crisis log entry stored in the `crisisEvents` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: Option<String>,
    pub source: CrisisSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Matched phrase or pattern
    pub trigger: String,
    pub contacts_notified: Vec<EmergencyContact>,
    pub status: CrisisStatus,
    pub timestamp: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrisisEventResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub source: CrisisSource,
    pub group_id: Option<String>,
    pub trigger: String,
    pub contacts_notified: Vec<EmergencyContact>,
    pub status: CrisisStatus,
    pub timestamp: String,
}

impl From<CrisisEvent> for CrisisEventResponse {
    fn from(e: CrisisEvent) -> Self {
        CrisisEventResponse {
            id: e.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: e.user_id,
            source: e.source,
            group_id: e.group_id,
            trigger: e.trigger,
            contacts_notified: e.contacts_notified,
            status: e.status,
            timestamp: e.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// Outcome label stored with every assistant exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Normal,
    Crisis,
    Inappropriate,
}

/// Assistant exchange stored in the `chatHistory` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: Option<String>,
    pub message: String,
    pub reply: String,
    pub status: ChatStatus,
    pub timestamp: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    pub id: String,
    pub message: String,
    pub reply: String,
    pub status: ChatStatus,
    pub timestamp: String,
}

impl From<ChatHistoryEntry> for ChatHistoryResponse {
    fn from(e: ChatHistoryEntry) -> Self {
        ChatHistoryResponse {
            id: e.id.map(|id| id.to_hex()).unwrap_or_default(),
            message: e.message,
            reply: e.reply,
            status: e.status,
            timestamp: e.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}
