use crate::{
    database::{MongoDB, CHAT_HISTORY, CRISIS_EVENTS, USERS},
    models::{ChatHistoryEntry, CrisisEvent, EmergencyContact, User},
    utils::AppError,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};

/// Persistence used by the crisis pipeline.
#[async_trait]
pub trait SafetyStore: Send + Sync {
    /// The user's own emergency contacts; empty when the user is unknown.
    async fn emergency_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>, AppError>;
    async fn record_crisis_event(&self, event: &CrisisEvent) -> Result<(), AppError>;
    async fn record_chat(&self, entry: &ChatHistoryEntry) -> Result<(), AppError>;
    async fn crisis_events(&self, user_id: &str) -> Result<Vec<CrisisEvent>, AppError>;
    async fn chat_history(&self, user_id: &str, limit: i64) -> Result<Vec<ChatHistoryEntry>, AppError>;
}

pub struct MongoSafetyStore {
    db: MongoDB,
}

impl MongoSafetyStore {
    pub fn new(db: MongoDB) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SafetyStore for MongoSafetyStore {
    async fn emergency_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>, AppError> {
        let Ok(oid) = ObjectId::parse_str(user_id) else {
            return Ok(Vec::new());
        };

        let user = self
            .db
            .collection::<User>(USERS)
            .find_one(doc! { "_id": oid })
            .await?;

        Ok(user.map(|u| u.emergency_contacts).unwrap_or_default())
    }

    async fn record_crisis_event(&self, event: &CrisisEvent) -> Result<(), AppError> {
        self.db
            .collection::<CrisisEvent>(CRISIS_EVENTS)
            .insert_one(event)
            .await?;
        Ok(())
    }

    async fn record_chat(&self, entry: &ChatHistoryEntry) -> Result<(), AppError> {
        self.db
            .collection::<ChatHistoryEntry>(CHAT_HISTORY)
            .insert_one(entry)
            .await?;
        Ok(())
    }

    async fn crisis_events(&self, user_id: &str) -> Result<Vec<CrisisEvent>, AppError> {
        let cursor = self
            .db
            .collection::<CrisisEvent>(CRISIS_EVENTS)
            .find(doc! { "userId": user_id })
            .sort(doc! { "timestamp": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn chat_history(&self, user_id: &str, limit: i64) -> Result<Vec<ChatHistoryEntry>, AppError> {
        let cursor = self
            .db
            .collection::<ChatHistoryEntry>(CHAT_HISTORY)
            .find(doc! { "userId": user_id })
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory store for pipeline tests.
    #[derive(Default)]
    pub struct MemorySafetyStore {
        pub contacts: HashMap<String, Vec<EmergencyContact>>,
        pub events: Mutex<Vec<CrisisEvent>>,
        pub chats: Mutex<Vec<ChatHistoryEntry>>,
        pub fail_writes: bool,
    }

    #[async_trait]
    impl SafetyStore for MemorySafetyStore {
        async fn emergency_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>, AppError> {
            Ok(self.contacts.get(user_id).cloned().unwrap_or_default())
        }

        async fn record_crisis_event(&self, event: &CrisisEvent) -> Result<(), AppError> {
            if self.fail_writes {
                return Err(AppError::Database("write refused".into()));
            }
            self.events.lock().await.push(event.clone());
            Ok(())
        }

        async fn record_chat(&self, entry: &ChatHistoryEntry) -> Result<(), AppError> {
            if self.fail_writes {
                return Err(AppError::Database("write refused".into()));
            }
            self.chats.lock().await.push(entry.clone());
            Ok(())
        }

        async fn crisis_events(&self, user_id: &str) -> Result<Vec<CrisisEvent>, AppError> {
            let events = self.events.lock().await;
            Ok(events
                .iter()
                .rev()
                .filter(|e| e.user_id.as_deref() == Some(user_id))
                .cloned()
                .collect())
        }

        async fn chat_history(&self, user_id: &str, limit: i64) -> Result<Vec<ChatHistoryEntry>, AppError> {
            let chats = self.chats.lock().await;
            Ok(chats
                .iter()
                .rev()
                .filter(|e| e.user_id.as_deref() == Some(user_id))
                .take(limit.max(0) as usize)
                .cloned()
                .collect())
        }
    }
}
