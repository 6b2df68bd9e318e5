use crate::{
    api::metrics,
    models::{ChatHistoryEntry, ChatStatus, CrisisSource},
    services::crisis_detection_service::HarmAssessment,
    services::emergency_service::SafetyService,
    services::gemini_service::ReplyGenerator,
    utils::AppError,
};
use lazy_static::lazy_static;
use mongodb::bson::DateTime as BsonDateTime;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

pub const MIN_MESSAGE_LEN: usize = 5;
pub const HISTORY_LIMIT: i64 = 50;

const COMMON_PHRASES: [&str; 6] = ["hello", "good morning", "how are you", "test", "thanks", "bye"];

pub const ELABORATE_REPLY: &str =
    "I need a bit more information to help you. Could you please elaborate?";
pub const GREETING_REPLY: &str = "Thank you for reaching out! How can I assist you today?";
pub const REFUSAL_REPLY: &str =
    "I'm not able to respond to that type of content. How can I help you with something else?";
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't generate a response. How else can I help you?";
pub const FAILURE_REPLY: &str =
    "Something went wrong with processing your message. Please try again.";

const CRISIS_REPLIES: [&str; 3] = [
    "I notice you're expressing thoughts about harming yourself. Please know that help is available. Would you like me to provide crisis resources?",
    "I'm concerned about what you've shared. If you're feeling suicidal, please talk to someone right away. The National Suicide Prevention Lifeline is available 24/7 at 988 or 1-800-273-8255.",
    "It sounds like you're going through a difficult time. Your life matters, and there are people who want to help. Would you like information about crisis support services?",
];

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CrisisResources {
    pub hotline: String,
    pub text: String,
    pub chat: String,
}

impl Default for CrisisResources {
    fn default() -> Self {
        Self {
            hotline: "988 or 1-800-273-8255".to_string(),
            text: "Text HOME to 741741".to_string(),
            chat: "https://suicidepreventionlifeline.org/chat/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ChatReply {
    pub reply: String,
    pub status: ChatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<CrisisResources>,
}

impl ChatReply {
    fn normal(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            status: ChatStatus::Normal,
            resources: None,
        }
    }
}

pub fn crisis_reply() -> &'static str {
    CRISIS_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CRISIS_REPLIES[0])
}

lazy_static! {
    static ref COMMON_PHRASE: Option<Regex> =
        Regex::new(&format!(r"(?i)\b(?:{})\b", COMMON_PHRASES.join("|"))).ok();
}

/// Whole-word match, so "latest" or "goodbye" are not greetings.
pub fn is_common_phrase(message: &str) -> bool {
    COMMON_PHRASE.as_ref().is_some_and(|p| p.is_match(message))
}

/// Conversation pipeline: screening, escalation, then the language model.
pub struct AssistantService {
    safety: Arc<SafetyService>,
    generator: Arc<dyn ReplyGenerator>,
}

impl AssistantService {
    pub fn new(safety: Arc<SafetyService>, generator: Arc<dyn ReplyGenerator>) -> Self {
        Self { safety, generator }
    }

    pub async fn respond(&self, message: Option<&str>, user_id: Option<&str>) -> Result<ChatReply, AppError> {
        let message = message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("Message is required".to_string()))?;

        metrics::increment_assistant_messages();
        let message = message.trim();

        if message.chars().count() < MIN_MESSAGE_LEN {
            return Ok(ChatReply::normal(ELABORATE_REPLY));
        }

        // Screening runs before the greeting shortcut
        let reply = match self.safety.assess(message) {
            HarmAssessment::Suicidal(found) => {
                log::warn!("🚨 Suicidal content detected, matched: {}", found.trigger());
                self.safety
                    .escalate(user_id, CrisisSource::Assistant, None, found.trigger())
                    .await;
                ChatReply {
                    reply: crisis_reply().to_string(),
                    status: ChatStatus::Crisis,
                    resources: Some(CrisisResources::default()),
                }
            }
            HarmAssessment::Toxic { category } => {
                log::info!("🚫 Inappropriate assistant message ({})", category);
                ChatReply {
                    reply: REFUSAL_REPLY.to_string(),
                    status: ChatStatus::Inappropriate,
                    resources: None,
                }
            }
            HarmAssessment::Safe if is_common_phrase(message) => ChatReply::normal(GREETING_REPLY),
            HarmAssessment::Safe => {
                let text = self.generator.generate(message).await?;
                ChatReply::normal(text.unwrap_or_else(|| FALLBACK_REPLY.to_string()))
            }
        };

        self.store(user_id, message, &reply).await;
        Ok(reply)
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<ChatHistoryEntry>, AppError> {
        self.safety.store().chat_history(user_id, HISTORY_LIMIT).await
    }

    async fn store(&self, user_id: Option<&str>, message: &str, reply: &ChatReply) {
        let entry = ChatHistoryEntry {
            id: None,
            user_id: user_id.map(str::to_string),
            message: message.to_string(),
            reply: reply.reply.clone(),
            status: reply.status,
            timestamp: BsonDateTime::now(),
        };

        if let Err(e) = self.safety.store().record_chat(&entry).await {
            log::error!("❌ Error storing chat message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CrisisStatus;
    use crate::services::crisis_detection_service::{CrisisDetector, HarmDetector};
    use crate::services::emergency_service::testing::RecordingSmsGateway;
    use crate::services::safety_store::memory::MemorySafetyStore;
    use crate::services::toxicity_service::LexiconClassifier;
    use async_trait::async_trait;

    struct FixedGenerator(Result<Option<String>, ()>);

    #[async_trait]
    impl ReplyGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<Option<String>, AppError> {
            self.0
                .clone()
                .map_err(|_| AppError::External("model unavailable".into()))
        }
    }

    struct Fixture {
        assistant: AssistantService,
        store: Arc<MemorySafetyStore>,
        sms: Arc<RecordingSmsGateway>,
    }

    fn fixture(generated: Result<Option<String>, ()>) -> Fixture {
        let store = Arc::new(MemorySafetyStore::default());
        let sms = Arc::new(RecordingSmsGateway::default());
        let detector = HarmDetector::new(CrisisDetector::default(), Arc::new(LexiconClassifier::default()));
        let safety = Arc::new(SafetyService::new(
            detector,
            store.clone(),
            sms.clone(),
            vec![crate::models::EmergencyContact {
                name: "Contact 1".into(),
                phone: "+1234567890".into(),
                relationship: None,
            }],
        ));
        Fixture {
            assistant: AssistantService::new(safety, Arc::new(FixedGenerator(generated))),
            store,
            sms,
        }
    }

    #[tokio::test]
    async fn test_missing_message_is_rejected() {
        let f = fixture(Ok(None));
        assert!(matches!(f.assistant.respond(None, None).await, Err(AppError::InvalidRequest(_))));
        assert!(matches!(f.assistant.respond(Some(""), None).await, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_short_message_asks_for_detail_and_is_not_stored() {
        let f = fixture(Ok(None));
        let reply = f.assistant.respond(Some("  hey  "), Some("u1")).await.unwrap();
        assert_eq!(reply.reply, ELABORATE_REPLY);
        assert_eq!(reply.status, ChatStatus::Normal);
        assert!(f.store.chats.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_greeting_shortcut() {
        let f = fixture(Ok(Some("model text".into())));
        let reply = f.assistant.respond(Some("Hello there, assistant"), Some("u1")).await.unwrap();
        assert_eq!(reply.reply, GREETING_REPLY);
        assert_eq!(f.store.chats.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_crisis_message_escalates() {
        let f = fixture(Ok(Some("model text".into())));
        let reply = f
            .assistant
            .respond(Some("I don't want to be here anymore"), Some("u1"))
            .await
            .unwrap();

        assert_eq!(reply.status, ChatStatus::Crisis);
        assert!(CRISIS_REPLIES.contains(&reply.reply.as_str()));
        assert_eq!(reply.resources, Some(CrisisResources::default()));

        let events = f.store.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, CrisisStatus::Notified);
        assert_eq!(events[0].source, CrisisSource::Assistant);
        assert_eq!(f.sms.sent.lock().await.len(), 1);
        assert_eq!(f.store.chats.lock().await[0].status, ChatStatus::Crisis);
    }

    #[tokio::test]
    async fn test_toxic_message_is_refused() {
        let f = fixture(Ok(Some("model text".into())));
        let reply = f.assistant.respond(Some("you are a useless idiot"), None).await.unwrap();
        assert_eq!(reply.status, ChatStatus::Inappropriate);
        assert_eq!(reply.reply, REFUSAL_REPLY);
        assert!(f.sms.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_model_reply_and_fallback() {
        let f = fixture(Ok(Some("Breathing slowly can help.".into())));
        let reply = f.assistant.respond(Some("I feel anxious before exams"), None).await.unwrap();
        assert_eq!(reply.reply, "Breathing slowly can help.");

        let f = fixture(Ok(None));
        let reply = f.assistant.respond(Some("I feel anxious before exams"), None).await.unwrap();
        assert_eq!(reply.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let f = fixture(Err(()));
        let result = f.assistant.respond(Some("I feel anxious before exams"), None).await;
        assert!(matches!(result, Err(AppError::External(_))));
        assert!(f.store.chats.lock().await.is_empty());
    }

    #[test]
    fn test_common_phrase_is_case_insensitive() {
        assert!(is_common_phrase("THANKS a lot"));
        assert!(is_common_phrase("ok, bye!"));
        assert!(!is_common_phrase("I feel lonely"));
    }

    #[test]
    fn test_common_phrase_needs_whole_words() {
        assert!(!is_common_phrase("my latest plan"));
        assert!(!is_common_phrase("goodbye everyone"));
    }

    #[tokio::test]
    async fn test_greeting_does_not_hide_crisis() {
        let f = fixture(Ok(Some("model text".into())));
        let reply = f
            .assistant
            .respond(Some("thanks for everything, I want to die"), Some("u1"))
            .await
            .unwrap();

        assert_eq!(reply.status, ChatStatus::Crisis);
        assert_eq!(f.store.events.lock().await.len(), 1);
        assert_eq!(f.sms.sent.lock().await.len(), 1);
    }
}
