use crate::{
    api::metrics,
    config::TwilioSettings,
    models::{CrisisEvent, CrisisSource, CrisisStatus, EmergencyContact},
    services::crisis_detection_service::{HarmAssessment, HarmDetector},
    services::safety_store::SafetyStore,
    utils::AppError,
};
use async_trait::async_trait;
use mongodb::bson::DateTime as BsonDateTime;
use std::sync::Arc;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub fn emergency_message(user_id: &str) -> String {
    format!(
        "Urgent: User {} may be in danger. Please check on them immediately.",
        user_id
    )
}

/// Outbound text-message channel.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<(), AppError>;
}

/// Writes messages to the log instead of sending them.
pub struct LogSmsGateway;

#[async_trait]
impl SmsGateway for LogSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<(), AppError> {
        log::warn!("📱 SMS to {}: {}", phone, message);
        Ok(())
    }
}

pub struct TwilioSmsGateway {
    client: reqwest::Client,
    settings: TwilioSettings,
}

impl TwilioSmsGateway {
    pub fn new(settings: TwilioSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl SmsGateway for TwilioSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE,
            urlencoding::encode(&self.settings.account_sid)
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .form(&[
                ("To", phone),
                ("From", self.settings.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::External(format!("Twilio API error: {}", response.status())));
        }

        log::info!("📱 SMS sent to {}", phone);
        Ok(())
    }
}

/// Picks the gateway for the current configuration.
pub fn gateway_from_settings(settings: Option<&TwilioSettings>) -> Arc<dyn SmsGateway> {
    match settings {
        Some(twilio) => {
            log::info!("📱 Twilio SMS gateway enabled");
            Arc::new(TwilioSmsGateway::new(twilio.clone()))
        }
        None => {
            log::info!("📱 Twilio not configured, emergency SMS will be logged only");
            Arc::new(LogSmsGateway)
        }
    }
}

/// Harm screening plus escalation to emergency contacts.
pub struct SafetyService {
    detector: HarmDetector,
    store: Arc<dyn SafetyStore>,
    sms: Arc<dyn SmsGateway>,
    default_contacts: Vec<EmergencyContact>,
}

impl SafetyService {
    pub fn new(
        detector: HarmDetector,
        store: Arc<dyn SafetyStore>,
        sms: Arc<dyn SmsGateway>,
        default_contacts: Vec<EmergencyContact>,
    ) -> Self {
        Self {
            detector,
            store,
            sms,
            default_contacts,
        }
    }

    pub fn assess(&self, text: &str) -> HarmAssessment {
        self.detector.assess(text)
    }

    pub fn store(&self) -> &Arc<dyn SafetyStore> {
        &self.store
    }

    /// The user's contacts, or the configured defaults when there are none.
    pub async fn contacts_for(&self, user_id: &str) -> Vec<EmergencyContact> {
        match self.store.emergency_contacts(user_id).await {
            Ok(contacts) if !contacts.is_empty() => contacts,
            Ok(_) => self.default_contacts.clone(),
            Err(e) => {
                log::error!("❌ Error getting emergency contacts for {}: {}", user_id, e);
                self.default_contacts.clone()
            }
        }
    }

    /// Notifies emergency contacts and records the crisis event.
    /// Without a user id nobody can be named in the alert, so only the event is recorded.
    pub async fn escalate(
        &self,
        user_id: Option<&str>,
        source: CrisisSource,
        group_id: Option<&str>,
        trigger: &str,
    ) -> CrisisEvent {
        metrics::increment_crisis_events();

        let mut notified = Vec::new();
        let mut attempted = 0usize;

        match user_id {
            Some(uid) => {
                let message = emergency_message(uid);
                for contact in self.contacts_for(uid).await {
                    attempted += 1;
                    match self.sms.send(&contact.phone, &message).await {
                        Ok(()) => notified.push(contact),
                        Err(e) => log::error!("❌ Failed to notify {}: {}", contact.phone, e),
                    }
                }
            }
            None => log::warn!("🚨 Crisis detected for anonymous sender, no contacts to notify"),
        }

        let status = notification_status(attempted, notified.len());
        log::warn!(
            "🚨 Crisis event ({:?}) user={} trigger=\"{}\" notified {}/{}",
            source,
            user_id.unwrap_or("anonymous"),
            trigger,
            notified.len(),
            attempted
        );

        let event = CrisisEvent {
            id: None,
            user_id: user_id.map(str::to_string),
            source,
            group_id: group_id.map(str::to_string),
            trigger: trigger.to_string(),
            contacts_notified: notified,
            status,
            timestamp: BsonDateTime::now(),
        };

        if let Err(e) = self.store.record_crisis_event(&event).await {
            log::error!("❌ Error logging crisis event: {}", e);
        }

        event
    }
}

fn notification_status(attempted: usize, delivered: usize) -> CrisisStatus {
    if attempted > 0 && delivered == attempted {
        CrisisStatus::Notified
    } else if delivered > 0 {
        CrisisStatus::PartiallyNotified
    } else {
        CrisisStatus::Failed
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every message; numbers in `failing` are refused.
    #[derive(Default)]
    pub struct RecordingSmsGateway {
        pub sent: Mutex<Vec<(String, String)>>,
        pub failing: Vec<String>,
    }

    #[async_trait]
    impl SmsGateway for RecordingSmsGateway {
        async fn send(&self, phone: &str, message: &str) -> Result<(), AppError> {
            if self.failing.iter().any(|p| p == phone) {
                return Err(AppError::External("carrier rejected".into()));
            }
            self.sent.lock().await.push((phone.to_string(), message.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSmsGateway;
    use super::*;
    use crate::services::crisis_detection_service::CrisisDetector;
    use crate::services::safety_store::memory::MemorySafetyStore;
    use crate::services::toxicity_service::LexiconClassifier;

    fn contact(name: &str, phone: &str) -> EmergencyContact {
        EmergencyContact {
            name: name.to_string(),
            phone: phone.to_string(),
            relationship: None,
        }
    }

    fn service(store: MemorySafetyStore, sms: Arc<RecordingSmsGateway>) -> (SafetyService, Arc<MemorySafetyStore>) {
        let store = Arc::new(store);
        let detector = HarmDetector::new(CrisisDetector::default(), Arc::new(LexiconClassifier::default()));
        let service = SafetyService::new(
            detector,
            store.clone(),
            sms,
            vec![contact("Contact 1", "+1234567890"), contact("Contact 2", "+0987654321")],
        );
        (service, store)
    }

    #[test]
    fn test_emergency_message_text() {
        assert_eq!(
            emergency_message("abc123"),
            "Urgent: User abc123 may be in danger. Please check on them immediately."
        );
    }

    #[test]
    fn test_notification_status() {
        assert_eq!(notification_status(2, 2), CrisisStatus::Notified);
        assert_eq!(notification_status(2, 1), CrisisStatus::PartiallyNotified);
        assert_eq!(notification_status(2, 0), CrisisStatus::Failed);
        assert_eq!(notification_status(0, 0), CrisisStatus::Failed);
    }

    #[tokio::test]
    async fn test_escalation_uses_user_contacts() {
        let mut store = MemorySafetyStore::default();
        store.contacts.insert("u1".into(), vec![contact("Mom", "+15550001")]);
        let sms = Arc::new(RecordingSmsGateway::default());
        let (service, store) = service(store, sms.clone());

        let event = service
            .escalate(Some("u1"), CrisisSource::Assistant, None, "want to die")
            .await;

        assert_eq!(event.status, CrisisStatus::Notified);
        assert_eq!(event.contacts_notified, vec![contact("Mom", "+15550001")]);

        let sent = sms.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, emergency_message("u1"));
        assert_eq!(store.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_escalation_falls_back_to_default_contacts() {
        let sms = Arc::new(RecordingSmsGateway {
            failing: vec!["+0987654321".into()],
            ..Default::default()
        });
        let (service, _) = service(MemorySafetyStore::default(), sms.clone());

        let event = service
            .escalate(Some("unknown"), CrisisSource::Forum, Some("g1"), "end it all")
            .await;

        assert_eq!(event.status, CrisisStatus::PartiallyNotified);
        assert_eq!(event.group_id.as_deref(), Some("g1"));
        assert_eq!(sms.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_escalation_records_without_sms() {
        let sms = Arc::new(RecordingSmsGateway::default());
        let (service, store) = service(MemorySafetyStore::default(), sms.clone());

        let event = service.escalate(None, CrisisSource::Assistant, None, "suicide").await;

        assert_eq!(event.status, CrisisStatus::Failed);
        assert!(sms.sent.lock().await.is_empty());
        assert_eq!(store.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_fatal() {
        let store = MemorySafetyStore {
            fail_writes: true,
            ..Default::default()
        };
        let sms = Arc::new(RecordingSmsGateway::default());
        let (service, _) = service(store, sms.clone());

        let event = service
            .escalate(Some("u2"), CrisisSource::Assistant, None, "kill myself")
            .await;

        assert_eq!(event.status, CrisisStatus::Notified);
        assert_eq!(sms.sent.lock().await.len(), 2);
    }
}
