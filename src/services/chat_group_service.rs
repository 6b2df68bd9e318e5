use crate::{
    api::metrics,
    database::{MongoDB, CHAT_GROUPS, FORUM_MESSAGES},
    models::{ChatGroup, CrisisSource, ForumMessage, PostMessageRequest, DEFAULT_SENDER},
    services::crisis_detection_service::HarmAssessment,
    services::emergency_service::SafetyService,
    services::toxicity_service::{censor_toxic_words, contains_toxic_word},
    utils::AppError,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};

pub const MODERATION_NOTE: &str =
    "⚠️ This message contains concerning content. A moderator has been notified.";
pub const CONCERN_WARNING: &str =
    "Your message contains concerning content. Resources are available if you need help.";
pub const INAPPROPRIATE_POST: &str =
    "Your message contains inappropriate content and cannot be posted.";

/// A stored forum post plus the warning shown to its author, if any.
#[derive(Debug)]
pub struct PostOutcome {
    pub message: ForumMessage,
    pub warning: Option<String>,
}

fn parse_group_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::NotFound("Group not found".to_string()))
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidRequest(message.to_string()))
}

/// Matches the group only while `username` can still join it.
pub fn join_filter(oid: ObjectId, username: &str) -> Document {
    doc! {
        "_id": oid,
        "membersList": { "$ne": username },
        "$expr": {
            "$lt": [
                { "$size": { "$ifNull": ["$membersList", []] } },
                { "$ifNull": ["$maxMembers", crate::models::DEFAULT_MAX_MEMBERS as i64] },
            ]
        },
    }
}

/// Why a conditional join matched nothing, judged from the current group state.
pub fn join_rejection(group: &ChatGroup, username: &str) -> AppError {
    if group.has_member(username) {
        AppError::InvalidRequest("User is already a member of this group".to_string())
    } else if group.is_full() {
        AppError::InvalidRequest(format!(
            "This group is full! Max {} members.",
            group.max_members
        ))
    } else {
        AppError::Conflict("Group membership changed, please try again".to_string())
    }
}

pub async fn list_groups(db: &MongoDB) -> Result<Vec<ChatGroup>, AppError> {
    let cursor = db
        .collection::<ChatGroup>(CHAT_GROUPS)
        .find(doc! {})
        .sort(doc! { "createdAt": 1 })
        .await?;
    Ok(cursor.try_collect().await?)
}

pub async fn get_group(db: &MongoDB, id: &str) -> Result<ChatGroup, AppError> {
    let oid = parse_group_id(id)?;
    db.collection::<ChatGroup>(CHAT_GROUPS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
}

/// Inserts the group and its Admin welcome message.
pub async fn insert_group(db: &MongoDB, mut group: ChatGroup) -> Result<ChatGroup, AppError> {
    let result = db
        .collection::<ChatGroup>(CHAT_GROUPS)
        .insert_one(&group)
        .await?;
    let oid = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Internal("Inserted group has no ObjectId".to_string()))?;
    group.id = Some(oid);

    db.collection::<ForumMessage>(FORUM_MESSAGES)
        .insert_one(ForumMessage::welcome(oid.to_hex(), &group.name))
        .await?;

    Ok(group)
}

pub async fn create_group(
    db: &MongoDB,
    name: &Option<String>,
    description: Option<String>,
) -> Result<ChatGroup, AppError> {
    let name = required(name, "Group name is required")?;
    let group = insert_group(db, ChatGroup::new(name.to_string(), description.unwrap_or_default())).await?;

    log::info!("👥 Chat group created: {}", group.name);
    Ok(group)
}

pub async fn join_group(db: &MongoDB, id: &str, username: &Option<String>) -> Result<ChatGroup, AppError> {
    let username = required(username, "Username is required")?;
    let oid = parse_group_id(id)?;

    let result = db
        .collection::<ChatGroup>(CHAT_GROUPS)
        .update_one(join_filter(oid, username), doc! { "$addToSet": { "membersList": username } })
        .await?;

    let group = get_group(db, id).await?;
    if result.matched_count == 0 {
        return Err(join_rejection(&group, username));
    }

    log::info!("➕ {} joined {} ({})", username, group.name, group.members_label());
    Ok(group)
}

pub async fn leave_group(db: &MongoDB, id: &str, username: &Option<String>) -> Result<ChatGroup, AppError> {
    let username = required(username, "Username is required")?;
    let oid = parse_group_id(id)?;

    let result = db
        .collection::<ChatGroup>(CHAT_GROUPS)
        .update_one(
            doc! { "_id": oid, "membersList": username },
            doc! { "$pull": { "membersList": username } },
        )
        .await?;

    let group = get_group(db, id).await?;
    if result.matched_count == 0 {
        return Err(AppError::InvalidRequest(
            "User is not a member of this group".to_string(),
        ));
    }

    log::info!("➖ {} left {} ({})", username, group.name, group.members_label());
    Ok(group)
}

pub async fn list_messages(db: &MongoDB, id: &str) -> Result<Vec<ForumMessage>, AppError> {
    let group = get_group(db, id).await?;
    let group_id = group.id.map(|oid| oid.to_hex()).unwrap_or_else(|| id.to_string());

    let cursor = db
        .collection::<ForumMessage>(FORUM_MESSAGES)
        .find(doc! { "groupId": &group_id })
        .sort(doc! { "timestamp": 1 })
        .await?;
    Ok(cursor.try_collect().await?)
}

/// Screens the post: suicidal content is stored flagged and escalated,
/// toxic content is rejected, anything else is stored as-is.
pub async fn post_message(
    db: &MongoDB,
    safety: &SafetyService,
    id: &str,
    request: PostMessageRequest,
) -> Result<PostOutcome, AppError> {
    let text = required(&request.message, "Message is required")?.to_string();
    let group = get_group(db, id).await?;
    let group_id = group.id.map(|oid| oid.to_hex()).unwrap_or_else(|| id.to_string());

    let sender = request
        .sender
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SENDER.to_string());
    let user_id = request.user_id.filter(|u| !u.trim().is_empty());

    let mut message = ForumMessage {
        id: None,
        group_id,
        message: text,
        is_me: sender == DEFAULT_SENDER,
        sender,
        is_anonymous: request.is_anonymous,
        flagged: false,
        moderation_note: None,
        user_id,
        timestamp: BsonDateTime::now(),
    };

    let warning = screen_post(safety, &mut message, &group.name).await?;

    let inserted = db
        .collection::<ForumMessage>(FORUM_MESSAGES)
        .insert_one(&message)
        .await
        .map(|result| result.inserted_id.as_object_id())
        .map_err(AppError::from);

    let outcome = finish_post(message, warning, inserted)?;
    log::info!("💬 Message posted in group {}", group.name);
    Ok(outcome)
}

/// Runs harm assessment on a post before it is stored.
/// Toxic posts are rejected; suicidal ones are flagged, escalated and get a warning.
pub async fn screen_post(
    safety: &SafetyService,
    message: &mut ForumMessage,
    group_name: &str,
) -> Result<Option<String>, AppError> {
    match safety.assess(&message.message) {
        HarmAssessment::Toxic { category } => {
            log::info!(
                "🚫 Rejected {} post in group {} (word: {}): {}",
                category,
                group_name,
                contains_toxic_word(&message.message).unwrap_or("-"),
                censor_toxic_words(&message.message)
            );
            Err(AppError::InvalidRequest(INAPPROPRIATE_POST.to_string()))
        }
        HarmAssessment::Suicidal(found) => {
            message.flagged = true;
            message.moderation_note = Some(MODERATION_NOTE.to_string());
            metrics::increment_flagged_messages();
            log::warn!("🚩 Flagged post in group {} (matched: {})", group_name, found.trigger());

            safety
                .escalate(
                    message.user_id.as_deref(),
                    CrisisSource::Forum,
                    Some(&message.group_id),
                    found.trigger(),
                )
                .await;
            Ok(Some(CONCERN_WARNING.to_string()))
        }
        HarmAssessment::Safe => Ok(None),
    }
}

/// A flagged post still reaches its author with the warning when storage fails;
/// contacts have already been alerted by then.
pub fn finish_post(
    mut message: ForumMessage,
    warning: Option<String>,
    inserted: Result<Option<ObjectId>, AppError>,
) -> Result<PostOutcome, AppError> {
    match inserted {
        Ok(id) => message.id = id,
        Err(e) if message.flagged => {
            log::error!("❌ Error storing flagged forum message: {}", e);
        }
        Err(e) => return Err(e),
    }
    Ok(PostOutcome { message, warning })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrisisStatus, EmergencyContact};
    use crate::services::crisis_detection_service::{CrisisDetector, HarmDetector};
    use crate::services::emergency_service::testing::RecordingSmsGateway;
    use crate::services::safety_store::memory::MemorySafetyStore;
    use crate::services::toxicity_service::LexiconClassifier;
    use std::sync::Arc;

    fn safety() -> (SafetyService, Arc<MemorySafetyStore>, Arc<RecordingSmsGateway>) {
        let store = Arc::new(MemorySafetyStore::default());
        let sms = Arc::new(RecordingSmsGateway::default());
        let detector = HarmDetector::new(CrisisDetector::default(), Arc::new(LexiconClassifier::default()));
        let service = SafetyService::new(
            detector,
            store.clone(),
            sms.clone(),
            vec![EmergencyContact {
                name: "Contact 1".into(),
                phone: "+1234567890".into(),
                relationship: None,
            }],
        );
        (service, store, sms)
    }

    fn post(text: &str) -> ForumMessage {
        ForumMessage {
            id: None,
            group_id: "65f0c0ffee0000000000beef".into(),
            message: text.into(),
            sender: DEFAULT_SENDER.into(),
            is_anonymous: false,
            is_me: true,
            flagged: false,
            moderation_note: None,
            user_id: Some("u1".into()),
            timestamp: BsonDateTime::now(),
        }
    }

    fn group_with(members: usize, max: u32) -> ChatGroup {
        let mut group = ChatGroup::new("Rise Together".into(), String::new());
        group.max_members = max;
        group.members_list = (0..members).map(|i| format!("user{}", i)).collect();
        group
    }

    #[test]
    fn test_join_filter_guards_capacity_and_duplicates() {
        let oid = ObjectId::new();
        let filter = join_filter(oid, "ana");

        assert_eq!(filter.get_object_id("_id").unwrap(), oid);
        assert_eq!(
            filter.get_document("membersList").unwrap().get_str("$ne").unwrap(),
            "ana"
        );
        assert!(filter.get_document("$expr").unwrap().contains_key("$lt"));
    }

    #[test]
    fn test_join_rejection_reasons() {
        let full = group_with(10, 10);
        match join_rejection(&full, "newcomer") {
            AppError::InvalidRequest(msg) => assert_eq!(msg, "This group is full! Max 10 members."),
            other => panic!("unexpected: {:?}", other),
        }

        let group = group_with(3, 10);
        match join_rejection(&group, "user1") {
            AppError::InvalidRequest(msg) => assert_eq!(msg, "User is already a member of this group"),
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(join_rejection(&group, "someone"), AppError::Conflict(_)));
    }

    #[test]
    fn test_required_fields() {
        assert!(required(&None, "Username is required").is_err());
        assert!(required(&Some("  ".into()), "Username is required").is_err());
        assert_eq!(required(&Some(" ana ".into()), "x").unwrap(), "ana");
    }

    #[tokio::test]
    async fn test_suicidal_post_is_flagged_and_escalated() {
        let (safety, store, sms) = safety();
        let mut message = post("Some days I just want to end it all");

        let warning = screen_post(&safety, &mut message, "Mind Haven").await.unwrap();

        assert_eq!(warning.as_deref(), Some(CONCERN_WARNING));
        assert!(message.flagged);
        assert_eq!(message.moderation_note.as_deref(), Some(MODERATION_NOTE));

        let events = store.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, CrisisSource::Forum);
        assert_eq!(events[0].group_id.as_deref(), Some("65f0c0ffee0000000000beef"));
        assert_eq!(events[0].user_id.as_deref(), Some("u1"));
        assert_eq!(events[0].status, CrisisStatus::Notified);
        assert_eq!(sms.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_toxic_post_is_rejected_without_escalation() {
        let (safety, store, sms) = safety();
        let mut message = post("shut up you idiot");

        match screen_post(&safety, &mut message, "Mind Haven").await {
            Err(AppError::InvalidRequest(msg)) => assert_eq!(msg, INAPPROPRIATE_POST),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!message.flagged);
        assert!(store.events.lock().await.is_empty());
        assert!(sms.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_ordinary_post_passes_untouched() {
        let (safety, store, _) = safety();
        let mut message = post("Had a good walk in the park today");

        assert_eq!(screen_post(&safety, &mut message, "Mind Haven").await.unwrap(), None);
        assert!(!message.flagged);
        assert!(store.events.lock().await.is_empty());
    }

    #[test]
    fn test_flagged_post_survives_storage_failure() {
        let mut message = post("I want to die");
        message.flagged = true;

        let outcome = finish_post(
            message,
            Some(CONCERN_WARNING.to_string()),
            Err(AppError::Database("insert refused".into())),
        )
        .unwrap();

        assert!(outcome.message.flagged);
        assert_eq!(outcome.warning.as_deref(), Some(CONCERN_WARNING));
    }

    #[test]
    fn test_ordinary_storage_failure_propagates() {
        let result = finish_post(post("hi all"), None, Err(AppError::Database("insert refused".into())));
        assert!(matches!(result, Err(AppError::Database(_))));

        let oid = ObjectId::new();
        let outcome = finish_post(post("hi all"), None, Ok(Some(oid))).unwrap();
        assert_eq!(outcome.message.id, Some(oid));
    }

    #[test]
    fn test_invalid_group_id_is_not_found() {
        assert!(matches!(parse_group_id("grp-1"), Err(AppError::NotFound(_))));
    }
}
