use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_MEMBERS: u32 = 10;
pub const DEFAULT_SENDER: &str = "You";
pub const ADMIN_SENDER: &str = "Admin";

/// Forum group stored in the `chatGroups` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatGroup {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_members")]
    pub max_members: u32,
    #[serde(default)]
    pub members_list: Vec<String>,
    pub created_at: BsonDateTime,
}

fn default_max_members() -> u32 {
    DEFAULT_MAX_MEMBERS
}

impl ChatGroup {
    pub fn new(name: String, description: String) -> Self {
        Self {
            id: None,
            name,
            description,
            max_members: DEFAULT_MAX_MEMBERS,
            members_list: Vec::new(),
            created_at: BsonDateTime::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.members_list.len() >= self.max_members as usize
    }

    pub fn has_member(&self, username: &str) -> bool {
        self.members_list.iter().any(|m| m == username)
    }

    /// "current/max", the format the client renders.
    pub fn members_label(&self) -> String {
        format!("{}/{}", self.members_list.len(), self.max_members)
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatGroupResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub members: String,
    pub max_members: u32,
    pub members_list: Vec<String>,
    pub created_at: String,
}

impl From<ChatGroup> for ChatGroupResponse {
    fn from(group: ChatGroup) -> Self {
        ChatGroupResponse {
            id: group.id.map(|id| id.to_hex()).unwrap_or_default(),
            members: group.members_label(),
            name: group.name,
            description: group.description,
            max_members: group.max_members,
            members_list: group.members_list,
            created_at: group.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// Forum post stored in the `forumMessages` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub group_id: String,
    pub message: String,
    pub sender: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_me: bool,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: BsonDateTime,
}

impl ForumMessage {
    pub fn welcome(group_id: String, group_name: &str) -> Self {
        Self {
            id: None,
            group_id,
            message: format!(
                "Welcome to {}! This is a safe space to chat and connect with others.",
                group_name
            ),
            sender: ADMIN_SENDER.to_string(),
            is_anonymous: false,
            is_me: false,
            flagged: false,
            moderation_note: None,
            user_id: None,
            timestamp: BsonDateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForumMessageResponse {
    pub id: String,
    pub group_id: String,
    pub message: String,
    pub sender: String,
    pub is_anonymous: bool,
    pub is_me: bool,
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_note: Option<String>,
    pub timestamp: String,
}

impl From<ForumMessage> for ForumMessageResponse {
    fn from(m: ForumMessage) -> Self {
        ForumMessageResponse {
            id: m.id.map(|id| id.to_hex()).unwrap_or_default(),
            group_id: m.group_id,
            message: m.message,
            sender: m.sender,
            is_anonymous: m.is_anonymous,
            is_me: m.is_me,
            flagged: m.flagged,
            moderation_note: m.moderation_note,
            timestamp: m.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MembershipRequest {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub message: Option<String>,
    pub sender: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_label_and_capacity() {
        let mut group = ChatGroup::new("Mind Haven".into(), String::new());
        assert_eq!(group.members_label(), "0/10");
        assert!(!group.is_full());

        group.members_list = (0..10).map(|i| format!("user{}", i)).collect();
        assert!(group.is_full());
        assert!(group.has_member("user3"));
        assert_eq!(group.members_label(), "10/10");
    }

    #[test]
    fn test_group_without_max_members_defaults_to_ten() {
        let raw = mongodb::bson::doc! {
            "name": "Legacy",
            "createdAt": BsonDateTime::now(),
        };
        let group: ChatGroup = mongodb::bson::from_document(raw).unwrap();
        assert_eq!(group.max_members, DEFAULT_MAX_MEMBERS);
    }
}
