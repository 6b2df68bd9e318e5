use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE_PICTURE: &str = "https://via.placeholder.com/150";

/// User document stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    pub created_at: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    #[serde(default)]
    pub profile: ProfileDetails,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub privacy_settings: PrivacySettings,
    #[serde(default = "default_profile_picture")]
    pub profile_picture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

fn default_profile_picture() -> String {
    DEFAULT_PROFILE_PICTURE.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProfileDetails {
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub enable_notifications: bool,
    pub anonymous_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enable_notifications: true,
            anonymous_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    pub allow_data_sharing: bool,
    pub enable_encryption: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            allow_data_sharing: true,
            enable_encryption: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: None,
            name,
            email,
            password: password_hash,
            created_at: BsonDateTime::now(),
            updated_at: None,
            emergency_contacts: Vec::new(),
            profile: ProfileDetails::default(),
            preferences: Preferences::default(),
            privacy_settings: PrivacySettings::default(),
            profile_picture: default_profile_picture(),
            organization: None,
            location: None,
            phone: None,
            profile_image_url: None,
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub preferences: Preferences,
    pub privacy_settings: PrivacySettings,
    pub profile_picture: String,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            bio: user.profile.bio,
            emergency_contacts: user.emergency_contacts,
            preferences: user.preferences,
            privacy_settings: user.privacy_settings,
            profile_picture: user.profile_picture,
            organization: user.organization,
            location: user.location,
            phone: user.phone,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at.try_to_rfc3339_string().ok(),
        }
    }
}

/// Short user summary returned by signup/login.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContactsRequest {
    pub emergency_contacts: Vec<EmergencyContact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("Ana".into(), "ana@example.com".into(), "hash".into());
        assert!(user.emergency_contacts.is_empty());
        assert!(user.preferences.enable_notifications);
        assert!(!user.preferences.anonymous_mode);
        assert!(user.privacy_settings.allow_data_sharing);
        assert_eq!(user.profile_picture, DEFAULT_PROFILE_PICTURE);
    }

    #[test]
    fn test_profile_hides_password() {
        let mut user = User::new("Ana".into(), "ana@example.com".into(), "secret-hash".into());
        user.id = Some(ObjectId::new());
        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "ana@example.com");
        assert_eq!(json["privacySettings"]["enableEncryption"], true);
    }

    #[test]
    fn test_user_document_tolerates_missing_optional_sections() {
        let raw = mongodb::bson::doc! {
            "name": "Ben",
            "email": "ben@example.com",
            "password": "hash",
            "createdAt": BsonDateTime::now(),
        };
        let user: User = mongodb::bson::from_document(raw).unwrap();
        assert!(user.emergency_contacts.is_empty());
        assert_eq!(user.profile.bio, "");
        assert!(user.privacy_settings.enable_encryption);
    }
}
