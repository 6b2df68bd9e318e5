use crate::{
    database::{MongoDB, USERS},
    models::{EmergencyContact, Preferences, PrivacySettings, UpdateProfileRequest, User, UserProfile},
    services::auth_service::is_duplicate_key,
    utils::AppError,
};
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime, Document};

fn parse_user_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::NotFound("Invalid user ID format".to_string()))
}

fn ensure_owner(id: &str, requester: &str) -> Result<(), AppError> {
    if id != requester {
        return Err(AppError::Forbidden(
            "You can only modify your own profile".to_string(),
        ));
    }
    Ok(())
}

/// `$set` fields for the provided, non-empty profile values.
pub fn build_profile_update(request: &UpdateProfileRequest) -> Document {
    let mut fields = Document::new();
    let entries = [
        ("name", &request.name),
        ("email", &request.email),
        ("profile.bio", &request.bio),
        ("organization", &request.organization),
        ("location", &request.location),
        ("phone", &request.phone),
        ("profileImageUrl", &request.profile_image_url),
    ];

    for (key, value) in entries {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            fields.insert(key, v);
        }
    }
    fields
}

pub fn validate_contacts(contacts: &[EmergencyContact]) -> Result<(), AppError> {
    for (i, contact) in contacts.iter().enumerate() {
        if contact.name.trim().is_empty() || contact.phone.trim().is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Emergency contact {} needs a name and phone",
                i + 1
            )));
        }
    }
    Ok(())
}

async fn find_by_id(db: &MongoDB, oid: ObjectId) -> Result<User, AppError> {
    db.collection::<User>(USERS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn set_fields(db: &MongoDB, id: &str, mut fields: Document) -> Result<UserProfile, AppError> {
    let oid = parse_user_id(id)?;
    fields.insert("updatedAt", BsonDateTime::now());

    let result = db
        .collection::<User>(USERS)
        .update_one(doc! { "_id": oid }, doc! { "$set": fields })
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    find_by_id(db, oid).await.map(UserProfile::from)
}

/// Looks a user up by email when the identifier contains `@`, otherwise by id.
pub async fn get_profile(db: &MongoDB, identifier: &str) -> Result<UserProfile, AppError> {
    let user = if identifier.contains('@') {
        db.collection::<User>(USERS)
            .find_one(doc! { "email": identifier })
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
    } else {
        find_by_id(db, parse_user_id(identifier)?).await?
    };

    Ok(UserProfile::from(user))
}

pub async fn update_profile(
    db: &MongoDB,
    id: &str,
    requester: &str,
    request: &UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    ensure_owner(id, requester)?;
    let fields = build_profile_update(request);

    if let Ok(email) = fields.get_str("email") {
        let oid = parse_user_id(id)?;
        let taken = db
            .collection::<User>(USERS)
            .find_one(doc! { "email": email, "_id": { "$ne": oid } })
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
    }

    if fields.is_empty() {
        return find_by_id(db, parse_user_id(id)?).await.map(UserProfile::from);
    }

    log::info!("👤 Updating profile {} ({} fields)", id, fields.len());
    set_fields(db, id, fields).await
}

pub async fn get_emergency_contacts(
    db: &MongoDB,
    id: &str,
    requester: &str,
) -> Result<Vec<EmergencyContact>, AppError> {
    ensure_owner(id, requester)?;
    Ok(find_by_id(db, parse_user_id(id)?).await?.emergency_contacts)
}

pub async fn update_emergency_contacts(
    db: &MongoDB,
    id: &str,
    requester: &str,
    contacts: &[EmergencyContact],
) -> Result<UserProfile, AppError> {
    ensure_owner(id, requester)?;
    validate_contacts(contacts)?;

    let value = to_bson(contacts).map_err(|e| AppError::Internal(e.to_string()))?;
    log::info!("🆘 Replacing {} emergency contacts for {}", contacts.len(), id);
    set_fields(db, id, doc! { "emergencyContacts": value }).await
}

pub async fn update_preferences(
    db: &MongoDB,
    id: &str,
    requester: &str,
    preferences: &Preferences,
) -> Result<UserProfile, AppError> {
    ensure_owner(id, requester)?;
    let value = to_bson(preferences).map_err(|e| AppError::Internal(e.to_string()))?;
    set_fields(db, id, doc! { "preferences": value }).await
}

pub async fn update_privacy_settings(
    db: &MongoDB,
    id: &str,
    requester: &str,
    settings: &PrivacySettings,
) -> Result<UserProfile, AppError> {
    ensure_owner(id, requester)?;
    let value = to_bson(settings).map_err(|e| AppError::Internal(e.to_string()))?;
    set_fields(db, id, doc! { "privacySettings": value }).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_skips_missing_and_blank_fields() {
        let request = UpdateProfileRequest {
            name: Some("Ana Maria".into()),
            bio: Some("Runner".into()),
            phone: Some("   ".into()),
            ..Default::default()
        };
        let fields = build_profile_update(&request);

        assert_eq!(fields.get_str("name").unwrap(), "Ana Maria");
        assert_eq!(fields.get_str("profile.bio").unwrap(), "Runner");
        assert!(!fields.contains_key("phone"));
        assert!(!fields.contains_key("email"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_only_owner_may_modify() {
        assert!(ensure_owner("abc", "abc").is_ok());
        assert!(matches!(ensure_owner("abc", "xyz"), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_contacts_need_name_and_phone() {
        let ok = vec![EmergencyContact {
            name: "Mom".into(),
            phone: "+15550001".into(),
            relationship: Some("mother".into()),
        }];
        assert!(validate_contacts(&ok).is_ok());

        let bad = vec![EmergencyContact {
            name: "Dad".into(),
            phone: " ".into(),
            relationship: None,
        }];
        assert!(matches!(validate_contacts(&bad), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        match parse_user_id("not-an-id") {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Invalid user ID format"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
