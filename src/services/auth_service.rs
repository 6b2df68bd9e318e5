use crate::{
    config::JwtSettings,
    database::{MongoDB, USERS},
    models::{User, UserProfile, UserSummary},
    utils::AppError,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (hex)
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    pub success: bool,
    pub msg: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserSummary,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        // findAndModify reports it as a command error
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}

// Generate JWT token
pub fn generate_jwt(user: &UserSummary, settings: &JwtSettings) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(settings.expiry_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: settings.audience.clone(),
        iss: settings.issuer.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, settings: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(settings.issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

// User registration
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<SignupResponse, AppError> {
    let (Some(name), Some(email), Some(password)) = (
        required(&request.name),
        required(&request.email),
        required(&request.password),
    ) else {
        return Err(AppError::InvalidRequest(
            "Please provide name, email and password".to_string(),
        ));
    };

    let collection = db.collection::<User>(USERS);

    if collection.find_one(doc! { "email": email }).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let mut user = User::new(name.to_string(), email.to_string(), password_hash);

    // The unique index catches a concurrent signup with the same email
    let result = collection.insert_one(&user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::from(e)
        }
    })?;
    user.id = result.inserted_id.as_object_id();

    log::info!("✅ User registered successfully: {}", email);

    Ok(SignupResponse {
        success: true,
        msg: "User registered successfully".to_string(),
        user: UserSummary::from(&user),
    })
}

// User login
pub async fn login(
    db: &MongoDB,
    settings: &JwtSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let (Some(email), Some(password)) = (required(&request.email), required(&request.password))
    else {
        return Err(AppError::InvalidRequest(
            "Please provide email and password".to_string(),
        ));
    };

    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "email": email })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let candidate = password.to_string();
    let stored = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || verify(candidate, &stored))
        .await?
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let summary = UserSummary::from(&user);
    let token = generate_jwt(&summary, settings)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: summary,
    })
}

pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserProfile, AppError> {
    let oid = ObjectId::parse_str(user_id)
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

    db.collection::<User>(USERS)
        .find_one(doc! { "_id": oid })
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret".into(),
            issuer: "mindbridge-service".into(),
            audience: "mindbridge-app".into(),
            expiry_hours: 24,
        }
    }

    fn summary() -> UserSummary {
        UserSummary {
            id: ObjectId::new().to_hex(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
        }
    }

    #[test]
    fn test_token_round_trip_carries_identity() {
        let user = summary();
        let token = generate_jwt(&user, &settings()).unwrap();
        let claims = verify_token(&token, &settings()).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret_or_audience() {
        let token = generate_jwt(&summary(), &settings()).unwrap();

        let mut other = settings();
        other.secret = "another-secret".into();
        assert!(matches!(verify_token(&token, &other), Err(AppError::Unauthorized(_))));

        let mut other = settings();
        other.audience = "someone-else".into();
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut expired = settings();
        expired.expiry_hours = -2;
        let token = generate_jwt(&summary(), &expired).unwrap();
        assert!(verify_token(&token, &settings()).is_err());
    }

    #[test]
    fn test_required_treats_blank_as_missing() {
        assert_eq!(required(&Some("  ".into())), None);
        assert_eq!(required(&None), None);
        assert_eq!(required(&Some(" a@b.c ".into())), Some("a@b.c"));
    }

    #[tokio::test]
    async fn test_password_hash_verifies() {
        let hashed = tokio::task::spawn_blocking(|| hash("s3cret", 4)).await.unwrap().unwrap();
        assert!(verify("s3cret", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
