use actix_web::{web, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    models::UserProfile,
    services::auth_service::{self, AuthResponse, Claims, LoginRequest, SignupRequest, SignupResponse},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = SignupResponse),
        (status = 400, description = "Missing fields or email already registered")
    )
)]
pub async fn signup(
    db: web::Data<MongoDB>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /api/auth/signup - email: {}", email);

    match auth_service::signup(&db, &request).await {
        Ok(response) => Ok(HttpResponse::Created().json(response)),
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /api/auth/login - email: {}", email);

    match auth_service::login(&db, &config.jwt, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /api/auth/me - user: {}", claims.sub);

    let profile = auth_service::get_current_user(&db, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(profile))
}
