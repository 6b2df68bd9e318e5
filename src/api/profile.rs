use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{EmergencyContactsRequest, Preferences, PrivacySettings, UpdateProfileRequest, UserProfile},
    services::{auth_service::Claims, profile_service},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/profile/{identifier}",
    tag = "Profile",
    params(("identifier" = String, Path, description = "User id or email")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found or malformed id")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let identifier = path.into_inner();
    log::info!("👤 GET /api/profile/{}", identifier);

    let profile = profile_service::get_profile(&db, &identifier).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}",
    tag = "Profile",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Email already registered"),
        (status = 403, description = "Not the profile owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("✏️  PUT /api/profile/{}", id);

    let profile = profile_service::update_profile(&db, &id, &claims.sub, &request).await?;
    log::info!("✅ Profile {} updated", id);
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/profile/{id}/emergency-contacts",
    tag = "Profile",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Emergency contacts", body = EmergencyContactsRequest),
        (status = 403, description = "Not the profile owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_emergency_contacts(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🆘 GET /api/profile/{}/emergency-contacts", id);

    let contacts = profile_service::get_emergency_contacts(&db, &id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "emergencyContacts": contacts })))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}/emergency-contacts",
    tag = "Profile",
    params(("id" = String, Path, description = "User id")),
    request_body = EmergencyContactsRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Contact without name or phone"),
        (status = 403, description = "Not the profile owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_emergency_contacts(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<EmergencyContactsRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🆘 PUT /api/profile/{}/emergency-contacts ({} contacts)", id, request.emergency_contacts.len());

    let profile =
        profile_service::update_emergency_contacts(&db, &id, &claims.sub, &request.emergency_contacts).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}/preferences",
    tag = "Profile",
    params(("id" = String, Path, description = "User id")),
    request_body = Preferences,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Not the profile owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_preferences(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<Preferences>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("⚙️  PUT /api/profile/{}/preferences", id);

    let profile = profile_service::update_preferences(&db, &id, &claims.sub, &request).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}/privacy-settings",
    tag = "Profile",
    params(("id" = String, Path, description = "User id")),
    request_body = PrivacySettings,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Not the profile owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_privacy_settings(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<PrivacySettings>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🔏 PUT /api/profile/{}/privacy-settings", id);

    let profile = profile_service::update_privacy_settings(&db, &id, &claims.sub, &request).await?;
    Ok(HttpResponse::Ok().json(profile))
}
