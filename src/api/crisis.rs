use actix_web::{web, HttpResponse};

use crate::{
    models::CrisisEventResponse,
    services::{auth_service::Claims, SafetyService},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/crisis-events/{user_id}",
    tag = "Crisis",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Crisis events, newest first", body = [CrisisEventResponse]),
        (status = 403, description = "Events of another user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_crisis_events(
    safety: web::Data<SafetyService>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    log::info!("🚨 GET /api/crisis-events/{}", user_id);

    if claims.sub != user_id {
        log::warn!("❌ User {} asked for crisis events of {}", claims.sub, user_id);
        return Err(AppError::Forbidden("You can only view your own crisis events".to_string()));
    }

    let events: Vec<CrisisEventResponse> = safety
        .store()
        .crisis_events(&user_id)
        .await?
        .into_iter()
        .map(CrisisEventResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(events))
}
