use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    models::{CreateTherapistRequest, Therapist, TherapistResponse},
    services::therapist_service,
    utils::AppError,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

fn to_responses(therapists: Vec<Therapist>) -> Vec<TherapistResponse> {
    therapists.into_iter().map(TherapistResponse::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/therapists",
    tag = "Therapists",
    responses((status = 200, description = "All therapists", body = [TherapistResponse]))
)]
pub async fn list_therapists(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🩺 GET /api/therapists");
    let therapists = therapist_service::list_all(&db).await?;
    Ok(HttpResponse::Ok().json(to_responses(therapists)))
}

#[utoipa::path(
    get,
    path = "/api/therapists/popular",
    tag = "Therapists",
    responses((status = 200, description = "Popular therapists, best rated first", body = [TherapistResponse]))
)]
pub async fn list_popular(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("⭐ GET /api/therapists/popular");
    let therapists = therapist_service::list_popular(&db).await?;
    Ok(HttpResponse::Ok().json(to_responses(therapists)))
}

#[utoipa::path(
    get,
    path = "/api/therapists/available",
    tag = "Therapists",
    responses((status = 200, description = "Available therapists, best rated first", body = [TherapistResponse]))
)]
pub async fn list_available(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🟢 GET /api/therapists/available");
    let therapists = therapist_service::list_available(&db).await?;
    Ok(HttpResponse::Ok().json(to_responses(therapists)))
}

#[utoipa::path(
    get,
    path = "/api/therapists/search",
    tag = "Therapists",
    params(("keyword" = String, Query, description = "Matched against name and specialty")),
    responses(
        (status = 200, description = "Matching therapists", body = [TherapistResponse]),
        (status = 400, description = "keyword is required")
    )
)]
pub async fn search_therapists(
    db: web::Data<MongoDB>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔍 GET /api/therapists/search - keyword: {:?}", query.keyword);
    let therapists = therapist_service::search(&db, query.keyword.as_deref()).await?;
    Ok(HttpResponse::Ok().json(to_responses(therapists)))
}

#[utoipa::path(
    get,
    path = "/api/therapists/{id}",
    tag = "Therapists",
    params(("id" = String, Path, description = "Therapist id")),
    responses(
        (status = 200, description = "Therapist", body = TherapistResponse),
        (status = 400, description = "Invalid therapist ID format"),
        (status = 404, description = "Therapist not found")
    )
)]
pub async fn get_therapist(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🩺 GET /api/therapists/{}", id);

    let therapist = therapist_service::get_by_id(&db, &id).await?;
    Ok(HttpResponse::Ok().json(TherapistResponse::from(therapist)))
}

#[utoipa::path(
    post,
    path = "/api/therapists",
    tag = "Therapists",
    request_body = CreateTherapistRequest,
    responses(
        (status = 201, description = "Therapist created", body = TherapistResponse),
        (status = 400, description = "Missing required fields")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_therapist(
    db: web::Data<MongoDB>,
    request: web::Json<CreateTherapistRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /api/therapists - name: {:?}", request.name);

    let therapist = match therapist_service::build_therapist(request.into_inner()) {
        Ok(therapist) => therapist,
        Err(missing) => {
            log::warn!("❌ Therapist rejected, missing: {}", missing.join(", "));
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "Missing required fields",
                "missingFields": missing,
            })));
        }
    };

    let therapist = therapist_service::create(&db, therapist).await?;
    Ok(HttpResponse::Created().json(TherapistResponse::from(therapist)))
}
