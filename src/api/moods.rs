use actix_web::{web, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    models::{MoodKind, MoodQuery, MoodRequest, MoodResponse, WeeklyMoods},
    services::mood_service,
    utils::AppError,
};

/// Invalid or missing moods get a 400 listing the accepted names.
fn parse_mood(raw: Option<&str>) -> Result<MoodKind, HttpResponse> {
    let Some(raw) = raw.map(str::trim).filter(|m| !m.is_empty()) else {
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "mood is required",
            "validMoods": MoodKind::names(),
        })));
    };

    raw.parse::<MoodKind>().map_err(|e| {
        HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": e,
            "validMoods": MoodKind::names(),
        }))
    })
}

#[utoipa::path(
    get,
    path = "/api/moods/weekly",
    tag = "Moods",
    params(("userId" = String, Query, description = "User id")),
    responses(
        (status = 200, description = "Latest mood value per weekday", body = WeeklyMoods),
        (status = 400, description = "userId is required")
    )
)]
pub async fn get_weekly(
    db: web::Data<MongoDB>,
    query: web::Query<MoodQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = mood_service::require_user_id(query.user_id.as_deref())?;
    log::info!("📊 GET /api/moods/weekly - user: {}", user_id);

    let weekly = mood_service::weekly_moods(&db, user_id).await?;
    Ok(HttpResponse::Ok().json(weekly))
}

#[utoipa::path(
    post,
    path = "/api/moods",
    tag = "Moods",
    request_body = MoodRequest,
    responses(
        (status = 201, description = "Mood stored", body = MoodResponse),
        (status = 200, description = "A mood already exists for today"),
        (status = 400, description = "Missing userId or invalid mood")
    )
)]
pub async fn add_mood(
    db: web::Data<MongoDB>,
    request: web::Json<MoodRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let user_id = mood_service::require_user_id(request.user_id.as_deref())?;
    log::info!("😊 POST /api/moods - user: {}, mood: {:?}", user_id, request.mood);

    let mood = match parse_mood(request.mood.as_deref()) {
        Ok(mood) => mood,
        Err(response) => return Ok(response),
    };

    let (entry, existed) = mood_service::add_mood(&db, user_id, mood, request.notes).await?;
    if existed {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "exists": true,
            "message": "You have already logged a mood today",
            "mood": MoodResponse::from(entry),
        })));
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "exists": false,
        "mood": MoodResponse::from(entry),
    })))
}

#[utoipa::path(
    get,
    path = "/api/moods/today",
    tag = "Moods",
    params(("userId" = String, Query, description = "User id")),
    responses(
        (status = 200, description = "Whether a mood exists for today, and the entry if so"),
        (status = 400, description = "userId is required")
    )
)]
pub async fn get_today(
    db: web::Data<MongoDB>,
    query: web::Query<MoodQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = mood_service::require_user_id(query.user_id.as_deref())?;
    log::info!("📆 GET /api/moods/today - user: {}", user_id);

    let body = match mood_service::today_mood(&db, user_id).await? {
        Some(mood) => serde_json::json!({ "hasMood": true, "mood": MoodResponse::from(mood) }),
        None => serde_json::json!({ "hasMood": false }),
    };
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    put,
    path = "/api/moods/today",
    tag = "Moods",
    request_body = MoodRequest,
    responses(
        (status = 200, description = "Today's mood updated", body = MoodResponse),
        (status = 201, description = "No mood existed, one was created", body = MoodResponse),
        (status = 400, description = "Missing userId or invalid mood")
    )
)]
pub async fn update_today(
    db: web::Data<MongoDB>,
    request: web::Json<MoodRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let user_id = mood_service::require_user_id(request.user_id.as_deref())?;
    log::info!("✏️  PUT /api/moods/today - user: {}", user_id);

    let mood = match parse_mood(request.mood.as_deref()) {
        Ok(mood) => mood,
        Err(response) => return Ok(response),
    };

    let (entry, created) = mood_service::update_today_mood(&db, user_id, mood, request.notes).await?;
    let body = serde_json::json!({
        "success": true,
        "created": created,
        "mood": MoodResponse::from(entry),
    });

    if created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

#[utoipa::path(
    delete,
    path = "/api/moods",
    tag = "Moods",
    params(("userId" = String, Query, description = "User id")),
    responses(
        (status = 200, description = "All moods of the user deleted"),
        (status = 400, description = "userId is required")
    )
)]
pub async fn clear_moods(
    db: web::Data<MongoDB>,
    query: web::Query<MoodQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = mood_service::require_user_id(query.user_id.as_deref())?;
    log::info!("🗑️  DELETE /api/moods - user: {}", user_id);

    let count = mood_service::clear_moods(&db, user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Deleted {} mood entries", count),
        "count": count,
    })))
}

#[utoipa::path(
    get,
    path = "/api/moods/history",
    tag = "Moods",
    params(
        ("userId" = String, Query, description = "User id"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, default 10, max 50")
    ),
    responses(
        (status = 200, description = "Moods, newest first, with pagination"),
        (status = 400, description = "userId is required")
    )
)]
pub async fn get_history(
    db: web::Data<MongoDB>,
    query: web::Query<MoodQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = mood_service::require_user_id(query.user_id.as_deref())?;
    log::info!("📜 GET /api/moods/history - user: {}, page: {:?}", user_id, query.page);

    let (moods, pagination) = mood_service::mood_history(&db, user_id, query.page, query.limit).await?;
    let moods: Vec<MoodResponse> = moods.into_iter().map(MoodResponse::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "moods": moods,
        "pagination": pagination,
    })))
}

#[utoipa::path(
    get,
    path = "/api/moods/debug",
    tag = "Moods",
    responses(
        (status = 200, description = "Database connectivity and collection status")
    )
)]
pub async fn debug_status(db: web::Data<MongoDB>, config: web::Data<AppConfig>) -> HttpResponse {
    log::info!("🔧 GET /api/moods/debug");

    let status = mood_service::database_status(&db, &config.environment).await;
    HttpResponse::Ok().json(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_invalid_mood_lists_valid_names() {
        let response = parse_mood(Some("Ecstatic")).unwrap_err();
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid mood: Ecstatic");
        assert_eq!(json["validMoods"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_valid_mood_parses() {
        assert!(matches!(parse_mood(Some(" Relaxed ")), Ok(MoodKind::Relaxed)));
        assert!(parse_mood(None).is_err());
    }
}
