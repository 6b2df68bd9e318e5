use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{CreateFeedRequest, FeedItemResponse},
    services::feed_service::{self, MEDITATIONS},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/feed",
    tag = "Feed",
    responses((status = 200, description = "All feed items", body = [FeedItemResponse]))
)]
pub async fn list_feed(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("📰 GET /api/feed");

    let items: Vec<FeedItemResponse> = feed_service::list(&db)
        .await?
        .into_iter()
        .map(FeedItemResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(items))
}

#[utoipa::path(
    get,
    path = "/api/feed/{id}",
    tag = "Feed",
    params(("id" = String, Path, description = "Feed item id")),
    responses(
        (status = 200, description = "Feed item", body = FeedItemResponse),
        (status = 404, description = "Feed not found")
    )
)]
pub async fn get_feed_item(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("📰 GET /api/feed/{}", id);

    let item = feed_service::get_by_id(&db, &id).await?;
    Ok(HttpResponse::Ok().json(FeedItemResponse::from(item)))
}

#[utoipa::path(
    post,
    path = "/api/feed",
    tag = "Feed",
    request_body = CreateFeedRequest,
    responses(
        (status = 201, description = "Feed item created", body = FeedItemResponse),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_feed_item(
    db: web::Data<MongoDB>,
    request: web::Json<CreateFeedRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /api/feed - title: {:?}", request.title);

    let item = feed_service::build_feed_item(request.into_inner())?;
    let item = feed_service::create(&db, item).await?;
    Ok(HttpResponse::Created().json(FeedItemResponse::from(item)))
}

#[utoipa::path(
    get,
    path = "/api/meditations",
    tag = "Feed",
    responses((status = 200, description = "Curated meditation list"))
)]
pub async fn list_meditations() -> HttpResponse {
    log::info!("🧘 GET /api/meditations");
    HttpResponse::Ok().json(&MEDITATIONS[..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, App};

    #[actix_web::test]
    async fn test_meditations_are_served_statically() {
        let app = actix_test::init_service(
            App::new().route("/api/meditations", web::get().to(list_meditations)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/meditations").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list[0]["title"], "Yoga Nidra For Sleep");
    }
}
