use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

impl HealthResponse {
    pub fn new(database_up: bool) -> Self {
        Self {
            status: if database_up { "healthy" } else { "degraded" }.to_string(),
            service: "mindbridge-service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if database_up { "connected" } else { "disconnected" }.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Liveness banner", body = String))
)]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("Server is running!")
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>) -> impl Responder {
    let health = HealthResponse::new(db.ping().await);
    if health.status == "healthy" {
        HttpResponse::Ok().json(health)
    } else {
        HttpResponse::ServiceUnavailable().json(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_follows_database() {
        assert_eq!(HealthResponse::new(true).status, "healthy");
        let degraded = HealthResponse::new(false);
        assert_eq!(degraded.status, "degraded");
        assert_eq!(degraded.database, "disconnected");
    }
}
