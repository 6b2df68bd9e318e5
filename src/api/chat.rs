use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    models::ChatHistoryResponse,
    services::{
        assistant_service::{ChatReply, FAILURE_REPLY},
        auth_service::Claims,
        AssistantService,
    },
    utils::AppError,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub user_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/chat",
    tag = "Assistant",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply; crisis replies carry resources", body = ChatReply),
        (status = 400, description = "Message is required"),
        (status = 500, description = "The reply could not be generated")
    )
)]
pub async fn chat(
    assistant: web::Data<AssistantService>,
    request: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🤖 POST /chat - user: {}", request.user_id.as_deref().unwrap_or("anonymous"));

    match assistant
        .respond(request.message.as_deref(), request.user_id.as_deref())
        .await
    {
        Ok(reply) => Ok(HttpResponse::Ok().json(reply)),
        Err(AppError::InvalidRequest(msg)) => Err(AppError::InvalidRequest(msg)),
        Err(e) => {
            log::error!("❌ Error processing chat message: {}", e);
            crate::api::metrics::increment_error_count();
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": FAILURE_REPLY,
                "status": "error",
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/chat/history/{user_id}",
    tag = "Assistant",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Latest 50 exchanges, newest first", body = [ChatHistoryResponse]),
        (status = 403, description = "History of another user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn chat_history(
    assistant: web::Data<AssistantService>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    log::info!("📜 GET /api/chat/history/{}", user_id);

    if claims.sub != user_id {
        return Err(AppError::Forbidden("You can only view your own chat history".to_string()));
    }

    let history: Vec<ChatHistoryResponse> = assistant
        .history(&user_id)
        .await?
        .into_iter()
        .map(ChatHistoryResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::crisis_detection_service::{CrisisDetector, HarmDetector};
    use crate::services::emergency_service::testing::RecordingSmsGateway;
    use crate::services::gemini_service::ReplyGenerator;
    use crate::services::safety_store::memory::MemorySafetyStore;
    use crate::services::toxicity_service::LexiconClassifier;
    use crate::services::SafetyService;
    use actix_web::{http::StatusCode, test as actix_test, App};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Unavailable;

    #[async_trait]
    impl ReplyGenerator for Unavailable {
        async fn generate(&self, _prompt: &str) -> Result<Option<String>, AppError> {
            Err(AppError::External("model unavailable".into()))
        }
    }

    fn assistant() -> AssistantService {
        let detector = HarmDetector::new(CrisisDetector::default(), Arc::new(LexiconClassifier::default()));
        let safety = SafetyService::new(
            detector,
            Arc::new(MemorySafetyStore::default()),
            Arc::new(RecordingSmsGateway::default()),
            Vec::new(),
        );
        AssistantService::new(Arc::new(safety), Arc::new(Unavailable))
    }

    #[actix_web::test]
    async fn test_chat_status_codes() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(assistant()))
                .route("/chat", web::post().to(chat)),
        )
        .await;

        let empty = actix_test::TestRequest::post()
            .uri("/chat")
            .set_json(serde_json::json!({ "message": "" }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, empty).await.status(), StatusCode::BAD_REQUEST);

        let greeting = actix_test::TestRequest::post()
            .uri("/chat")
            .set_json(serde_json::json!({ "message": "hello there" }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, greeting).await;
        assert_eq!(body["status"], "normal");

        let question = actix_test::TestRequest::post()
            .uri("/chat")
            .set_json(serde_json::json!({ "message": "What helps with sleep anxiety?" }))
            .to_request();
        let res = actix_test::call_service(&app, question).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], FAILURE_REPLY);
    }

    #[actix_web::test]
    async fn test_crisis_reply_carries_resources() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(assistant()))
                .route("/chat", web::post().to(chat)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/chat")
            .set_json(serde_json::json!({ "message": "I want to end my life", "userId": "u1" }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "crisis");
        assert_eq!(body["resources"]["text"], "Text HOME to 741741");
    }
}
