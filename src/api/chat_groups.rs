use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{
        ChatGroupResponse, CreateGroupRequest, ForumMessageResponse, MembershipRequest, PostMessageRequest,
    },
    seeds::chat_groups_seed,
    services::{chat_group_service, SafetyService},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/chat-groups",
    tag = "Chat Groups",
    responses((status = 200, description = "All chat groups", body = [ChatGroupResponse]))
)]
pub async fn list_groups(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("👥 GET /api/chat-groups");

    let groups: Vec<ChatGroupResponse> = chat_group_service::list_groups(&db)
        .await?
        .into_iter()
        .map(ChatGroupResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(groups))
}

#[utoipa::path(
    get,
    path = "/api/chat-groups/{id}",
    tag = "Chat Groups",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Chat group", body = ChatGroupResponse),
        (status = 404, description = "Group not found")
    )
)]
pub async fn get_group(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("👥 GET /api/chat-groups/{}", id);

    let group = chat_group_service::get_group(&db, &id).await?;
    Ok(HttpResponse::Ok().json(ChatGroupResponse::from(group)))
}

#[utoipa::path(
    post,
    path = "/api/chat-groups",
    tag = "Chat Groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created with a welcome message", body = ChatGroupResponse),
        (status = 400, description = "Group name is required")
    )
)]
pub async fn create_group(
    db: web::Data<MongoDB>,
    request: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    log::info!("➕ POST /api/chat-groups - name: {:?}", request.name);

    let group = chat_group_service::create_group(&db, &request.name, request.description).await?;
    Ok(HttpResponse::Created().json(ChatGroupResponse::from(group)))
}

#[utoipa::path(
    post,
    path = "/api/chat-groups/initialize",
    tag = "Chat Groups",
    responses((status = 200, description = "Default groups created when none existed"))
)]
pub async fn initialize_groups(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🌱 POST /api/chat-groups/initialize");

    let created = chat_groups_seed::seed_default_groups(&db).await?;
    let message = if created == 0 {
        "Chat groups already initialized".to_string()
    } else {
        format!("Initialized {} default chat groups", created)
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": message,
        "created": created,
    })))
}

#[utoipa::path(
    post,
    path = "/api/chat-groups/{id}/join",
    tag = "Chat Groups",
    params(("id" = String, Path, description = "Group id")),
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Joined the group", body = ChatGroupResponse),
        (status = 400, description = "Group full or already a member"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn join_group(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<MembershipRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("➕ POST /api/chat-groups/{}/join - user: {:?}", id, request.username);

    match chat_group_service::join_group(&db, &id, &request.username).await {
        Ok(group) => {
            let group = ChatGroupResponse::from(group);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": format!("Joined {}", group.name),
                "members": group.members,
                "group": group,
            })))
        }
        Err(e) => {
            log::warn!("❌ Join rejected for group {}: {}", id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/chat-groups/{id}/leave",
    tag = "Chat Groups",
    params(("id" = String, Path, description = "Group id")),
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Left the group", body = ChatGroupResponse),
        (status = 400, description = "Not a member"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn leave_group(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<MembershipRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("➖ POST /api/chat-groups/{}/leave - user: {:?}", id, request.username);

    let group = ChatGroupResponse::from(chat_group_service::leave_group(&db, &id, &request.username).await?);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Left {}", group.name),
        "members": group.members,
        "group": group,
    })))
}

#[utoipa::path(
    get,
    path = "/api/chat-groups/{id}/messages",
    tag = "Chat Groups",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Messages, oldest first", body = [ForumMessageResponse]),
        (status = 404, description = "Group not found")
    )
)]
pub async fn list_messages(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("💬 GET /api/chat-groups/{}/messages", id);

    let messages: Vec<ForumMessageResponse> = chat_group_service::list_messages(&db, &id)
        .await?
        .into_iter()
        .map(ForumMessageResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(messages))
}

#[utoipa::path(
    post,
    path = "/api/chat-groups/{id}/messages",
    tag = "Chat Groups",
    params(("id" = String, Path, description = "Group id")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message stored; concerning posts carry a warning", body = ForumMessageResponse),
        (status = 400, description = "Empty or inappropriate message"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn post_message(
    db: web::Data<MongoDB>,
    safety: web::Data<SafetyService>,
    path: web::Path<String>,
    request: web::Json<PostMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("💬 POST /api/chat-groups/{}/messages", id);

    let outcome = chat_group_service::post_message(&db, &safety, &id, request.into_inner()).await?;
    let mut body = serde_json::json!({
        "success": true,
        "message": ForumMessageResponse::from(outcome.message),
    });
    if let Some(warning) = outcome.warning {
        body["warning"] = serde_json::Value::String(warning);
    }

    Ok(HttpResponse::Created().json(body))
}
