mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::services::{
    crisis_detection_service::{CrisisDetector, HarmDetector},
    emergency_service::gateway_from_settings,
    gemini_service::GeminiClient,
    safety_store::MongoSafetyStore,
    toxicity_service::LexiconClassifier,
    AssistantService, CalComClient, SafetyService,
};
use crate::utils::AppError;

fn startup_error(e: AppError) -> std::io::Error {
    log::error!("❌ Startup failed: {}", e);
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(startup_error)?;

    log::info!("🚀 Starting MindBridge Service...");
    log::info!("🌍 Environment: {}", config.environment);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(startup_error)?;
    log::info!("✅ MongoDB connected successfully ({})", db.database().name());

    // Safety pipeline
    let crisis = CrisisDetector::load(config.safety.dataset_path.as_deref());
    let phrase_count = crisis.phrases().len();
    let toxicity = Arc::new(LexiconClassifier::new(config.safety.toxicity_threshold));
    let detector = HarmDetector::new(crisis, toxicity);
    let safety = Arc::new(SafetyService::new(
        detector,
        Arc::new(MongoSafetyStore::new(db.clone())),
        gateway_from_settings(config.twilio.as_ref()),
        config.safety.default_contacts.clone(),
    ));
    log::info!(
        "🛡️  Crisis detection ready ({} phrases, {} default contacts)",
        phrase_count,
        config.safety.default_contacts.len()
    );

    let assistant = AssistantService::new(safety.clone(), Arc::new(GeminiClient::new(&config.gemini)));
    let calcom = CalComClient::new(&config.calcom).map_err(startup_error)?;

    // 🌱 Seed default chat groups and feed
    seeds::run_all(&db).await;

    // 🧹 Background jobs
    log::info!("📅 Starting background jobs...");
    jobs::mood_retention::start_mood_retention_job(db.clone(), config.mood_history_days);

    let bind_address = format!("{}:{}", config.host, config.port);
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);
    let safety_data = web::Data::from(safety);
    let assistant_data = web::Data::new(assistant);
    let calcom_data = web::Data::new(calcom);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::InvalidRequest(format!("Invalid JSON body: {}", err)).into()
        });

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(safety_data.clone())
            .app_data(assistant_data.clone())
            .app_data(calcom_data.clone())
            .app_data(json_config)
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            // Health check
            .route("/", web::get().to(api::health::root))
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))

            // ==================== AUTH & PROFILE ====================
            .service(
                web::scope("/api/auth")
                    .route("/signup", web::post().to(api::auth::signup))
                    .route("/login", web::post().to(api::auth::login))
                    .service(
                        web::resource("/me")
                            .wrap(middleware::AuthMiddleware)
                            .route(web::get().to(api::auth::get_me))
                    )
            )
            .service(
                web::scope("/api/profile")
                    .wrap(middleware::AuthMiddleware)
                    .route("/{id}/emergency-contacts", web::get().to(api::profile::get_emergency_contacts))
                    .route("/{id}/emergency-contacts", web::put().to(api::profile::update_emergency_contacts))
                    .route("/{id}/preferences", web::put().to(api::profile::update_preferences))
                    .route("/{id}/privacy-settings", web::put().to(api::profile::update_privacy_settings))
                    .route("/{identifier}", web::get().to(api::profile::get_profile))
                    .route("/{id}", web::put().to(api::profile::update_profile))
            )

            // ==================== MOODS ====================
            .service(
                web::scope("/api/moods")
                    .route("", web::post().to(api::moods::add_mood))
                    .route("", web::delete().to(api::moods::clear_moods))
                    .route("/weekly", web::get().to(api::moods::get_weekly))
                    .route("/today", web::get().to(api::moods::get_today))
                    .route("/today", web::put().to(api::moods::update_today))
                    .route("/history", web::get().to(api::moods::get_history))
                    .route("/debug", web::get().to(api::moods::debug_status))
            )

            // ==================== THERAPISTS & APPOINTMENTS ====================
            .service(
                web::scope("/api/therapists")
                    .route("", web::get().to(api::therapists::list_therapists))
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(middleware::AuthMiddleware)
                            .route(web::post().to(api::therapists::create_therapist))
                    )
                    .route("/popular", web::get().to(api::therapists::list_popular))
                    .route("/available", web::get().to(api::therapists::list_available))
                    .route("/search", web::get().to(api::therapists::search_therapists))
                    .route("/{id}", web::get().to(api::therapists::get_therapist))  // catch-all, keep last
            )
            .service(
                web::scope("/api/appointments")
                    .route("", web::post().to(api::appointments::create_appointment))
                    .route("/available-slots", web::get().to(api::appointments::available_slots))
                    .route("/calendar/status", web::get().to(api::appointments::calendar_status))
                    .route("/user/{user_id}", web::get().to(api::appointments::user_appointments))
                    .route("/cancel/{id}", web::put().to(api::appointments::cancel_appointment))
                    .route("/reschedule/{id}", web::put().to(api::appointments::reschedule_appointment))
                    .route("/{id}", web::get().to(api::appointments::get_appointment))
            )

            // ==================== COMMUNITY ====================
            .service(
                web::scope("/api/chat-groups")
                    .route("", web::get().to(api::chat_groups::list_groups))
                    .route("", web::post().to(api::chat_groups::create_group))
                    .route("/initialize", web::post().to(api::chat_groups::initialize_groups))
                    .route("/{id}", web::get().to(api::chat_groups::get_group))
                    .route("/{id}/join", web::post().to(api::chat_groups::join_group))
                    .route("/{id}/leave", web::post().to(api::chat_groups::leave_group))
                    .route("/{id}/messages", web::get().to(api::chat_groups::list_messages))
                    .route("/{id}/messages", web::post().to(api::chat_groups::post_message))
            )
            .service(
                web::scope("/api/feed")
                    .route("", web::get().to(api::feed::list_feed))
                    .route("", web::post().to(api::feed::create_feed_item))
                    .route("/{id}", web::get().to(api::feed::get_feed_item))
            )
            .route("/api/meditations", web::get().to(api::feed::list_meditations))

            // ==================== ASSISTANT & CRISIS ====================
            .route("/chat", web::post().to(api::chat::chat))
            .route("/api/chat", web::post().to(api::chat::chat))
            .service(
                web::scope("/api/chat/history")
                    .wrap(middleware::AuthMiddleware)
                    .route("/{user_id}", web::get().to(api::chat::chat_history))
            )
            .service(
                web::scope("/api/crisis-events")
                    .wrap(middleware::AuthMiddleware)
                    .route("/{user_id}", web::get().to(api::crisis::list_crisis_events))
            )
    })
    .bind(bind_address)?
    .run()
    .await
}

