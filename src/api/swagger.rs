use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MindBridge Service API",
        version = "1.0.0",
        description = "API documentation for the MindBridge mental-health backend.\n\n**Authentication:** profile, therapist creation, crisis events and chat history require a JWT Bearer token.\n\n**Safety:** assistant and forum messages are screened for suicidal and toxic content; crisis messages notify the user's emergency contacts.",
        contact(
            name = "MindBridge Team",
            email = "support@mindbridge.app"
        )
    ),
    paths(
        // Auth
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::get_me,

        // Profile
        crate::api::profile::get_profile,
        crate::api::profile::update_profile,
        crate::api::profile::get_emergency_contacts,
        crate::api::profile::update_emergency_contacts,
        crate::api::profile::update_preferences,
        crate::api::profile::update_privacy_settings,

        // Moods
        crate::api::moods::get_weekly,
        crate::api::moods::add_mood,
        crate::api::moods::get_today,
        crate::api::moods::update_today,
        crate::api::moods::clear_moods,
        crate::api::moods::get_history,
        crate::api::moods::debug_status,

        // Therapists
        crate::api::therapists::list_therapists,
        crate::api::therapists::list_popular,
        crate::api::therapists::list_available,
        crate::api::therapists::search_therapists,
        crate::api::therapists::get_therapist,
        crate::api::therapists::create_therapist,

        // Appointments
        crate::api::appointments::available_slots,
        crate::api::appointments::create_appointment,
        crate::api::appointments::get_appointment,
        crate::api::appointments::user_appointments,
        crate::api::appointments::cancel_appointment,
        crate::api::appointments::reschedule_appointment,
        crate::api::appointments::calendar_status,

        // Chat groups
        crate::api::chat_groups::list_groups,
        crate::api::chat_groups::get_group,
        crate::api::chat_groups::create_group,
        crate::api::chat_groups::initialize_groups,
        crate::api::chat_groups::join_group,
        crate::api::chat_groups::leave_group,
        crate::api::chat_groups::list_messages,
        crate::api::chat_groups::post_message,

        // Feed
        crate::api::feed::list_feed,
        crate::api::feed::get_feed_item,
        crate::api::feed::create_feed_item,
        crate::api::feed::list_meditations,

        // Assistant & crisis
        crate::api::chat::chat,
        crate::api::chat::chat_history,
        crate::api::crisis::list_crisis_events,

        // Health & Metrics
        crate::api::health::root,
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Auth & profile
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::SignupResponse,
            crate::services::auth_service::AuthResponse,
            crate::models::UserSummary,
            crate::models::UserProfile,
            crate::models::UpdateProfileRequest,
            crate::models::EmergencyContact,
            crate::models::EmergencyContactsRequest,
            crate::models::Preferences,
            crate::models::PrivacySettings,

            // Moods
            crate::models::MoodKind,
            crate::models::MoodRequest,
            crate::models::MoodResponse,
            crate::models::WeeklyMoods,
            crate::services::mood_service::Pagination,

            // Therapists & appointments
            crate::models::TherapistResponse,
            crate::models::CreateTherapistRequest,
            crate::models::AppointmentStatus,
            crate::models::AppointmentResponse,
            crate::models::TherapistSummaryResponse,
            crate::models::TimeSlot,
            crate::models::CreateAppointmentRequest,
            crate::models::RescheduleRequest,
            crate::services::calcom_service::CalComStatus,

            // Community & feed
            crate::models::ChatGroupResponse,
            crate::models::ForumMessageResponse,
            crate::models::CreateGroupRequest,
            crate::models::MembershipRequest,
            crate::models::PostMessageRequest,
            crate::models::FeedItemResponse,
            crate::models::CreateFeedRequest,

            // Assistant & crisis
            crate::api::chat::ChatRequest,
            crate::services::assistant_service::ChatReply,
            crate::services::assistant_service::CrisisResources,
            crate::models::ChatStatus,
            crate::models::ChatHistoryResponse,
            crate::models::CrisisEventResponse,
            crate::models::CrisisSource,
            crate::models::CrisisStatus,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Signup, login and the current user."),
        (name = "Profile", description = "Profile, emergency contacts, preferences and privacy settings."),
        (name = "Moods", description = "Daily mood tracking, weekly view and history."),
        (name = "Therapists", description = "Therapist directory."),
        (name = "Appointments", description = "Appointment booking through Cal.com."),
        (name = "Chat Groups", description = "Community forums with moderated messages."),
        (name = "Feed", description = "Content feed and curated meditations."),
        (name = "Assistant", description = "AI chat assistant with crisis detection."),
        (name = "Crisis", description = "Recorded crisis escalations."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/chat", "/api/crisis-events/{user_id}", "/api/chat-groups/{id}/messages", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
