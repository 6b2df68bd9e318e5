pub mod appointment_service;
pub mod assistant_service;
pub mod auth_service;
pub mod calcom_service;
pub mod chat_group_service;
pub mod crisis_detection_service;
pub mod emergency_service;
pub mod feed_service;
pub mod gemini_service;
pub mod mood_service;
pub mod profile_service;
pub mod safety_store;
pub mod therapist_service;
pub mod toxicity_service;

pub use assistant_service::AssistantService;
pub use calcom_service::CalComClient;
pub use emergency_service::SafetyService;
