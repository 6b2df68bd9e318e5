pub mod appointments;
pub mod auth;
pub mod chat;
pub mod chat_groups;
pub mod crisis;
pub mod feed;
pub mod health;
pub mod metrics;
pub mod moods;
pub mod profile;
pub mod swagger;
pub mod therapists;
