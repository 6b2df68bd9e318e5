pub mod mood_retention;
