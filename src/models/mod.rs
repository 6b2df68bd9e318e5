pub mod appointment;
pub mod chat_group;
pub mod crisis;
pub mod feed;
pub mod mood;
pub mod therapist;
pub mod user;

pub use appointment::*;
pub use chat_group::*;
pub use crisis::*;
pub use feed::*;
pub use mood::*;
pub use therapist::*;
pub use user::*;
