pub mod attendance;
pub mod chat;
pub mod leave;
pub mod notification;
pub mod project;
pub mod task;
pub mod timelog;
pub mod user;
