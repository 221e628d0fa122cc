//! Configuration and the services that tie model calls, extraction and storage together.

pub mod chat;
pub mod config;
pub mod service;
pub mod vault;

pub use chat::{ChatReply, ChatService};
pub use config::Config;
pub use service::{
    LearningPathService, LessonDelivery, LessonService, LessonSource, PathDelivery, ServiceError,
};
