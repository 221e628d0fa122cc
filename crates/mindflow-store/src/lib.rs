//! Lesson and chat history persistence.

pub mod cache;
pub mod error;
pub mod lesson;
pub mod sqlite;

pub use cache::{CachedLessonStore, DEFAULT_TTL, TtlCache};
pub use error::StoreError;
pub use lesson::LessonStore;
pub use sqlite::{ChatRecord, SqliteStore};
