//! Lesson data model and tolerant recovery of structured lessons from LLM output.
//!
//! Everything here is synchronous and free of I/O. [`LessonPipeline::run`] always yields
//! a non-empty lesson whose check questions are answerable, using a fallback lesson when
//! nothing could be recovered.

pub mod error;
pub mod extractor;
pub mod fallback;
pub mod path;
pub mod pipeline;
pub mod prompt;
pub mod repair;
pub mod sentinel;
pub mod strategy;
pub mod types;

pub use error::{ExtractError, InvalidLesson};
pub use extractor::{Extraction, ExtractionPolicy, Extractor};
pub use fallback::{fallback_learning_path, fallback_lesson};
pub use path::{LearningPath, PathSource, extract_learning_path};
pub use pipeline::{Diagnostic, LessonOutcome, LessonPipeline, Origin};
pub use prompt::{LessonShape, PromptBuilder, SYSTEM_PROMPT};
pub use sentinel::SentinelTags;
pub use strategy::Strategy;
pub use types::{CheckQuestion, Lesson, LessonSegment};
