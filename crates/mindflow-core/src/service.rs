use mindflow_lesson::{
    Diagnostic, ExtractionPolicy, LearningPath, Lesson, LessonPipeline, LessonShape, Origin,
    PromptBuilder, SYSTEM_PROMPT, extract_learning_path, fallback_lesson,
};
use mindflow_llm::{LlmError, LlmProvider, Message};
use mindflow_store::{LessonStore, StoreError};
use serde::{Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("upstream service error: {0}")]
    Upstream(#[from] LlmError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

pub(crate) fn serialize_error<S: Serializer>(
    error: &Option<ServiceError>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.collect_str(e),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "origin")]
pub enum LessonSource {
    /// Previously generated lesson read from the store.
    Store,
    /// Fresh model output run through the extraction pipeline.
    Generated(Origin),
    /// The model call failed, so a fallback lesson was built without model output.
    Unavailable,
}

impl LessonSource {
    #[must_use]
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Generated(Origin::Fallback) | Self::Unavailable)
    }
}

/// Lesson handed to the learner plus everything that went wrong producing it.
#[derive(Debug, Serialize)]
pub struct LessonDelivery {
    pub lesson: Lesson,
    pub source: LessonSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ServiceError>,
}

pub struct LessonService<P, S> {
    provider: P,
    store: S,
    pipeline: LessonPipeline,
    prompts: PromptBuilder,
    shape: LessonShape,
}

impl<P: LlmProvider, S: LessonStore> LessonService<P, S> {
    #[must_use]
    pub fn new(
        provider: P,
        store: S,
        pipeline: LessonPipeline,
        prompts: PromptBuilder,
        shape: LessonShape,
    ) -> Self {
        Self {
            provider,
            store,
            pipeline,
            prompts,
            shape,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the lesson for `lesson_id`, generating and storing it on a miss.
    ///
    /// Always yields a usable lesson. Upstream and persistence failures are reported in
    /// [`LessonDelivery::error`] instead of aborting delivery.
    pub async fn deliver(&self, lesson_id: &str, title: &str) -> LessonDelivery {
        match self.store.get(lesson_id).await {
            Ok(Some(lesson)) => {
                tracing::debug!(lesson_id, "serving stored lesson");
                return LessonDelivery {
                    lesson,
                    source: LessonSource::Store,
                    diagnostic: None,
                    error: None,
                };
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(lesson_id, "lesson store read failed, generating: {e}"),
        }

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(self.prompts.lesson_prompt(title, self.shape)),
        ];
        let raw = match self.provider.chat(&messages).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    lesson_id,
                    provider = self.provider.name(),
                    "lesson generation failed: {e}"
                );
                return LessonDelivery {
                    lesson: fallback_lesson(title, Some(&e.to_string())),
                    source: LessonSource::Unavailable,
                    diagnostic: None,
                    error: Some(ServiceError::Upstream(e)),
                };
            }
        };

        let outcome = self.pipeline.run(&raw, title);
        let mut delivery = LessonDelivery {
            lesson: outcome.lesson,
            source: LessonSource::Generated(outcome.origin),
            diagnostic: outcome.diagnostic,
            error: None,
        };

        if outcome.origin.is_fallback() {
            return delivery;
        }

        match self.store.put(lesson_id, title, &delivery.lesson).await {
            Ok(()) => tracing::info!(
                lesson_id,
                segments = delivery.lesson.segments().len(),
                "generated lesson"
            ),
            Err(e) => {
                tracing::warn!(lesson_id, "failed to store generated lesson: {e}");
                delivery.error = Some(ServiceError::Persistence(e));
            }
        }
        delivery
    }
}

#[derive(Debug, Serialize)]
pub struct PathDelivery {
    #[serde(flatten)]
    pub path: LearningPath,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ServiceError>,
}

pub struct LearningPathService<P> {
    provider: P,
    prompts: PromptBuilder,
    policy: ExtractionPolicy,
}

impl<P: LlmProvider> LearningPathService<P> {
    #[must_use]
    pub fn new(provider: P, prompts: PromptBuilder, policy: ExtractionPolicy) -> Self {
        Self {
            provider,
            prompts,
            policy,
        }
    }

    /// Lesson titles for `topic`. Falls back to a generic path if the model call fails.
    pub async fn generate(&self, topic: &str) -> PathDelivery {
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(self.prompts.learning_path_prompt(topic)),
        ];
        match self.provider.chat(&messages).await {
            Ok(raw) => PathDelivery {
                path: extract_learning_path(&raw, topic, &self.policy),
                error: None,
            },
            Err(e) => {
                tracing::warn!(topic, "learning path generation failed: {e}");
                PathDelivery {
                    path: LearningPath::fallback(topic),
                    error: Some(ServiceError::Upstream(e)),
                }
            }
        }
    }
}
