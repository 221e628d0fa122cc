use mindflow_lesson::InvalidLesson;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored lesson {id} is invalid: {source}")]
    InvalidLesson {
        id: String,
        #[source]
        source: InvalidLesson,
    },

    #[error("integer conversion: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}
