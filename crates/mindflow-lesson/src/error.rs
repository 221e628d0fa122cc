#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no structured lesson found in model output")]
    NoStructureFound,

    #[error("repair did not produce valid JSON: {0}")]
    RepairFailed(String),
}

/// A lesson must hold at least one segment, every segment must be answerable and
/// segment ids must be non-empty and unique.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLesson {
    #[error("lesson has no segments")]
    Empty,

    #[error("segment {index} has correct answer {answer} outside {options} option(s)")]
    AnswerOutOfRange {
        index: usize,
        answer: usize,
        options: usize,
    },

    #[error("segment {index} has an empty id")]
    EmptyId { index: usize },

    #[error("segment {index} repeats id {id:?}")]
    DuplicateId { index: usize, id: String },
}
