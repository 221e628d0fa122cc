use std::collections::HashSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::InvalidLesson;

/// Multiple-choice comprehension check attached to a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl CheckQuestion {
    #[must_use]
    pub fn is_answerable(&self) -> bool {
        self.correct_answer < self.options.len()
    }
}

/// One teachable unit of a lesson paired with its check question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSegment {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_boxes: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub question: CheckQuestion,
    #[serde(default)]
    pub completed: bool,
}

impl LessonSegment {
    /// `true` when the embedded question has at least one option and its answer index
    /// points into them.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.question.is_answerable()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "segment id must be a string or number, got {other}"
        ))),
    }
}

/// Ordered, non-empty sequence of valid segments.
///
/// Serializes as a bare JSON array. Deserialization re-checks the invariants, so a
/// lesson loaded from storage is as trustworthy as a freshly extracted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LessonSegment>", into = "Vec<LessonSegment>")]
pub struct Lesson {
    segments: Vec<LessonSegment>,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns [`InvalidLesson`] if `segments` is empty, any answer index is out of range
    /// or an id is empty or repeated.
    pub fn new(segments: Vec<LessonSegment>) -> Result<Self, InvalidLesson> {
        if segments.is_empty() {
            return Err(InvalidLesson::Empty);
        }
        let mut seen = HashSet::with_capacity(segments.len());
        for (index, seg) in segments.iter().enumerate() {
            if !seg.is_valid() {
                return Err(InvalidLesson::AnswerOutOfRange {
                    index,
                    answer: seg.question.correct_answer,
                    options: seg.question.options.len(),
                });
            }
            if seg.id.is_empty() {
                return Err(InvalidLesson::EmptyId { index });
            }
            if !seen.insert(seg.id.as_str()) {
                return Err(InvalidLesson::DuplicateId {
                    index,
                    id: seg.id.clone(),
                });
            }
        }
        Ok(Self { segments })
    }

    /// Wrap segments already known to satisfy [`Lesson::new`].
    pub(crate) fn from_valid(segments: Vec<LessonSegment>) -> Self {
        debug_assert!(Self::new(segments.clone()).is_ok());
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[LessonSegment] {
        &self.segments
    }

    #[must_use]
    pub fn first(&self) -> &LessonSegment {
        &self.segments[0]
    }
}

impl TryFrom<Vec<LessonSegment>> for Lesson {
    type Error = InvalidLesson;

    fn try_from(segments: Vec<LessonSegment>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<Lesson> for Vec<LessonSegment> {
    fn from(lesson: Lesson) -> Self {
        lesson.segments
    }
}

/// Convert recovered JSON values into segments.
///
/// Non-objects and objects that do not deserialize into an answerable segment are
/// dropped. Fields are kept as parsed, except that empty or repeated ids are replaced
/// with `segment-<n>` so the result always forms a valid [`Lesson`].
#[must_use]
pub fn segments_from_values(values: Vec<Value>) -> Vec<LessonSegment> {
    let mut seen = HashSet::new();
    let mut segments = Vec::with_capacity(values.len());

    for value in values {
        if !value.is_object() {
            continue;
        }
        let mut segment = match serde_json::from_value::<LessonSegment>(value) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!("skipping object that is not a lesson segment: {e}");
                continue;
            }
        };
        if !segment.is_valid() {
            tracing::debug!(
                id = %segment.id,
                answer = segment.question.correct_answer,
                options = segment.question.options.len(),
                "skipping segment with unanswerable question"
            );
            continue;
        }
        if segment.id.is_empty() || seen.contains(&segment.id) {
            let mut n = segments.len() + 1;
            while seen.contains(&format!("segment-{n}")) {
                n += 1;
            }
            segment.id = format!("segment-{n}");
        }
        seen.insert(segment.id.clone());
        segments.push(segment);
    }

    segments
}
