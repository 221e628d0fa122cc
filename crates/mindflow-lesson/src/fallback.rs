use crate::types::{CheckQuestion, Lesson, LessonSegment};

pub const FALLBACK_TITLE: &str = "Lesson Not Found";

/// Index of "All of the above" in the fallback question.
pub const FALLBACK_CORRECT_ANSWER: usize = 3;

fn fallback_question() -> CheckQuestion {
    CheckQuestion {
        text: "What should you do if your lesson is not found?".into(),
        options: vec![
            "Wait for content to be added".into(),
            "Try a different lesson".into(),
            "Contact support".into(),
            "All of the above".into(),
        ],
        correct_answer: FALLBACK_CORRECT_ANSWER,
        explanation: "If a lesson is not found, you can try a different lesson, wait for \
                      content to be added, or contact support."
            .into(),
    }
}

/// Placeholder lesson used when nothing could be recovered.
///
/// `error` selects the wording: with an error the content reports a failed generation,
/// without one it reports that no content exists yet. The error text itself is never
/// shown to the learner.
#[must_use]
pub fn fallback_lesson(topic: &str, error: Option<&str>) -> Lesson {
    let topic = topic.trim();
    let content = match (error, topic.is_empty()) {
        (Some(_), true) => "AI failed to generate lesson content. Please try again later or \
                            contact support."
            .to_owned(),
        (Some(_), false) => format!(
            "AI failed to generate lesson content for \"{topic}\". Please try again later or \
             contact support."
        ),
        (None, true) => "No lesson content available yet. Please check back later or select \
                         a different lesson."
            .to_owned(),
        (None, false) => format!(
            "No lesson content available for \"{topic}\" yet. Please check back later or \
             select a different lesson."
        ),
    };

    let segment = LessonSegment {
        id: "1".into(),
        title: FALLBACK_TITLE.into(),
        content,
        content_boxes: Vec::new(),
        key_points: Vec::new(),
        question: fallback_question(),
        completed: false,
    };

    Lesson::from_valid(vec![segment])
}

/// Generic five-step path used when no titles could be recovered for `topic`.
#[must_use]
pub fn fallback_learning_path(topic: &str) -> Vec<String> {
    let topic = topic.trim();
    vec![
        format!("Introduction to {topic}"),
        format!("Core Concepts of {topic}"),
        format!("Practical Applications of {topic}"),
        format!("Advanced {topic} Techniques"),
        format!("{topic} Best Practices"),
    ]
}
