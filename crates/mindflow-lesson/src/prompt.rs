use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::sentinel::SentinelTags;

/// Tutoring persona sent as the system message with every request.
pub const SYSTEM_PROMPT: &str = "\
You are Nova, an AI learning assistant for MindFlow, a mobile learning platform. \
You help users learn new topics by:

1. Breaking down complex concepts into digestible parts
2. Providing clear explanations with examples
3. Suggesting learning paths and resources
4. Encouraging users and tracking their progress
5. Adapting to different learning styles

Keep responses concise but helpful, and always maintain an encouraging, friendly tone. \
Focus on practical learning advice and actionable next steps.";

const SEGMENT_EXAMPLE: &str = r#"{
  "id": "1",
  "title": "What is a Supernova?",
  "content": "A supernova is the explosive death of a massive star. For a few weeks it can outshine its whole galaxy.",
  "keyPoints": ["Massive stars end in supernovae", "They briefly outshine galaxies", "They scatter heavy elements"],
  "question": {
    "text": "What is a supernova?",
    "options": ["A new star forming", "The explosive death of a star", "A type of planet", "A comet"],
    "correctAnswer": 1,
    "explanation": "A supernova happens when a massive star collapses and explodes."
  },
  "completed": false
}"#;

const SEGMENT_FIELDS: &str = "\
- id (string)
- title (string)
- content (string)
- keyPoints (array of 3-5 strings)
- question (object with text, options as an array of strings, correctAnswer as the \
zero-based index of the right option, explanation)
- completed (boolean, always false)
";

/// Structural shape requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonShape {
    /// One section as a bare object.
    Segment,
    /// A multi-section lesson as an array.
    #[default]
    Lesson,
}

impl std::str::FromStr for LessonShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment" => Ok(Self::Segment),
            "lesson" => Ok(Self::Lesson),
            other => Err(format!("unknown lesson shape: {other}")),
        }
    }
}

/// Builds the user prompts. Pure: the output depends only on the topic, the shape and
/// the configured tags.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    sentinel: Option<SentinelTags>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            sentinel: Some(SentinelTags::default()),
        }
    }
}

impl PromptBuilder {
    #[must_use]
    pub fn new(sentinel: Option<SentinelTags>) -> Self {
        Self { sentinel }
    }

    #[must_use]
    pub fn sentinel(&self) -> Option<&SentinelTags> {
        self.sentinel.as_ref()
    }

    #[must_use]
    pub fn lesson_prompt(&self, topic: &str, shape: LessonShape) -> String {
        let topic = topic.trim();
        let mut out = String::new();

        match shape {
            LessonShape::Segment => {
                out.push_str(
                    "Return a single lesson section as a JSON object, not in an array, with:\n",
                );
                out.push_str(SEGMENT_FIELDS);
                if let Some(tags) = &self.sentinel {
                    let _ = writeln!(
                        out,
                        "Enclose the object in {}...{} tags.",
                        tags.open, tags.close
                    );
                }
                out.push_str("Keep the content under 2 sentences.\n\n");
            }
            LessonShape::Lesson => {
                let _ = writeln!(
                    out,
                    "Create a detailed, multi-section lesson for the topic \"{topic}\". \
                     Return a JSON array where each item is an object with:"
                );
                out.push_str(SEGMENT_FIELDS);
                if let Some(tags) = &self.sentinel {
                    let _ = writeln!(
                        out,
                        "Enclose the array in {}...{} tags.",
                        tags.open, tags.close
                    );
                }
                out.push('\n');
            }
        }

        let example = match shape {
            LessonShape::Segment => SEGMENT_EXAMPLE.to_owned(),
            LessonShape::Lesson => format!("[\n{SEGMENT_EXAMPLE}\n]"),
        };
        out.push_str("Example:\n");
        match &self.sentinel {
            Some(tags) => out.push_str(&tags.wrap(&example)),
            None => out.push_str(&example),
        }

        let _ = write!(out, "\n\nTopic: {topic}");
        out
    }

    /// Ask for 5-7 lesson titles as a JSON array of strings.
    #[must_use]
    pub fn learning_path_prompt(&self, topic: &str) -> String {
        let mut out = format!(
            "Create a structured learning path for \"{}\". Provide 5-7 specific steps or \
             subtopics that would help someone learn this effectively. Return only a JSON \
             array of short title strings, for example [\"Introduction\", \"Basics\"].",
            topic.trim()
        );
        if let Some(tags) = &self.sentinel {
            let _ = write!(out, " Enclose the array in {}...{} tags.", tags.open, tags.close);
        }
        out
    }
}
