use serde::Serialize;

use crate::extractor::{ExtractionPolicy, Extractor};
use crate::fallback::fallback_lesson;
use crate::strategy::Strategy;
use crate::types::Lesson;

/// Where a delivered lesson came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Origin {
    Extracted {
        /// `None` when the segments came from the repair step.
        strategy: Option<Strategy>,
        delimited: bool,
        repaired: bool,
    },
    Fallback,
}

impl Origin {
    #[must_use]
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Why extraction failed, kept for debugging and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub error: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonOutcome {
    pub lesson: Lesson,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

/// Extraction followed by fallback. Stateless: the same input always gives the same
/// outcome.
#[derive(Debug, Clone, Default)]
pub struct LessonPipeline {
    extractor: Extractor,
}

impl LessonPipeline {
    #[must_use]
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self {
            extractor: Extractor::new(policy),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ExtractionPolicy {
        self.extractor.policy()
    }

    /// Turn raw model output into a lesson. Never fails and never returns an empty lesson.
    #[must_use]
    pub fn run(&self, raw: &str, topic: &str) -> LessonOutcome {
        match self.extractor.extract(raw) {
            Ok(extraction) => {
                let origin = Origin::Extracted {
                    strategy: extraction.strategy,
                    delimited: extraction.delimited,
                    repaired: extraction.repaired,
                };
                LessonOutcome {
                    lesson: extraction.into_lesson(),
                    origin,
                    diagnostic: None,
                }
            }
            Err(e) => {
                tracing::warn!(topic, error = %e, raw_len = raw.len(), "using fallback lesson");
                let error = e.to_string();
                LessonOutcome {
                    lesson: fallback_lesson(topic, Some(&error)),
                    origin: Origin::Fallback,
                    diagnostic: Some(Diagnostic {
                        error,
                        raw: raw.to_owned(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::{any, prop, prop_assert, prop_assert_eq, proptest};
    use proptest::strategy::Strategy as _;

    use super::*;
    use crate::fallback::{FALLBACK_CORRECT_ANSWER, FALLBACK_TITLE};
    use crate::repair::repair;
    use crate::types::tests::segment;
    use crate::types::{CheckQuestion, LessonSegment};

    const SCENARIO: &str = r#"[{"id":"1","title":"Test","content":"...","keyPoints":["A"],"question":{"text":"Q?","options":["A"],"correctAnswer":0,"explanation":"E"},"completed":false}]"#;

    fn run(raw: &str) -> LessonOutcome {
        LessonPipeline::default().run(raw, "Testing")
    }

    #[test]
    fn scenario_direct_array() {
        let outcome = run(SCENARIO);
        assert_eq!(outcome.lesson.segments().len(), 1);
        assert_eq!(outcome.lesson.first().title, "Test");
        assert_eq!(outcome.lesson.first().question.correct_answer, 0);
        assert!(outcome.diagnostic.is_none());
    }

    #[test]
    fn scenario_truncated_second_object() {
        let second = SCENARIO
            .trim_start_matches('[')
            .trim_end_matches(']')
            .replace(r#""id":"1""#, r#""id":"2""#);
        let full = format!("{},{second}]", &SCENARIO[..SCENARIO.len() - 1]);
        let cut = full.len() - second.len() / 2;
        let outcome = run(&full[..cut]);
        assert_eq!(outcome.lesson.segments().len(), 1);
        assert_eq!(outcome.lesson.first().id, "1");
        assert_eq!(
            outcome.origin,
            Origin::Extracted {
                strategy: Some(Strategy::BracketScan),
                delimited: false,
                repaired: false
            }
        );
    }

    #[test]
    fn scenario_plain_text_falls_back() {
        let outcome = run("This is just plain text.");
        assert!(outcome.origin.is_fallback());
        let seg = outcome.lesson.first();
        assert_eq!(seg.title, FALLBACK_TITLE);
        assert_eq!(seg.question.correct_answer, FALLBACK_CORRECT_ANSWER);
        assert_eq!(seg.question.options[FALLBACK_CORRECT_ANSWER], "All of the above");
        let diagnostic = outcome.diagnostic.unwrap();
        assert_eq!(diagnostic.raw, "This is just plain text.");
        assert!(!diagnostic.error.is_empty());
    }

    #[test]
    fn scenario_delimited_single_object() {
        let object = SCENARIO.trim_start_matches('[').trim_end_matches(']');
        let outcome = run(&format!("Here you go!\n<output>{object}</output>\nHave fun."));
        assert_eq!(outcome.lesson.segments().len(), 1);
        assert_eq!(outcome.lesson.first().title, "Test");
        assert!(matches!(
            outcome.origin,
            Origin::Extracted { delimited: true, .. }
        ));
    }

    #[test]
    fn completed_segments_survive_a_round_trip() {
        let mut done = segment("1", "Done");
        done.completed = true;
        let lesson = Lesson::new(vec![done, segment("2", "Next")]).unwrap();

        let outcome = run(&serde_json::to_string(&lesson).unwrap());
        assert_eq!(outcome.lesson, lesson);
        assert!(outcome.lesson.first().completed);
    }

    #[test]
    fn repeated_ids_are_renamed_not_dropped() {
        let object = SCENARIO.trim_start_matches('[').trim_end_matches(']');
        let outcome = run(&format!("[{object},{object}]"));
        let ids: Vec<&str> = outcome.lesson.segments().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "segment-2"]);
    }

    #[test]
    fn empty_input_falls_back() {
        let outcome = run("");
        assert!(outcome.origin.is_fallback());
        assert_eq!(outcome.lesson.segments().len(), 1);
    }

    #[test]
    fn outcome_serializes_origin_tag() {
        let value = serde_json::to_value(run(SCENARIO)).unwrap();
        assert_eq!(value["origin"]["kind"], "extracted");
        assert_eq!(value["origin"]["strategy"], "direct_parse");
        assert!(value.get("diagnostic").is_none());
    }

    fn text() -> impl proptest::strategy::Strategy<Value = String> {
        "[a-zA-Z0-9 .,?!]{0,24}"
    }

    fn question() -> impl proptest::strategy::Strategy<Value = CheckQuestion> {
        (text(), prop::collection::vec(text(), 1..5), text()).prop_flat_map(
            |(q, options, explanation)| {
                let len = options.len();
                (0..len).prop_map(move |correct_answer| CheckQuestion {
                    text: q.clone(),
                    options: options.clone(),
                    correct_answer,
                    explanation: explanation.clone(),
                })
            },
        )
    }

    fn lesson(max: usize) -> impl proptest::strategy::Strategy<Value = Lesson> {
        prop::collection::vec(
            (
                "[a-z0-9-]{1,6}",
                text(),
                text(),
                prop::collection::vec(text(), 0..4),
                question(),
                any::<bool>(),
            ),
            1..=max,
        )
        .prop_map(|parts| {
            let segments = parts
                .into_iter()
                .enumerate()
                .map(
                    |(i, (id, title, content, key_points, question, completed))| LessonSegment {
                        // position suffix keeps generated ids unique
                        id: format!("{id}.{i}"),
                        title,
                        content,
                        content_boxes: Vec::new(),
                        key_points,
                        question,
                        completed,
                    },
                )
                .collect();
            Lesson::new(segments).unwrap()
        })
    }

    proptest! {
        #[test]
        fn never_panics_and_never_empty(raw in any::<String>()) {
            let outcome = run(&raw);
            prop_assert!(!outcome.lesson.segments().is_empty());
            prop_assert!(outcome.lesson.segments().iter().all(LessonSegment::is_valid));
        }

        #[test]
        fn structured_noise_keeps_indices_valid(
            raw in r#"[\[\]{}",:0-9a-z ]{0,64}"#,
            answer in 0usize..6,
        ) {
            let text = format!(
                r#"{raw}{{"title":"t","question":{{"text":"q","options":["a","b"],"correctAnswer":{answer}}}}}"#
            );
            let outcome = run(&text);
            for seg in outcome.lesson.segments() {
                prop_assert!(seg.question.correct_answer < seg.question.options.len());
            }
        }

        #[test]
        fn round_trip(lesson in lesson(4)) {
            let text = serde_json::to_string(&lesson).unwrap();
            let outcome = run(&text);
            prop_assert_eq!(outcome.lesson, lesson);
            prop_assert_eq!(
                outcome.origin,
                Origin::Extracted { strategy: Some(Strategy::DirectParse), delimited: false, repaired: false }
            );
        }

        #[test]
        fn truncation_recovers_complete_prefix(
            lesson in lesson(5).prop_filter("needs two segments", |l| l.segments().len() >= 2),
            k_seed in any::<prop::sample::Index>(),
            cut_seed in any::<prop::sample::Index>(),
        ) {
            let segments = lesson.segments();
            let n = segments.len();
            let k = 1 + k_seed.index(n - 1);

            let encoded: Vec<String> = segments
                .iter()
                .map(|s| serde_json::to_string(s).unwrap())
                .collect();
            let prefix = format!("[{}", encoded[..k].join(","));
            let rest = format!(",{}]", encoded[k..].join(","));
            let full = format!("{prefix}{rest}");

            // Cut anywhere after segment k closes and before segment k + 1 closes.
            let span = 1 + encoded[k].len();
            let cut = prefix.len() + cut_seed.index(span);
            let outcome = run(&full[..cut]);

            prop_assert_eq!(outcome.lesson.segments(), &segments[..k]);
        }

        #[test]
        fn repair_is_a_no_op_on_valid_json(lesson in lesson(3)) {
            let text = serde_json::to_string(&lesson).unwrap();
            let repaired = repair(&text);
            prop_assert_eq!(repaired.as_ref(), text.as_str());
        }
    }
}
