use crate::error::ExtractError;
use crate::repair::repair_and_parse;
use crate::sentinel::SentinelTags;
use crate::strategy::{Strategy, candidate_from_value};
use crate::types::{Lesson, LessonSegment, segments_from_values};

/// Which strategies run, whether sentinel tags narrow the input, and whether a single
/// repair attempt is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPolicy {
    pub strategies: Vec<Strategy>,
    pub sentinel: Option<SentinelTags>,
    pub repair: bool,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            strategies: Strategy::ALL.to_vec(),
            sentinel: Some(SentinelTags::default()),
            repair: true,
        }
    }
}

impl ExtractionPolicy {
    #[must_use]
    pub fn with_strategies(mut self, strategies: impl Into<Vec<Strategy>>) -> Self {
        self.strategies = strategies.into();
        self
    }

    #[must_use]
    pub fn with_sentinel(mut self, sentinel: Option<SentinelTags>) -> Self {
        self.sentinel = sentinel;
        self
    }

    #[must_use]
    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }
}

/// Segments recovered from one response and how they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub segments: Vec<LessonSegment>,
    /// `None` when the segments came from the repair step.
    pub strategy: Option<Strategy>,
    pub delimited: bool,
    pub repaired: bool,
}

impl Extraction {
    #[must_use]
    pub fn into_lesson(self) -> Lesson {
        Lesson::from_valid(self.segments)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    policy: ExtractionPolicy,
}

impl Extractor {
    #[must_use]
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    /// Recover lesson segments from raw model output.
    ///
    /// Order: direct parse of the whole text; then, if sentinel tags are present, direct
    /// parse and one repair of the tagged block; then the remaining strategies over the
    /// tagged block (or the whole text when untagged); finally one repair of the span
    /// starting at the first `{` or `[` if no repair has run yet. A strategy counts only
    /// when it yields at least one valid segment.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::RepairFailed`] if the last attempted step was a repair that
    /// did not parse, otherwise [`ExtractError::NoStructureFound`].
    pub fn extract(&self, text: &str) -> Result<Extraction, ExtractError> {
        let direct = self.policy.strategies.contains(&Strategy::DirectParse);

        if direct && let Some(segments) = try_strategy(Strategy::DirectParse, text) {
            return Ok(found(segments, Some(Strategy::DirectParse), false, false));
        }

        let mut repair_error = None;
        let delimited_block = self
            .policy
            .sentinel
            .as_ref()
            .and_then(|tags| tags.inner(text));

        let (scope, delimited) = if let Some(inner) = delimited_block {
            tracing::debug!(len = inner.len(), "narrowing to sentinel-delimited block");
            if direct && let Some(segments) = try_strategy(Strategy::DirectParse, inner) {
                return Ok(found(segments, Some(Strategy::DirectParse), true, false));
            }
            if self.policy.repair {
                match try_repair(inner) {
                    Ok(segments) => return Ok(found(segments, None, true, true)),
                    Err(e) => repair_error = Some(e),
                }
            }
            (inner, true)
        } else {
            (text, false)
        };

        for strategy in self
            .policy
            .strategies
            .iter()
            .copied()
            .filter(|s| *s != Strategy::DirectParse)
        {
            if let Some(segments) = try_strategy(strategy, scope) {
                return Ok(found(segments, Some(strategy), delimited, false));
            }
        }

        if self.policy.repair
            && repair_error.is_none()
            && let Some(span) = repair_span(scope)
        {
            match try_repair(span) {
                Ok(segments) => return Ok(found(segments, None, delimited, true)),
                Err(e) => repair_error = Some(e),
            }
        }

        Err(repair_error.unwrap_or(ExtractError::NoStructureFound))
    }
}

fn found(
    segments: Vec<LessonSegment>,
    strategy: Option<Strategy>,
    delimited: bool,
    repaired: bool,
) -> Extraction {
    tracing::debug!(
        strategy = strategy.map_or("repair", Strategy::as_str),
        delimited,
        repaired,
        segments = segments.len(),
        "extracted lesson segments"
    );
    Extraction {
        segments,
        strategy,
        delimited,
        repaired,
    }
}

fn try_strategy(strategy: Strategy, text: &str) -> Option<Vec<LessonSegment>> {
    let Some(candidate) = strategy.apply(text) else {
        tracing::debug!(%strategy, "strategy found no JSON");
        return None;
    };
    let segments = segments_from_values(candidate);
    if segments.is_empty() {
        tracing::debug!(%strategy, "strategy found JSON without valid segments");
        return None;
    }
    Some(segments)
}

fn try_repair(text: &str) -> Result<Vec<LessonSegment>, ExtractError> {
    let value = repair_and_parse(text)?;
    let segments = candidate_from_value(value)
        .map(segments_from_values)
        .unwrap_or_default();
    if segments.is_empty() {
        return Err(ExtractError::RepairFailed(
            "repaired JSON holds no valid lesson segment".into(),
        ));
    }
    Ok(segments)
}

/// Text from the first `{` or `[` to the end.
fn repair_span(text: &str) -> Option<&str> {
    text.find(['{', '[']).map(|start| &text[start..])
}
