//! Recovery of a flat list of lesson titles.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::extractor::ExtractionPolicy;
use crate::fallback::fallback_learning_path;
use crate::strategy::Strategy;

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*])\s+(.+?)\s*$").unwrap());

const MIN_LIST_ITEMS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "strategy")]
pub enum PathSource {
    Extracted(Strategy),
    /// Numbered or bulleted plain-text lines.
    List,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningPath {
    pub titles: Vec<String>,
    pub source: PathSource,
}

impl LearningPath {
    #[must_use]
    pub fn fallback(topic: &str) -> Self {
        Self {
            titles: fallback_learning_path(topic),
            source: PathSource::Fallback,
        }
    }
}

/// Recover lesson titles from model output, falling back to a generic path for `topic`.
///
/// Narrows to the sentinel-delimited block when `policy` has tags and they are present,
/// then tries `policy.strategies` in order, collecting string elements or object `title`
/// fields. Marked list lines come next, then the fallback. Never empty.
#[must_use]
pub fn extract_learning_path(text: &str, topic: &str, policy: &ExtractionPolicy) -> LearningPath {
    let scope = policy
        .sentinel
        .as_ref()
        .and_then(|tags| tags.inner(text))
        .unwrap_or(text);

    for &strategy in &policy.strategies {
        let Some(values) = strategy.apply(scope) else {
            continue;
        };
        let titles = titles_from_values(values);
        if !titles.is_empty() {
            tracing::debug!(%strategy, count = titles.len(), "extracted learning path");
            return LearningPath {
                titles,
                source: PathSource::Extracted(strategy),
            };
        }
    }

    let items = list_items(scope);
    if items.len() >= MIN_LIST_ITEMS {
        tracing::debug!(count = items.len(), "extracted learning path from list lines");
        return LearningPath {
            titles: items,
            source: PathSource::List,
        };
    }

    tracing::warn!(topic, "no learning path titles found, using fallback");
    LearningPath::fallback(topic)
}

fn titles_from_values(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s),
            Value::Object(mut map) => match map.remove("title") {
                Some(Value::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        })
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| LIST_ITEM_RE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .collect()
}
