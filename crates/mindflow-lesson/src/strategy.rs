//! Independent recovery strategies over raw model text.
//!
//! Every strategy is a pure function of its input. None of them knows about lesson
//! segments; they only recover JSON values that the caller then interprets.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static FLAT_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());

/// JSON values recovered by one strategy, in the order they appeared.
pub type Candidate = Vec<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Parse the whole text as one array or object.
    DirectParse,
    /// Largest parseable array prefix starting at the first `[`.
    BracketScan,
    /// Every single-level `{...}` span that parses on its own.
    ObjectScan,
    /// One object per line.
    Ndjson,
    /// The span from the first `{` to the last `}`.
    SingleObject,
}

impl Strategy {
    /// Canonical order, cheapest and most precise first.
    pub const ALL: [Self; 5] = [
        Self::DirectParse,
        Self::BracketScan,
        Self::ObjectScan,
        Self::Ndjson,
        Self::SingleObject,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectParse => "direct_parse",
            Self::BracketScan => "bracket_scan",
            Self::ObjectScan => "object_scan",
            Self::Ndjson => "ndjson",
            Self::SingleObject => "single_object",
        }
    }

    #[must_use]
    pub fn apply(self, text: &str) -> Option<Candidate> {
        match self {
            Self::DirectParse => direct_parse(text),
            Self::BracketScan => bracket_scan(text),
            Self::ObjectScan => object_scan(text),
            Self::Ndjson => ndjson(text),
            Self::SingleObject => single_object(text),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flatten a parsed value: arrays yield their elements, objects yield themselves.
pub(crate) fn candidate_from_value(value: Value) -> Option<Candidate> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(items),
        obj @ Value::Object(_) => Some(vec![obj]),
        _ => None,
    }
}

#[must_use]
pub fn direct_parse(text: &str) -> Option<Candidate> {
    let value = serde_json::from_str::<Value>(text.trim()).ok()?;
    candidate_from_value(value)
}

/// Recover the largest valid array prefix from a possibly truncated response.
///
/// The right boundary shrinks one character at a time from the end of the text. Each
/// window is tried as-is and then with a single `]` appended, so a response cut off
/// after K complete elements recovers exactly those K. Quadratic in the worst case.
#[must_use]
pub fn bracket_scan(text: &str) -> Option<Candidate> {
    let start = text.find('[')?;
    let window = &text[start..];

    let mut ends: Vec<usize> = window
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .collect();
    ends.reverse();

    let mut closed = String::with_capacity(window.len() + 1);
    for end in ends {
        let slice = &window[..end];
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(slice) {
            return non_empty(items);
        }
        closed.clear();
        closed.push_str(slice);
        closed.push(']');
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&closed) {
            return non_empty(items);
        }
    }
    None
}

fn non_empty(items: Vec<Value>) -> Option<Candidate> {
    if items.is_empty() { None } else { Some(items) }
}

/// Collect every `{...}` span without an inner `}` that parses as an object.
///
/// Braces are not balanced, so an object that contains another object is never
/// recovered whole.
#[must_use]
pub fn object_scan(text: &str) -> Option<Candidate> {
    let objects: Vec<Value> = FLAT_OBJECT_RE
        .find_iter(text)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
        .collect();
    non_empty(objects)
}

#[must_use]
pub fn ndjson(text: &str) -> Option<Candidate> {
    let objects: Vec<Value> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{') && line.ends_with('}'))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(Value::is_object)
        .collect();
    non_empty(objects)
}

#[must_use]
pub fn single_object(text: &str) -> Option<Candidate> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]).ok()? {
        obj @ Value::Object(_) => Some(vec![obj]),
        _ => None,
    }
}
