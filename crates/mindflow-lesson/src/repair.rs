//! Single-pass syntactic repair for truncated JSON.
//!
//! The repair counts opening and closing braces and brackets over the whole text and
//! appends the missing closers: every missing `}` first, then every missing `]`. It does
//! not track nesting order and does not look inside string literals, so interleaved
//! truncation such as `[{"a":[1` is closed as `[{"a":[1}]]` and still fails to parse.
//! Those inputs surface as [`ExtractError::RepairFailed`].

use std::borrow::Cow;

use serde::de::IgnoredAny;
use serde_json::Value;

use crate::error::ExtractError;

/// Append missing closing characters. Text that already parses is returned unchanged.
#[must_use]
pub fn repair(text: &str) -> Cow<'_, str> {
    if serde_json::from_str::<IgnoredAny>(text).is_ok() {
        return Cow::Borrowed(text);
    }

    let (mut open_braces, mut close_braces, mut open_brackets, mut close_brackets) =
        (0usize, 0usize, 0usize, 0usize);
    for c in text.chars() {
        match c {
            '{' => open_braces += 1,
            '}' => close_braces += 1,
            '[' => open_brackets += 1,
            ']' => close_brackets += 1,
            _ => {}
        }
    }

    let missing_braces = open_braces.saturating_sub(close_braces);
    let missing_brackets = open_brackets.saturating_sub(close_brackets);
    if missing_braces == 0 && missing_brackets == 0 {
        return Cow::Borrowed(text);
    }

    let mut repaired = String::with_capacity(text.len() + missing_braces + missing_brackets);
    repaired.push_str(text);
    repaired.extend(std::iter::repeat_n('}', missing_braces));
    repaired.extend(std::iter::repeat_n(']', missing_brackets));
    Cow::Owned(repaired)
}

/// Repair `text` once and parse the result.
///
/// # Errors
///
/// Returns [`ExtractError::RepairFailed`] if the repaired text is still not valid JSON.
pub fn repair_and_parse(text: &str) -> Result<Value, ExtractError> {
    let repaired = repair(text);
    serde_json::from_str::<Value>(&repaired).map_err(|e| ExtractError::RepairFailed(e.to_string()))
}
