use serde::{Deserialize, Serialize};

pub const DEFAULT_OPEN_TAG: &str = "<output>";
pub const DEFAULT_CLOSE_TAG: &str = "</output>";

/// Marker pair the model is asked to wrap its answer in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelTags {
    pub open: String,
    pub close: String,
}

impl Default for SentinelTags {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_TAG.into(),
            close: DEFAULT_CLOSE_TAG.into(),
        }
    }
}

impl SentinelTags {
    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Wrap `body` in the tag pair on separate lines.
    #[must_use]
    pub fn wrap(&self, body: &str) -> String {
        format!("{}\n{}\n{}", self.open, body, self.close)
    }

    /// Trimmed text between the first opening tag and the first closing tag after it.
    ///
    /// Tags match ASCII case-insensitively. Returns `None` unless both tags are present.
    #[must_use]
    pub fn inner<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.open.is_empty() || self.close.is_empty() {
            return None;
        }
        // ASCII lowercasing keeps byte offsets aligned with `text`.
        let lower = text.to_ascii_lowercase();
        let open = self.open.to_ascii_lowercase();
        let close = self.close.to_ascii_lowercase();

        let start = lower.find(&open)? + open.len();
        let len = lower[start..].find(&close)?;
        Some(text[start..start + len].trim())
    }
}
