use std::time::Duration;

use mindflow_lesson::sentinel::{DEFAULT_CLOSE_TAG, DEFAULT_OPEN_TAG};
use mindflow_lesson::{LessonShape, Strategy};
use mindflow_llm::openrouter::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};
use mindflow_store::DEFAULT_TTL;
use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub lesson: LessonConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Extra attempts after an HTTP 429.
    #[serde(default)]
    pub max_retries: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: 0,
            timeout: default_timeout(),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LessonConfig {
    /// Ask for and look for sentinel-tagged output.
    #[serde(default = "default_true")]
    pub delimited: bool,
    #[serde(default = "default_open_tag")]
    pub open_tag: String,
    #[serde(default = "default_close_tag")]
    pub close_tag: String,
    #[serde(default)]
    pub shape: LessonShape,
    #[serde(default = "default_true")]
    pub repair: bool,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
}

fn default_true() -> bool {
    true
}

fn default_open_tag() -> String {
    DEFAULT_OPEN_TAG.into()
}

fn default_close_tag() -> String {
    DEFAULT_CLOSE_TAG.into()
}

fn default_strategies() -> Vec<Strategy> {
    Strategy::ALL.to_vec()
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            delimited: true,
            open_tag: default_open_tag(),
            close_tag: default_close_tag(),
            shape: LessonShape::default(),
            repair: true,
            strategies: default_strategies(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    /// `SQLite` database path, or `:memory:`.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Lesson cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
}

fn default_store_path() -> String {
    "mindflow.db".into()
}

fn default_cache_ttl() -> u64 {
    DEFAULT_TTL.as_secs()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatConfig {
    /// Most recent messages sent as context, including the new one.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// Secrets resolved at runtime, never read from or written to the config file.
#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openrouter_api_key: Option<Secret>,
}
