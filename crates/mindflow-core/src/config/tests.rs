use std::io::Write;

use mindflow_lesson::{LessonShape, Strategy};
use serial_test::serial;

use super::*;
use crate::vault::EnvVaultProvider;

const ENV_KEYS: [&str; 12] = [
    "MINDFLOW_LLM_BASE_URL",
    "MINDFLOW_LLM_MODEL",
    "MINDFLOW_LLM_MAX_TOKENS",
    "MINDFLOW_LLM_TEMPERATURE",
    "MINDFLOW_LLM_MAX_RETRIES",
    "MINDFLOW_LLM_TIMEOUT",
    "MINDFLOW_LESSON_DELIMITED",
    "MINDFLOW_LESSON_SHAPE",
    "MINDFLOW_STORE_PATH",
    "MINDFLOW_STORE_CACHE_TTL",
    "MINDFLOW_CHAT_HISTORY_LIMIT",
    "MINDFLOW_OPENROUTER_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.llm.model, "deepseek/deepseek-r1-0528:free");
    assert_eq!(config.llm.max_tokens, 500);
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.llm.max_retries, 0);
    assert!(config.lesson.delimited);
    assert_eq!(config.lesson.open_tag, "<output>");
    assert_eq!(config.lesson.shape, LessonShape::Lesson);
    assert_eq!(config.lesson.strategies, Strategy::ALL.to_vec());
    assert_eq!(config.store.cache_ttl, 300);
    assert_eq!(config.chat.history_limit, 20);
    assert!(config.secrets.openrouter_api_key.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.llm.max_tokens, 500);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[llm]
base_url = "http://localhost:8080/v1"
model = "openai/gpt-4o-mini"
max_tokens = 2000
max_retries = 2

[lesson]
delimited = false
shape = "segment"
strategies = ["direct_parse", "bracket_scan"]

[store]
path = ":memory:"
cache_ttl = 60

[chat]
history_limit = 5
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
    assert_eq!(config.llm.model, "openai/gpt-4o-mini");
    assert_eq!(config.llm.max_tokens, 2000);
    assert_eq!(config.llm.max_retries, 2);
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert!(!config.lesson.delimited);
    assert_eq!(config.lesson.shape, LessonShape::Segment);
    assert_eq!(
        config.lesson.strategies,
        vec![Strategy::DirectParse, Strategy::BracketScan]
    );
    assert_eq!(config.store.path, ":memory:");
    assert_eq!(config.store.cache_ttl(), std::time::Duration::from_secs(60));
    assert_eq!(config.chat.history_limit, 5);
    assert!(config.sentinel().is_none());
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[llm\nmodel = ").unwrap();
    clear_env();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").unwrap();

    clear_env();
    unsafe {
        std::env::set_var("MINDFLOW_LLM_MODEL", "from-env");
        std::env::set_var("MINDFLOW_LLM_MAX_TOKENS", "900");
        std::env::set_var("MINDFLOW_LLM_TEMPERATURE", "0.2");
        std::env::set_var("MINDFLOW_LESSON_DELIMITED", "false");
        std::env::set_var("MINDFLOW_LESSON_SHAPE", "segment");
        std::env::set_var("MINDFLOW_STORE_PATH", "/tmp/x.db");
        std::env::set_var("MINDFLOW_STORE_CACHE_TTL", "10");
        std::env::set_var("MINDFLOW_CHAT_HISTORY_LIMIT", "3");
    }

    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.llm.model, "from-env");
    assert_eq!(config.llm.max_tokens, 900);
    assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    assert!(!config.lesson.delimited);
    assert_eq!(config.lesson.shape, LessonShape::Segment);
    assert_eq!(config.store.path, "/tmp/x.db");
    assert_eq!(config.store.cache_ttl, 10);
    assert_eq!(config.chat.history_limit, 3);
}

#[test]
#[serial]
fn unparseable_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("MINDFLOW_LLM_MAX_TOKENS", "lots");
        std::env::set_var("MINDFLOW_LESSON_SHAPE", "book");
    }
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("none.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.max_tokens, 500);
    assert_eq!(config.lesson.shape, LessonShape::Lesson);
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = Config::default();
    config.llm.max_tokens = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.llm.temperature = 2.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.chat.history_limit = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.lesson.close_tag = "  ".into();
    assert!(config.validate().is_err());
    config.lesson.delimited = false;
    assert!(config.validate().is_ok());

    let mut config = Config::default();
    config.lesson.strategies.clear();
    assert!(config.validate().is_err());
}

#[test]
fn extraction_policy_follows_lesson_config() {
    let mut config = Config::default();
    config.lesson.repair = false;
    config.lesson.open_tag = "<lesson>".into();
    config.lesson.close_tag = "</lesson>".into();

    let policy = config.extraction_policy();
    assert!(!policy.repair);
    assert_eq!(
        policy.sentinel,
        Some(SentinelTags::new("<lesson>", "</lesson>"))
    );
    let prompt = config
        .prompt_builder()
        .lesson_prompt("Rust", LessonShape::Segment);
    assert!(prompt.contains("<lesson>"));
}

#[tokio::test]
#[serial]
async fn resolve_secrets_reads_api_key() {
    clear_env();
    unsafe { std::env::set_var(API_KEY_VAR, "sk-or-secret") };

    let mut config = Config::default();
    config.resolve_secrets(&EnvVaultProvider).await.unwrap();
    clear_env();

    let key = config.secrets.openrouter_api_key.as_ref().unwrap();
    assert_eq!(key.expose(), "sk-or-secret");
    assert!(!format!("{:?}", config.secrets).contains("sk-or-secret"));
}

#[tokio::test]
#[serial]
async fn resolve_secrets_ignores_blank_key() {
    clear_env();
    unsafe { std::env::set_var(API_KEY_VAR, "  ") };

    let mut config = Config::default();
    config.resolve_secrets(&EnvVaultProvider).await.unwrap();
    clear_env();

    assert!(config.secrets.openrouter_api_key.is_none());
}
