use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_app();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("MINDFLOW_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("MINDFLOW_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("MINDFLOW_LLM_MAX_TOKENS")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_tokens = n;
        }
        if let Ok(v) = std::env::var("MINDFLOW_LLM_TEMPERATURE")
            && let Ok(t) = v.parse::<f32>()
        {
            self.llm.temperature = t;
        }
        if let Ok(v) = std::env::var("MINDFLOW_LLM_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_retries = n;
        }
        if let Ok(v) = std::env::var("MINDFLOW_LLM_TIMEOUT")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.llm.timeout = secs;
        }
    }

    fn apply_env_overrides_app(&mut self) {
        if let Ok(v) = std::env::var("MINDFLOW_LESSON_DELIMITED")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.lesson.delimited = enabled;
        }
        if let Ok(v) = std::env::var("MINDFLOW_LESSON_SHAPE") {
            match v.parse() {
                Ok(shape) => self.lesson.shape = shape,
                Err(e) => tracing::warn!("ignoring invalid MINDFLOW_LESSON_SHAPE value: {e}"),
            }
        }
        if let Ok(v) = std::env::var("MINDFLOW_STORE_PATH") {
            self.store.path = v;
        }
        if let Ok(v) = std::env::var("MINDFLOW_STORE_CACHE_TTL")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.store.cache_ttl = secs;
        }
        if let Ok(v) = std::env::var("MINDFLOW_CHAT_HISTORY_LIMIT")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chat.history_limit = n;
        }
    }
}
