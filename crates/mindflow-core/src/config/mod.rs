mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};
use mindflow_lesson::{ExtractionPolicy, PromptBuilder, SentinelTags};

use crate::vault::{Secret, VaultProvider};

pub const API_KEY_VAR: &str = "MINDFLOW_OPENROUTER_API_KEY";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings that cannot produce a working client.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be greater than zero");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            );
        }
        if self.chat.history_limit == 0 {
            bail!("chat.history_limit must be greater than zero");
        }
        if self.lesson.delimited
            && (self.lesson.open_tag.trim().is_empty() || self.lesson.close_tag.trim().is_empty())
        {
            bail!("lesson.open_tag and lesson.close_tag must not be empty");
        }
        if self.lesson.strategies.is_empty() {
            bail!("lesson.strategies must name at least one strategy");
        }
        Ok(())
    }

    /// Resolve sensitive configuration values through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(val) = vault.get_secret(API_KEY_VAR).await?
            && !val.trim().is_empty()
        {
            self.secrets.openrouter_api_key = Some(Secret::new(val));
        }
        Ok(())
    }

    #[must_use]
    pub fn sentinel(&self) -> Option<SentinelTags> {
        self.lesson.delimited.then(|| {
            SentinelTags::new(self.lesson.open_tag.clone(), self.lesson.close_tag.clone())
        })
    }

    #[must_use]
    pub fn extraction_policy(&self) -> ExtractionPolicy {
        ExtractionPolicy::default()
            .with_strategies(self.lesson.strategies.clone())
            .with_sentinel(self.sentinel())
            .with_repair(self.lesson.repair)
    }

    #[must_use]
    pub fn prompt_builder(&self) -> PromptBuilder {
        PromptBuilder::new(self.sentinel())
    }
}
