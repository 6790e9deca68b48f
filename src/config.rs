//! # Configuration Module
//!
//! Settings are read once at startup from the process environment (a `.env`
//! file is loaded first by `main`) into a [`BotConfig`] that every handler
//! borrows. Nothing here is mutated after startup.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::knowledge::KnowledgeStore;

// Environment variable names
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_MAX_TOKENS: &str = "COMPLETION_MAX_TOKENS";
pub const ENV_TIMEOUT_SECS: &str = "COMPLETION_TIMEOUT_SECS";
pub const ENV_KNOWLEDGE_FILE: &str = "KNOWLEDGE_FILE";

/// Token value shipped in sample environments; never a real credential
pub const PLACEHOLDER_BOT_TOKEN: &str = "YOUR_DEFAULT_BOT_TOKEN";

// Constants for completion configuration
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const PROMPT_TEMPLATE_PREFIX: &str = "Answer the following query:\n";

/// Remote completion settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    /// Base URL of an OpenAI-compatible API (without the `/completions` suffix)
    pub api_base: String,
    /// Completion model identifier
    pub model: String,
    /// Maximum number of tokens in a generated answer
    pub max_tokens: u32,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl CompletionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Embed a user question into the completion prompt
pub fn build_prompt(query: &str) -> String {
    format!("{PROMPT_TEMPLATE_PREFIX}{query}")
}

/// Configuration structure for the whole bot
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram Bot API token
    pub telegram_token: String,
    /// Completion API key; fallback calls fail with an auth error without it
    pub openai_api_key: Option<String>,
    /// Remote completion settings
    pub completion: CompletionSettings,
    /// Knowledge file the tables were loaded from, if not built in
    pub knowledge_file: Option<PathBuf>,
    /// Subject catalog and canned answers
    pub knowledge: KnowledgeStore,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"[REDACTED]")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("completion", &self.completion)
            .field("knowledge_file", &self.knowledge_file)
            .field("knowledge", &self.knowledge)
            .finish()
    }
}

impl BotConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let telegram_token = match var(ENV_BOT_TOKEN) {
            Some(token) if token != PLACEHOLDER_BOT_TOKEN => token,
            _ => bail!("Bot token is missing. Set the '{ENV_BOT_TOKEN}' environment variable."),
        };

        let defaults = CompletionSettings::default();
        let completion = CompletionSettings {
            api_base: var(ENV_API_BASE).unwrap_or(defaults.api_base),
            model: var(ENV_MODEL).unwrap_or(defaults.model),
            max_tokens: parse_number(ENV_MAX_TOKENS, var(ENV_MAX_TOKENS))?
                .unwrap_or(defaults.max_tokens),
            timeout_secs: parse_number(ENV_TIMEOUT_SECS, var(ENV_TIMEOUT_SECS))?
                .unwrap_or(defaults.timeout_secs),
        };
        if completion.max_tokens == 0 {
            bail!("{ENV_MAX_TOKENS} must be greater than zero");
        }
        if completion.timeout_secs == 0 {
            bail!("{ENV_TIMEOUT_SECS} must be greater than zero");
        }

        let knowledge_file = var(ENV_KNOWLEDGE_FILE).map(PathBuf::from);
        let knowledge = match &knowledge_file {
            Some(path) => KnowledgeStore::from_json_file(path)?,
            None => KnowledgeStore::builtin()?,
        };

        Ok(Self {
            telegram_token,
            openai_api_key: var(ENV_API_KEY),
            completion,
            knowledge_file,
            knowledge,
        })
    }
}

fn parse_number<T>(name: &str, value: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("{name} must be a positive integer, got '{raw}'"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_completion_defaults_reasonable() {
        let settings = CompletionSettings::default();
        assert_eq!(settings.max_tokens, 100);
        assert!(settings.timeout_secs > 0);
        assert!(settings.timeout_secs <= 300);
        assert!(settings.api_base.starts_with("https://"));
    }

    #[test]
    fn test_prompt_template() {
        assert_eq!(
            build_prompt("Explain Entropy"),
            "Answer the following query:\nExplain Entropy"
        );
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config =
            BotConfig::from_vars(lookup(&[(ENV_BOT_TOKEN, "123:secret"), (ENV_API_KEY, "sk-secret")]))
                .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("123:secret"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_whitespace_only_values_count_as_unset() {
        let config =
            BotConfig::from_vars(lookup(&[(ENV_BOT_TOKEN, "123:abc"), (ENV_API_KEY, "   ")])).unwrap();
        assert_eq!(config.openai_api_key, None);
    }
}
