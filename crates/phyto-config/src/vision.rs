//! AI vision provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_provider() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

fn default_language() -> String {
    "vi".to_string()
}

const fn default_max_tokens() -> u32 {
    1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VisionConfig {
    /// Provider label reported in debug info (e.g. `openai`, `openrouter`).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Empty means the gateway is unavailable.
    #[serde(default)]
    pub api_key: String,

    /// Vision-capable model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single analysis call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default answer language when the request does not set one.
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            language: default_language(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl VisionConfig {
    /// Check if the config has the minimum required fields to call the provider.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.model.is_empty() && !self.base_url.is_empty()
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
