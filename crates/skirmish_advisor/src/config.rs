//! Advisory endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how to ask for tactical advice.
///
/// Any field left out of a config file takes its default.
///
/// ```ron
/// AdvisorConfig(
///     server_url: "http://localhost:8080",
///     model: "llama-3",
///     temperature: 0.2,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Base URL of the completion server.
    pub server_url: String,
    /// Path appended to `server_url`.
    pub endpoint: String,
    /// Model name sent with every request.
    pub model: String,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// System message sent ahead of every prompt.
    pub system_prompt: String,
    /// Seconds to wait for a reply before giving up.
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            endpoint: "/v1/chat/completions".to_string(),
            model: "llama-3".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            system_prompt: "You are a tactical AI assistant for an RTS game. Analyze the game \
                            state and provide strategic recommendations."
                .to_string(),
            timeout_secs: 30,
        }
    }
}

impl AdvisorConfig {
    /// Full request URL.
    #[must_use]
    pub fn full_url(&self) -> String {
        format!("{}{}", self.server_url, self.endpoint)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.full_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.model, "llama-3");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.system_prompt.starts_with("You are a tactical AI assistant"));
    }
}
