//! Client and session configuration with sensible defaults.
//!
//! [`GenerationConfig`] describes how to reach the generation service;
//! [`SessionConfig`] tunes how a [`Session`](crate::session::Session) reacts to
//! overlapping actions and to regenerate requests.

use std::time::Duration;

/// Base URL of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is specified.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// `generateContent` URL for a model on the public API.
pub fn model_endpoint(model: &str) -> String {
    format!("{GEMINI_API_BASE}/models/{model}:generateContent")
}

/// Connection settings for [`GeminiClient`](crate::GeminiClient).
#[derive(Clone)]
pub struct GenerationConfig {
    /// Full `generateContent` endpoint URL.
    pub endpoint: String,
    /// API key sent as the `key` query parameter. May be empty.
    pub api_key: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::for_model(DEFAULT_MODEL)
    }
}

impl GenerationConfig {
    /// Config targeting the public Gemini endpoint for `model`, with an empty key.
    pub fn for_model(model: &str) -> Self {
        Self {
            endpoint: model_endpoint(model),
            api_key: String::new(),
            request_timeout: None,
            user_agent: concat!("promptpad/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Default config with the API key taken from `GEMINI_API_KEY`.
    ///
    /// A missing variable yields an empty key, which the service may or may
    /// not accept.
    pub fn from_env() -> Self {
        Self::default().with_api_key(std::env::var(API_KEY_ENV).unwrap_or_default())
    }

    /// Point at the public endpoint for `model`.
    pub fn with_model(self, model: &str) -> Self {
        self.with_endpoint(model_endpoint(model))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// What a session does when an action arrives while a request is pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Refuse the new action with [`GenerationFailure::Busy`](crate::GenerationFailure::Busy).
    #[default]
    Reject,
    /// Issue the new request and drop the older one's response when it lands.
    Supersede,
}

/// Which template regenerate feeds back into the prompt builder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegenerateStrategy {
    /// Use the last resolved prompt as the template. Without a placeholder this
    /// nests another quoted copy of the input onto the prompt.
    #[default]
    Retemplate,
    /// Use the template the last prompt was built from.
    ReuseTemplate,
}

/// Behavioral knobs for a [`Session`](crate::session::Session).
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionConfig {
    pub pending_policy: PendingPolicy,
    pub regenerate_strategy: RegenerateStrategy,
}

impl SessionConfig {
    pub fn with_pending_policy(mut self, policy: PendingPolicy) -> Self {
        self.pending_policy = policy;
        self
    }

    pub fn with_regenerate_strategy(mut self, strategy: RegenerateStrategy) -> Self {
        self.regenerate_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_flash_model() {
        let config = GenerationConfig::default();
        assert_eq!(
            config.endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(config.api_key.is_empty());
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn with_model_rewrites_endpoint() {
        let config = GenerationConfig::default()
            .with_api_key("k")
            .with_model("gemini-2.5-pro");
        assert_eq!(config.endpoint, model_endpoint("gemini-2.5-pro"));
        assert_eq!(config.api_key, "k");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = GenerationConfig::default().with_api_key("secret-key");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn session_defaults_are_faithful() {
        let config = SessionConfig::default();
        assert_eq!(config.pending_policy, PendingPolicy::Reject);
        assert_eq!(config.regenerate_strategy, RegenerateStrategy::Retemplate);
    }

    #[test]
    fn builders_override_fields() {
        let config = GenerationConfig::for_model("gemini-pro")
            .with_endpoint("http://localhost:9/gen")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.endpoint, "http://localhost:9/gen");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));

        let session = SessionConfig::default()
            .with_pending_policy(PendingPolicy::Supersede)
            .with_regenerate_strategy(RegenerateStrategy::ReuseTemplate);
        assert_eq!(session.pending_policy, PendingPolicy::Supersede);
        assert_eq!(session.regenerate_strategy, RegenerateStrategy::ReuseTemplate);
    }
}
