use crate::session::PendingPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
/// Environment variable that overrides `api_key` from the config file.
pub const CREDENTIAL_ENV: &str = "GEMINI_API_KEY";
pub const PLACEHOLDER_CREDENTIAL: &str = "YOUR_GEMINI_API_KEY_HERE";

/// `[annotation]` section of the config file.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnnotationConfig {
    pub api_key: String,
    pub endpoint: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
    pub pending_policy: PendingPolicy,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.7,
            max_output_tokens: 1000,
            request_timeout_secs: 60,
            pending_policy: PendingPolicy::default(),
        }
    }
}

impl fmt::Debug for AnnotationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pending_policy", &self.pending_policy)
            .finish()
    }
}

impl AnnotationConfig {
    pub fn with_env_credential(self) -> Self {
        self.with_credential_from(|name| std::env::var(name).ok())
    }

    pub fn with_credential_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(CREDENTIAL_ENV).filter(|key| !key.trim().is_empty()) {
            info!("Using annotation credential from {CREDENTIAL_ENV}");
            self.api_key = key.trim().to_string();
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_CREDENTIAL
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_wire_settings() {
        let config = AnnotationConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_output_tokens, 1000);
        assert_eq!(config.pending_policy, PendingPolicy::RejectWhilePending);
        assert!(!config.is_configured());
    }

    #[test]
    fn placeholder_and_blank_keys_are_not_configured() {
        for key in ["", "   ", PLACEHOLDER_CREDENTIAL] {
            let config = AnnotationConfig {
                api_key: key.to_string(),
                ..AnnotationConfig::default()
            };
            assert!(!config.is_configured(), "{key:?} should not count");
        }
        let config = AnnotationConfig {
            api_key: "abc123".to_string(),
            ..AnnotationConfig::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn environment_credential_overrides_file_value() {
        let config = AnnotationConfig {
            api_key: "from-file".to_string(),
            ..AnnotationConfig::default()
        }
        .with_credential_from(|name| (name == CREDENTIAL_ENV).then(|| " from-env ".to_string()));
        assert_eq!(config.api_key, "from-env");

        let untouched = AnnotationConfig {
            api_key: "from-file".to_string(),
            ..AnnotationConfig::default()
        }
        .with_credential_from(|_| Some(String::new()));
        assert_eq!(untouched.api_key, "from-file");
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = AnnotationConfig {
            api_key: "secret-value".to_string(),
            ..AnnotationConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: AnnotationConfig =
            toml::from_str("api_key = \"k\"\npending_policy = \"replace-pending\"\n")
                .expect("parse");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.pending_policy, PendingPolicy::ReplacePending);
        assert_eq!(config.request_timeout_secs, 60);
    }
}
