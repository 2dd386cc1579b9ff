use super::models::AppConfig;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Read `path`, falling back to defaults when it is missing or invalid. The
/// annotation credential is then overridden from the environment.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return with_env_overrides(AppConfig::default());
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!("Parsed configuration from disk");
            with_env_overrides(config)
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            with_env_overrides(AppConfig::default())
        }
    }
}

fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn with_env_overrides(mut config: AppConfig) -> AppConfig {
    config.annotation = config.annotation.with_env_credential();
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, ThemeMode};
    use scholia_core::PendingPolicy;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").expect("empty config");
        assert_eq!(config.appearance.theme, ThemeMode::Night);
        assert_eq!(config.appearance.font_size, 20);
        assert_eq!(config.logging.log_level, LogLevel::Info);
        assert!(config.selection.enabled);
        assert_eq!(config.extraction.max_attempts, 3);
        assert_eq!(config.extraction.delay_ms, 500);
    }

    #[test]
    fn tables_override_their_own_fields_only() {
        let config = parse_config(
            r#"
[appearance]
theme = "day"

[book]
source = "books/alice.epub"

[annotation]
api_key = "abc"
pending_policy = "replace-pending"

[selection]
settle_delay_ms = 300

[extraction]
max_attempts = 5
"#,
        )
        .expect("config");
        assert_eq!(config.appearance.theme, ThemeMode::Day);
        assert_eq!(config.appearance.font_size, 20);
        assert_eq!(config.book.source, "books/alice.epub");
        assert_eq!(config.annotation.api_key, "abc");
        assert_eq!(config.annotation.pending_policy, PendingPolicy::ReplacePending);
        assert_eq!(config.selection.settle_delay_ms, 300);
        assert_eq!(config.selection.rediscover_interval_ms, 2000);
        assert_eq!(config.extraction.max_attempts, 5);
        assert_eq!(config.extraction.delay_ms, 500);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("[appearance\ntheme = ").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("does/not/exist/config.toml"));
        assert_eq!(config.appearance.font_size, 20);
    }
}
