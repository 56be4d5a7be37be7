//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rewrite_section() {
        let config = parse_config(
            r#"
            [upstream]
            address = "127.0.0.1:4000"

            [rewrite]
            last_modified = true

            [[rewrite.rewrites]]
            regex = "foo"
            replacement = "bar"

            [rewrite.monitoring]
            types = ["text/html", "application/json"]
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.address, "127.0.0.1:4000");
        assert!(config.rewrite.last_modified);
        assert_eq!(config.rewrite.rewrites.len(), 1);
        assert_eq!(config.rewrite.rewrites[0].replacement, "bar");
        assert_eq!(config.rewrite.monitoring.types.len(), 2);
        assert!(config.rewrite.monitoring.methods.is_empty());
        assert!(config.rewrite.nonce.is_none());
    }

    #[test]
    fn test_nonce_section_defaults() {
        let config = parse_config("[rewrite.nonce]\n").unwrap();
        let nonce = config.rewrite.nonce.unwrap();
        assert_eq!(nonce.placeholder, "DhcnhD3khTMePgXw");
        assert_eq!(nonce.length, 50);
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("timeouts.request_secs"));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(matches!(parse_config("[rewrite"), Err(ConfigError::Parse(_))));
    }
}
