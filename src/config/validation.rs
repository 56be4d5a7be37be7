//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, sizes > 0, nonce length)
//! - Reject conflicting rewrite modes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Regex compilation is left to the settings build, which fails fatally

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::rewrite::MAX_NONCE_LENGTH;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address {:?}", config.listener.bind_address),
        ));
    }

    if config.upstream.address.parse::<axum::http::uri::Authority>().is_err() {
        errors.push(ValidationError::new(
            "upstream.address",
            format!("invalid upstream authority {:?}", config.upstream.address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }

    let rewrite = &config.rewrite;

    if rewrite.max_body_size == 0 {
        errors.push(ValidationError::new("rewrite.max_body_size", "must be greater than 0"));
    }

    for (index, rule) in rewrite.rewrites.iter().enumerate() {
        if rule.regex.is_empty() {
            errors.push(ValidationError::new(
                format!("rewrite.rewrites[{index}].regex"),
                "must not be empty",
            ));
        }
    }

    if let Some(nonce) = &rewrite.nonce {
        if !rewrite.rewrites.is_empty() {
            errors.push(ValidationError::new(
                "rewrite.nonce",
                "cannot be combined with rewrite.rewrites",
            ));
        }

        if nonce.placeholder.is_empty() {
            errors.push(ValidationError::new("rewrite.nonce.placeholder", "must not be empty"));
        }

        if nonce.length == 0 || nonce.length > MAX_NONCE_LENGTH {
            errors.push(ValidationError::new(
                "rewrite.nonce.length",
                format!("must be between 1 and {MAX_NONCE_LENGTH}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
