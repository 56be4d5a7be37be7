//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy
//! and its rewrite pipeline. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response body rewriting.
    pub rewrite: RewriteConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Response rewriting configuration.
///
/// Either `rewrites` or `nonce` drives the body rewrite, never both.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Keep the upstream `Last-Modified` header.
    pub last_modified: bool,

    /// Ordered regex rewrites applied to the decoded body.
    pub rewrites: Vec<RewriteRuleConfig>,

    /// CSP nonce substitution.
    pub nonce: Option<NonceConfig>,

    /// Which requests and responses are candidates for rewriting.
    pub monitoring: MonitoringConfig,

    /// Largest body, in bytes, buffered for rewriting.
    pub max_body_size: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            last_modified: false,
            rewrites: Vec::new(),
            nonce: None,
            monitoring: MonitoringConfig::default(),
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// One regex rewrite.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteRuleConfig {
    /// Pattern matched against the body.
    pub regex: String,

    /// Replacement; `$1` / `$name` expand capture groups.
    pub replacement: String,
}

/// CSP nonce substitution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NonceConfig {
    /// Placeholder pattern replaced by the per-response nonce.
    pub placeholder: String,

    /// Number of characters in a generated nonce.
    pub length: usize,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            placeholder: "DhcnhD3khTMePgXw".to_string(),
            length: 50,
        }
    }
}

/// Raw monitoring sets. Empty sets are defaulted when the filter is built.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Content types (substring match) eligible for rewriting.
    pub types: Vec<String>,

    /// Request methods eligible for rewriting.
    pub methods: Vec<String>,
}
