//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → RewriteSettings::from_config (compile patterns, default filter)
//!     → shared via Arc by every request
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, MonitoringConfig, NonceConfig, ObservabilityConfig, ProxyConfig,
    RewriteConfig, RewriteRuleConfig, TimeoutConfig, UpstreamConfig,
};
