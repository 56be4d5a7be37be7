//! Response body rewriting for HTTP services.
//!
//! The pipeline captures eligible upstream responses, decodes them, applies
//! ordered regex rewrites or a per-response CSP nonce, and re-encodes them
//! with the encoding the upstream chose. It ships as a tower layer
//! ([`RewriteBodyLayer`]) and as a single-upstream reverse proxy
//! ([`HttpServer`]).

// Rewrite core
pub mod codec;
pub mod monitoring;
pub mod pipeline;
pub mod rewrite;

// Host integration
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{RewriteBody, RewriteBodyLayer, RewriteSettings};
