//! Validated, immutable pipeline settings.

use std::sync::Arc;

use axum::http::{header::UPGRADE, HeaderMap, Request};

use crate::config::RewriteConfig;
use crate::monitoring::MonitoringFilter;
use crate::rewrite::{
    NonceRule, NonceSource, RandomNonce, RewriteEngine, RewriteError, RewriteRule, MAX_NONCE_LENGTH,
};

/// Everything a request needs from configuration, built once.
#[derive(Debug)]
pub struct RewriteSettings {
    engine: RewriteEngine,
    filter: MonitoringFilter,
    last_modified: bool,
    max_body_size: usize,
}

impl RewriteSettings {
    /// Compile patterns and default the monitoring filter.
    ///
    /// Nonces come from [`RandomNonce`]. Fails when both rewrite modes are
    /// configured or the nonce settings would produce an empty nonce.
    pub fn from_config(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let length = config.nonce.as_ref().map(|nonce| nonce.length).unwrap_or_default();
        Self::with_nonce_source(config, Arc::new(RandomNonce::new(length)))
    }

    /// Same as [`RewriteSettings::from_config`] with a caller supplied nonce source.
    pub fn with_nonce_source(
        config: &RewriteConfig,
        source: Arc<dyn NonceSource>,
    ) -> Result<Self, RewriteError> {
        let engine = match &config.nonce {
            Some(nonce) => {
                if !config.rewrites.is_empty() {
                    return Err(RewriteError::InvalidSetting {
                        field: "rewrite.nonce",
                        message: "cannot be combined with rewrite.rewrites".into(),
                    });
                }
                if nonce.placeholder.is_empty() {
                    return Err(RewriteError::InvalidSetting {
                        field: "rewrite.nonce.placeholder",
                        message: "must not be empty".into(),
                    });
                }
                if nonce.length == 0 || nonce.length > MAX_NONCE_LENGTH {
                    return Err(RewriteError::InvalidSetting {
                        field: "rewrite.nonce.length",
                        message: format!("must be between 1 and {MAX_NONCE_LENGTH}"),
                    });
                }
                RewriteEngine::Nonce(NonceRule::new(&nonce.placeholder, source)?)
            }
            None => RewriteEngine::Rules(
                config
                    .rewrites
                    .iter()
                    .map(|rule| RewriteRule::new(&rule.regex, rule.replacement.as_bytes()))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Self {
            engine,
            filter: MonitoringFilter::from(config.monitoring.clone()),
            last_modified: config.last_modified,
            max_body_size: config.max_body_size,
        })
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }

    pub fn filter(&self) -> &MonitoringFilter {
        &self.filter
    }

    pub fn last_modified(&self) -> bool {
        self.last_modified
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Whether a request should go through capture at all.
    ///
    /// WebSocket upgrades and unmonitored methods go straight upstream.
    pub fn supports_request<B>(&self, request: &Request<B>) -> bool {
        self.filter.matches_method(request.method()) && !is_websocket_upgrade(request.headers())
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get_all(UPGRADE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains("websocket"))
}
