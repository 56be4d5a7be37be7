use std::sync::Arc;

use tower::Layer;

use crate::config::RewriteConfig;
use crate::pipeline::service::RewriteBody;
use crate::pipeline::settings::RewriteSettings;
use crate::rewrite::RewriteError;

/// Applies [`RewriteBody`] to a service.
#[derive(Debug, Clone)]
pub struct RewriteBodyLayer {
    settings: Arc<RewriteSettings>,
}

impl RewriteBodyLayer {
    pub fn new(settings: RewriteSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// Build the settings from raw configuration. Fails on the first pattern
    /// that does not compile.
    pub fn from_config(config: &RewriteConfig) -> Result<Self, RewriteError> {
        RewriteSettings::from_config(config).map(Self::new)
    }

    pub fn settings(&self) -> &RewriteSettings {
        &self.settings
    }
}

impl<S> Layer<S> for RewriteBodyLayer {
    type Service = RewriteBody<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteBody::new(inner, self.settings.clone())
    }
}
