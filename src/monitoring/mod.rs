//! Monitoring filter.
//!
//! Decides which requests (by method) and which responses (by content type)
//! are candidates for rewriting. Built once from [`MonitoringConfig`] and
//! never mutated afterwards.

use axum::http::Method;

use crate::config::MonitoringConfig;

/// Separator some configuration sources use when flattening a list into one string.
const FLATTENED_MARKER: char = '║';

/// Length prefix that accompanies a flattened list.
const FLATTENED_PREFIX: &str = "║24║";

const DEFAULT_TYPE: &str = "text/html";

impl MonitoringConfig {
    /// Fill empty sets with the defaults (`text/html`, `GET`).
    pub fn ensure_defaults(&mut self) {
        if self.types.is_empty() {
            self.types = vec![DEFAULT_TYPE.to_string()];
        }

        if self.methods.is_empty() {
            self.methods = vec![Method::GET.to_string()];
        }
    }

    /// Re-split a set that arrived as a single flattened string.
    ///
    /// Only applies when the set has exactly one entry carrying the marker.
    pub fn ensure_proper_format(&mut self) {
        unflatten(&mut self.types);
        unflatten(&mut self.methods);
    }
}

fn unflatten(values: &mut Vec<String>) {
    if values.len() != 1 || !values[0].contains(FLATTENED_MARKER) {
        return;
    }

    let joined = values[0].replace(FLATTENED_PREFIX, "");
    *values = joined
        .split(FLATTENED_MARKER)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
}

/// Validated, defaulted filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringFilter {
    types: Vec<String>,
    methods: Vec<String>,
}

impl MonitoringFilter {
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// True when the declared content type contains one of the monitored
    /// types. An empty monitored type matches everything.
    pub fn matches_content_type(&self, content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        self.types
            .iter()
            .any(|monitored| monitored.is_empty() || content_type.contains(monitored.as_str()))
    }

    pub fn matches_method(&self, method: &Method) -> bool {
        self.methods.iter().any(|monitored| monitored == method.as_str())
    }
}

impl From<MonitoringConfig> for MonitoringFilter {
    fn from(mut config: MonitoringConfig) -> Self {
        config.ensure_proper_format();
        config.ensure_defaults();

        Self {
            types: normalize(config.types, |value| value.trim().to_ascii_lowercase()),
            methods: normalize(config.methods, |value| value.trim().to_ascii_uppercase()),
        }
    }
}

impl Default for MonitoringFilter {
    fn default() -> Self {
        Self::from(MonitoringConfig::default())
    }
}

fn normalize(values: Vec<String>, f: impl Fn(&str) -> String) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values.iter().map(|value| f(value.as_str())) {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
