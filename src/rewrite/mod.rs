//! Body rewrite engine.
//!
//! # Responsibilities
//! - Compile configured patterns once, at construction time
//! - Apply ordered regex rewrites to a decoded body
//! - Substitute a per-response CSP nonce in headers and body
//!
//! # Design Decisions
//! - Rules are sequential: each one scans the previous rule's output
//! - An invalid pattern is fatal; there is no partially valid rule set
//! - Nonce mode never rewrites the body without a nonce from the headers

pub mod nonce;
pub mod rule;

pub use nonce::{has_csp, NonceRule, NonceSource, RandomNonce, CSP_HEADERS, MAX_NONCE_LENGTH};
pub use rule::{apply_rules, RewriteRule};

/// Rewrite construction errors.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("error compiling regex {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid rewrite setting {field}: {message}")]
    InvalidSetting {
        field: &'static str,
        message: String,
    },
}

/// How a decoded body is rewritten.
#[derive(Debug, Clone)]
pub enum RewriteEngine {
    /// Ordered regex rewrites.
    Rules(Vec<RewriteRule>),
    /// A single placeholder replaced with the response's CSP nonce.
    Nonce(NonceRule),
}

impl RewriteEngine {
    pub fn nonce_rule(&self) -> Option<&NonceRule> {
        match self {
            RewriteEngine::Nonce(rule) => Some(rule),
            RewriteEngine::Rules(_) => None,
        }
    }

    /// Rewrite `body`, or `None` when there is nothing to do: the body is
    /// empty, or nonce mode has no usable nonce for this response.
    pub fn rewrite(&self, body: &[u8], nonce: Option<&str>) -> Option<Vec<u8>> {
        if body.is_empty() {
            return None;
        }

        match self {
            RewriteEngine::Rules(rules) => Some(apply_rules(rules, body)),
            RewriteEngine::Nonce(rule) => nonce
                .filter(|nonce| !nonce.is_empty())
                .map(|nonce| rule.rewrite_body(body, nonce)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_body_short_circuits() {
        let engine = RewriteEngine::Rules(vec![RewriteRule::new("^", "x").unwrap()]);
        assert_eq!(engine.rewrite(b"", None), None);
    }

    #[test]
    fn test_nonce_mode_requires_nonce() {
        let rule = NonceRule::new("foo", Arc::new(RandomNonce::new(8))).unwrap();
        let engine = RewriteEngine::Nonce(rule);

        assert_eq!(engine.rewrite(b"foo", None), None);
        assert_eq!(engine.rewrite(b"foo", Some("abc")), Some(b"abc".to_vec()));
    }

    #[test]
    fn test_empty_nonce_leaves_placeholder() {
        let rule = NonceRule::new("foo", Arc::new(RandomNonce::new(8))).unwrap();
        let engine = RewriteEngine::Nonce(rule);

        assert_eq!(engine.rewrite(b"<script nonce=foo>", Some("")), None);
    }
}
