//! Ordered regex rewrites.

use std::borrow::Cow;

use regex::bytes::Regex;

use super::RewriteError;

/// A compiled `(pattern, replacement)` pair.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: Vec<u8>,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: impl Into<Vec<u8>>) -> Result<Self, RewriteError> {
        let compiled = Regex::new(pattern).map_err(|source| RewriteError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    /// Replace every match in `body`. `$1` / `$name` in the replacement
    /// expand to capture groups.
    pub fn apply<'a>(&self, body: &'a [u8]) -> Cow<'a, [u8]> {
        self.pattern.replace_all(body, self.replacement.as_slice())
    }
}

/// Apply `rules` in order. Each rule scans the output of the previous one.
pub fn apply_rules(rules: &[RewriteRule], body: &[u8]) -> Vec<u8> {
    rules.iter().fold(body.to_vec(), |current, rule| {
        let rewritten = match rule.apply(&current) {
            Cow::Borrowed(_) => None,
            Cow::Owned(rewritten) => Some(rewritten),
        };
        rewritten.unwrap_or(current)
    })
}
