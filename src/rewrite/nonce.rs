//! CSP nonce substitution.
//!
//! One nonce is generated per response, at header-write time, and reused
//! for the `Content-Security-Policy` headers and for the body so both carry
//! byte-identical values.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use rand::Rng;
use regex::bytes::{NoExpand, Regex};

use super::RewriteError;

/// Headers whose placeholder is replaced by the nonce.
pub const CSP_HEADERS: [HeaderName; 2] = [
    axum::http::header::CONTENT_SECURITY_POLICY,
    axum::http::header::CONTENT_SECURITY_POLICY_REPORT_ONLY,
];

/// Longest nonce a configuration may ask for.
pub const MAX_NONCE_LENGTH: usize = 256;

const NONCE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

/// Produces nonce values.
pub trait NonceSource: Send + Sync + fmt::Debug {
    fn generate(&self) -> String;
}

/// Random nonces drawn from the thread-local CSPRNG.
#[derive(Debug, Clone)]
pub struct RandomNonce {
    length: usize,
}

impl RandomNonce {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl NonceSource for RandomNonce {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Placeholder pattern plus the source of its replacement.
#[derive(Debug, Clone)]
pub struct NonceRule {
    placeholder: Regex,
    source: Arc<dyn NonceSource>,
}

impl NonceRule {
    pub fn new(placeholder: &str, source: Arc<dyn NonceSource>) -> Result<Self, RewriteError> {
        let compiled = Regex::new(placeholder).map_err(|source| RewriteError::InvalidPattern {
            pattern: placeholder.to_string(),
            source,
        })?;

        Ok(Self {
            placeholder: compiled,
            source,
        })
    }

    pub fn generate(&self) -> String {
        self.source.generate()
    }

    /// Replace the placeholder in every CSP header value.
    ///
    /// Returns false, and leaves the map untouched, when no CSP header is present.
    pub fn rewrite_headers(&self, headers: &mut HeaderMap, nonce: &str) -> bool {
        let mut found = false;

        for name in CSP_HEADERS {
            let values: Vec<HeaderValue> = headers
                .get_all(&name)
                .iter()
                .map(|value| self.rewrite_header_value(value, nonce))
                .collect();

            if values.is_empty() {
                continue;
            }

            found = true;
            headers.remove(&name);
            for value in values {
                headers.append(name.clone(), value);
            }
        }

        found
    }

    fn rewrite_header_value(&self, value: &HeaderValue, nonce: &str) -> HeaderValue {
        let rewritten = self.placeholder.replace_all(value.as_bytes(), NoExpand(nonce.as_bytes()));
        HeaderValue::from_bytes(&rewritten).unwrap_or_else(|_| {
            tracing::warn!("Nonce produced an invalid header value, keeping the original");
            value.clone()
        })
    }

    /// Replace the placeholder in the body. The nonce is inserted literally.
    pub fn rewrite_body(&self, body: &[u8], nonce: &str) -> Vec<u8> {
        self.placeholder
            .replace_all(body, NoExpand(nonce.as_bytes()))
            .into_owned()
    }
}

/// True when the response carries an enforcing or report-only CSP.
pub fn has_csp(headers: &HeaderMap) -> bool {
    CSP_HEADERS.iter().any(|name| headers.contains_key(name))
}
