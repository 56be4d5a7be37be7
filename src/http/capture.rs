//! Response capture.
//!
//! # Responsibilities
//! - Stand in for the real sink so upstream writes are buffered
//! - Strip `Content-Length` (and `Last-Modified` unless kept) on header write
//! - Substitute the CSP nonce into policy headers on header write
//! - Report whether the buffered response may be decoded and rewritten
//! - Perform the single terminal write to the real sink
//!
//! # Design Decisions
//! - Composition, not embedding: the wrapper owns the sink and forwards
//!   only what it does not override
//! - Terminal writes consume the wrapper, so a response is finalized once
//! - Hijack/flush are optional and surface `SinkError::NotSupported`

use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use bytes::{Bytes, BytesMut};
use hyper::upgrade::OnUpgrade;

use crate::codec::{self, CodecError, Encoded, Encoding};
use crate::http::sink::{ResponseSink, SinkError};
use crate::pipeline::RewriteSettings;
use crate::rewrite::has_csp;

/// A response buffered in full before anything reaches the real sink.
#[derive(Debug)]
pub struct CapturedResponse<'a, W> {
    sink: W,
    settings: &'a RewriteSettings,
    buffer: BytesMut,
    status: StatusCode,
    wrote_header: bool,
    nonce: Option<String>,
}

impl<'a, W: ResponseSink> CapturedResponse<'a, W> {
    pub fn new(sink: W, settings: &'a RewriteSettings) -> Self {
        Self {
            sink,
            settings,
            buffer: BytesMut::new(),
            status: StatusCode::OK,
            wrote_header: false,
            nonce: None,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        self.sink.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw bytes written by the upstream so far.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Nonce generated for this response, if a CSP header carried the placeholder.
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Buffer `data`. The first write commits a `200` if no status was written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        self.buffer.extend_from_slice(data);
        data.len()
    }

    /// Commit status and headers. Only the first call has any effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            return;
        }

        let headers = self.sink.headers_mut();

        if !self.settings.last_modified() {
            headers.remove(LAST_MODIFIED);
        }

        // The final length is only known once the body has been rewritten.
        headers.remove(CONTENT_LENGTH);

        if let Some(rule) = self.settings.engine().nonce_rule() {
            if has_csp(headers) {
                let nonce = rule.generate();
                // An empty nonce leaves the policy and the body untouched.
                if !nonce.is_empty() {
                    rule.rewrite_headers(headers, &nonce);
                    self.nonce = Some(nonce);
                }
            }
        }

        self.status = status;
        self.wrote_header = true;
        self.sink.write_header(status);
    }

    /// Declared content type, empty when missing or unreadable.
    pub fn content_type(&self) -> &str {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    /// Declared content encoding. Several codings, or an unreadable value,
    /// count as unsupported.
    pub fn content_encoding(&self) -> Encoding {
        let values: Vec<_> = self.headers().get_all(CONTENT_ENCODING).iter().collect();
        match values.as_slice() {
            [] => Encoding::Identity,
            [value] => match value.to_str() {
                Ok(name) => Encoding::parse(name),
                Err(_) => Encoding::Unsupported(String::from_utf8_lossy(value.as_bytes()).into()),
            },
            many => Encoding::Unsupported(
                many.iter()
                    .map(|value| String::from_utf8_lossy(value.as_bytes()))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }

    /// Whether the buffered response may be decoded and rewritten.
    pub fn supports_processing(&self) -> bool {
        self.settings.filter().matches_content_type(self.content_type())
            && self.content_encoding().is_supported()
    }

    /// The buffered body, decoded.
    pub fn content(&self) -> Result<Bytes, CodecError> {
        codec::decode(&self.buffer, &self.content_encoding())
    }

    /// Send the buffered bytes unchanged.
    pub fn emit_raw(mut self) -> W {
        let body = std::mem::take(&mut self.buffer);
        self.commit(&body);
        self.sink
    }

    /// Encode `data` with `encoding` and send it. `Content-Encoding` follows
    /// what was actually produced.
    pub fn set_content(self, data: Bytes, encoding: &Encoding) -> W {
        let encoded = codec::encode(data, encoding);
        self.set_encoded(encoded, encoding)
    }

    /// Send an already encoded body that targeted `encoding`. A `Plain`
    /// result for a compressing encoding drops `Content-Encoding`.
    pub(crate) fn set_encoded(mut self, encoded: Encoded, encoding: &Encoding) -> W {
        match (&encoded, encoding) {
            (Encoded::Compressed(_), _) => {
                if let Ok(value) = HeaderValue::from_str(encoding.as_str()) {
                    self.sink.headers_mut().insert(CONTENT_ENCODING, value);
                }
            }
            (Encoded::Plain(_), Encoding::Gzip | Encoding::Deflate) => {
                self.sink.headers_mut().remove(CONTENT_ENCODING);
            }
            (Encoded::Plain(_), _) => {}
        }

        self.commit(&encoded.into_bytes());
        self.sink
    }

    /// Give up on the capture: the sink and whatever was buffered.
    pub fn into_parts(self) -> (W, Bytes) {
        (self.sink, self.buffer.freeze())
    }

    pub fn try_hijack(&mut self) -> Result<OnUpgrade, SinkError> {
        self.sink.hijack()
    }

    pub fn try_flush(&mut self) -> Result<(), SinkError> {
        self.write_header(self.status);
        self.sink.flush()
    }

    fn commit(&mut self, data: &[u8]) {
        if !self.wrote_header {
            self.write_header(self.status);
        }

        if let Err(err) = self.sink.write(data) {
            tracing::error!(error = %err, "Unable to write response body");
        }
    }
}
