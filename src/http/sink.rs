//! Response sinks.
//!
//! A sink is where a response finally goes. [`CapturedResponse`] wraps one
//! and only forwards the operations it does not override.
//!
//! # Design Decisions
//! - Optional capabilities (hijack, flush) are checked at call time and fail with
//!   `SinkError::NotSupported` instead of being implied by the type
//! - [`HttpSink`] assembles an `http::Response` in memory; the body is
//!   handed to hyper in one piece
//!
//! [`CapturedResponse`]: crate::http::capture::CapturedResponse

use axum::body::Body;
use axum::http::{Extensions, HeaderMap, Response, StatusCode, Version};
use bytes::BytesMut;
use hyper::upgrade::OnUpgrade;

/// Sink failures.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("response sink does not support {0}")]
    NotSupported(&'static str),

    #[error("write to response sink failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination of a response.
pub trait ResponseSink {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers.
    fn write_header(&mut self, status: StatusCode);

    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError>;

    /// Take over the underlying connection.
    fn hijack(&mut self) -> Result<OnUpgrade, SinkError> {
        Err(SinkError::NotSupported("hijack"))
    }

    /// Push buffered data towards the client.
    fn flush(&mut self) -> Result<(), SinkError> {
        Err(SinkError::NotSupported("flush"))
    }
}

/// Sink that builds the outbound `http::Response`.
#[derive(Debug, Default)]
pub struct HttpSink {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    body: BytesMut,
    wrote_header: bool,
    upgrade: Option<OnUpgrade>,
}

impl HttpSink {
    pub fn new(headers: HeaderMap, extensions: Extensions, version: Version) -> Self {
        Self {
            headers,
            extensions,
            version,
            ..Self::default()
        }
    }

    /// Make the connection behind this sink available to [`ResponseSink::hijack`].
    pub fn with_upgrade(mut self, upgrade: OnUpgrade) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    /// Finish the response with whatever was written.
    pub fn into_response(mut self) -> Response<Body> {
        let body = Body::from(std::mem::take(&mut self.body).freeze());
        self.into_response_with(body)
    }

    /// Finish the response with a body produced elsewhere.
    pub fn into_response_with(self, body: Body) -> Response<Body> {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        *response.extensions_mut() = self.extensions;
        response
    }
}

impl ResponseSink for HttpSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            return;
        }
        self.status = status;
        self.wrote_header = true;
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn hijack(&mut self) -> Result<OnUpgrade, SinkError> {
        self.upgrade.take().ok_or(SinkError::NotSupported("hijack"))
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        // Nothing leaves before the response is returned; committing the
        // header is all a flush can do.
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        Ok(())
    }
}
