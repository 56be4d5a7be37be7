//! Panic and disconnect classification.

use std::any::Any;
use std::error::Error as StdError;
use std::io;

use axum::body::Body;
use axum::http::{Response, StatusCode};

/// Panic payload an upstream raises to abandon a response whose client is
/// already gone.
///
/// ```no_run
/// std::panic::panic_any(rewrite_body::pipeline::AbortHandler);
/// ```
///
/// The pipeline swallows it without logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortHandler;

/// Whether `err`, or anything in its source chain, means the peer went away.
pub fn is_disconnect(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);

    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ) {
                return true;
            }
        }

        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_canceled() {
                return true;
            }
        }

        current = err.source();
    }

    false
}

/// Whether a panic payload is the abort signal.
pub fn is_abort(payload: &(dyn Any + Send)) -> bool {
    payload.is::<AbortHandler>()
}

/// Turn a caught panic into the response sent in its place.
pub fn response_for_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    if is_abort(payload.as_ref()) {
        tracing::debug!("Upstream aborted the response");
    } else if let Some(message) = payload.downcast_ref::<String>() {
        tracing::warn!(panic = %message, "Recovered from panic while rewriting response");
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        tracing::warn!(panic = %message, "Recovered from panic while rewriting response");
    } else {
        tracing::warn!("Recovered from panic while rewriting response");
    }

    empty(StatusCode::INTERNAL_SERVER_ERROR)
}

pub(crate) fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
