use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::BoxError;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use tower::Service;

use crate::http::capture::CapturedResponse;
use crate::http::negotiate::{restrict_request_headers, NegotiatedEncoding};
use crate::http::sink::HttpSink;
use crate::observability::metrics;
use crate::pipeline::recovery;
use crate::pipeline::settings::RewriteSettings;

/// Buffers eligible responses of the wrapped service and rewrites their body.
#[derive(Debug, Clone)]
pub struct RewriteBody<S> {
    inner: S,
    settings: Arc<RewriteSettings>,
}

impl<S> RewriteBody<S> {
    pub fn new(inner: S, settings: Arc<RewriteSettings>) -> Self {
        Self { inner, settings }
    }

    pub fn settings(&self) -> &RewriteSettings {
        &self.settings
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RewriteBody<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The ready service goes into the future, the clone stays for the next call.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let settings = self.settings.clone();

        let handle = async move {
            if settings.supports_request(&request) {
                capture(inner, settings, request).await
            } else {
                bypass(inner, request).await
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(handle).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    metrics::record_outcome(metrics::PANICKED);
                    Ok(recovery::response_for_panic(payload))
                }
            }
        })
    }
}

async fn bypass<S, ReqBody, ResBody>(
    mut inner: S,
    request: Request<ReqBody>,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    tracing::debug!(
        method = %request.method(),
        uri = %request.uri(),
        "Request not monitored, forwarding unchanged"
    );
    metrics::record_outcome(metrics::BYPASSED);

    let response = inner.call(request).await?;
    Ok(response.map(Body::new))
}

async fn capture<S, ReqBody, ResBody>(
    mut inner: S,
    settings: Arc<RewriteSettings>,
    mut request: Request<ReqBody>,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    let start = Instant::now();

    let target = restrict_request_headers(request.headers_mut());
    tracing::debug!(encoding = %target, "Negotiated response encoding");
    request.extensions_mut().insert(NegotiatedEncoding(target));

    let response = match inner.call(request).await {
        Ok(response) => response,
        Err(err) => {
            metrics::record_outcome(metrics::UPSTREAM_FAILED);
            return Err(err);
        }
    };

    let (parts, body) = response.into_parts();
    let mut body = Box::pin(body);
    let sink = HttpSink::new(parts.headers, parts.extensions, parts.version);
    let mut captured = CapturedResponse::new(sink, &settings);
    captured.write_header(parts.status);

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                let err: BoxError = err.into();
                if recovery::is_disconnect(&*err) {
                    tracing::debug!(error = %err, "Connection closed while reading upstream body");
                } else {
                    tracing::error!(error = %err, "Failed to read upstream body");
                }
                metrics::record_outcome(metrics::UPSTREAM_FAILED);
                return Ok(recovery::empty(StatusCode::BAD_GATEWAY));
            }
        };

        // Trailers cannot follow a rewritten body.
        let Ok(data) = frame.into_data() else {
            continue;
        };

        if captured.buffered().len() + data.len() > settings.max_body_size() {
            tracing::warn!(
                limit = settings.max_body_size(),
                "Response body too large to rewrite, streaming unchanged"
            );
            metrics::record_outcome(metrics::OVERSIZED);

            let (sink, buffered) = captured.into_parts();
            let rest = Body::new(body).into_data_stream();
            let stream = stream::iter([Ok(buffered), Ok(data)]).chain(rest);
            return Ok(sink.into_response_with(Body::from_stream(stream)));
        }

        captured.write(&data);
    }

    let (sink, outcome) = finish(captured, &settings);
    metrics::record_outcome(outcome);
    metrics::record_duration(start);

    Ok(sink.into_response())
}

/// Decide what the captured response turns into and perform the terminal write.
fn finish(
    captured: CapturedResponse<'_, HttpSink>,
    settings: &RewriteSettings,
) -> (HttpSink, &'static str) {
    if !captured.supports_processing() {
        tracing::debug!(
            content_type = captured.content_type(),
            encoding = %captured.content_encoding(),
            "Response not eligible for rewriting"
        );
        return (captured.emit_raw(), metrics::INELIGIBLE);
    }

    let encoding = captured.content_encoding();

    let content = match captured.content() {
        Ok(content) => content,
        Err(err) => {
            tracing::error!(error = %err, "Unable to decode response body, forwarding as is");
            return (captured.emit_raw(), metrics::DECODE_FAILED);
        }
    };

    let rewritten = settings.engine().rewrite(&content, captured.nonce());

    match rewritten {
        Some(body) => (captured.set_content(Bytes::from(body), &encoding), metrics::REWRITTEN),
        None => {
            tracing::debug!(empty = content.is_empty(), "Nothing to rewrite, forwarding as is");
            (captured.emit_raw(), metrics::SKIPPED)
        }
    }
}
