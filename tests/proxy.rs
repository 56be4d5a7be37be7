//! Tests for the proxy binary's server, against a raw TCP backend.

use bytes::Bytes;
use tokio::net::TcpListener;

use rewrite_body::codec::{self, Encoding};
use rewrite_body::config::{NonceConfig, ProxyConfig, RewriteRuleConfig};
use rewrite_body::http::ServerError;
use rewrite_body::rewrite::RewriteError;
use rewrite_body::HttpServer;

mod common;

fn rewriting(upstream: std::net::SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.address = upstream.to_string();
    config.rewrite.rewrites.push(RewriteRuleConfig {
        regex: "foo".into(),
        replacement: "bar".into(),
    });
    config
}

#[tokio::test]
async fn test_proxy_rewrites_body() {
    let backend = common::start_mock_backend(
        &[("Content-Type", "text/html")],
        b"foo is the new bar".to_vec(),
    )
    .await;
    let (proxy, shutdown) = common::start_proxy(rewriting(backend)).await;

    let res = common::client()
        .get(format!("http://{proxy}/index.html"))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.content_length(), Some(18));
    assert_eq!(res.text().await.unwrap(), "bar is the new bar");

    shutdown.trigger();
}

#[tokio::test]
async fn test_proxy_rewrites_gzip_body() {
    let compressed = codec::encode(Bytes::from_static(b"foo is the new bar"), &Encoding::Gzip)
        .into_bytes()
        .to_vec();
    let backend = common::start_mock_backend(
        &[("Content-Type", "text/html"), ("Content-Encoding", "gzip")],
        compressed,
    )
    .await;
    let (proxy, shutdown) = common::start_proxy(rewriting(backend)).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .header("accept-encoding", "br, gzip")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-encoding"], "gzip");
    let body = res.bytes().await.unwrap();
    let decoded = codec::decode(&body, &Encoding::Gzip).unwrap();
    assert_eq!(&decoded[..], b"bar is the new bar");

    shutdown.trigger();
}

#[tokio::test]
async fn test_proxy_forwards_ineligible_body() {
    let backend = common::start_mock_backend(
        &[("Content-Type", "application/json")],
        br#"{"foo":"bar"}"#.to_vec(),
    )
    .await;
    let (proxy, shutdown) = common::start_proxy(rewriting(backend)).await;

    let res = common::client()
        .get(format!("http://{proxy}/api"))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.text().await.unwrap(), r#"{"foo":"bar"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_proxy_upstream_down_is_bad_gateway() {
    // Reserve a port, then free it so nothing listens there.
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = closed.local_addr().unwrap();
    drop(closed);

    let (proxy, shutdown) = common::start_proxy(rewriting(upstream)).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 502);

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_pattern_is_fatal() {
    let mut config = ProxyConfig::default();
    config.rewrite.rewrites.push(RewriteRuleConfig {
        regex: "(unclosed".into(),
        replacement: "x".into(),
    });

    assert!(matches!(HttpServer::new(config), Err(ServerError::Rewrite(_))));
}

#[tokio::test]
async fn test_invalid_upstream_is_fatal() {
    let mut config = ProxyConfig::default();
    config.upstream.address = "not a host".into();

    assert!(matches!(
        HttpServer::new(config),
        Err(ServerError::InvalidUpstream { .. })
    ));
}

#[tokio::test]
async fn test_conflicting_rewrite_modes_are_fatal() {
    let mut config = rewriting("127.0.0.1:1".parse().unwrap());
    config.rewrite.nonce = Some(NonceConfig::default());

    assert!(matches!(
        HttpServer::new(config),
        Err(ServerError::Rewrite(RewriteError::InvalidSetting { field: "rewrite.nonce", .. }))
    ));
}
