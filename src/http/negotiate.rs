//! `Accept-Encoding` negotiation.
//!
//! # Responsibilities
//! - Parse the client header into ranked candidates
//! - Narrow candidates to what the codec can decode
//! - Restrict the header forwarded upstream to those encodings
//!
//! # Design Decisions
//! - Ranking is a stable sort on quality, ties keep header order
//! - `*` expands to every supported encoding at quality 1.0
//! - `q=0` means "not acceptable" and drops the candidate

use axum::http::{header::ACCEPT_ENCODING, HeaderMap, HeaderValue};

use crate::codec::Encoding;

/// One token of an `Accept-Encoding` header.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingCandidate {
    pub encoding: Encoding,
    pub quality: f32,
}

/// The encoding the pipeline settled on for a request.
///
/// Inserted into request extensions before the upstream is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedEncoding(pub Encoding);

/// Parse every token of `header`, supported or not.
pub fn parse_accept_encoding(header: &str) -> Vec<EncodingCandidate> {
    let mut candidates = Vec::new();

    for token in header.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token == "*" {
            candidates.extend(Encoding::supported().into_iter().map(|encoding| {
                EncodingCandidate {
                    encoding,
                    quality: 1.0,
                }
            }));
            continue;
        }

        let mut parts = token.split(';');
        let name = parts.next().unwrap_or_default();
        let quality = parts
            .find_map(|param| param.trim().strip_prefix("q="))
            .and_then(|q| q.trim().parse::<f32>().ok())
            .filter(|q| q.is_finite())
            .map(|q| q.clamp(0.0, 1.0))
            .unwrap_or(1.0);

        // Content-coding names are case-insensitive in HTTP.
        candidates.push(EncodingCandidate {
            encoding: Encoding::parse(name),
            quality,
        });
    }

    candidates
}

/// Candidates the codec supports, best first.
pub fn ranked_candidates(header: &str) -> Vec<EncodingCandidate> {
    let mut candidates: Vec<_> = parse_accept_encoding(header)
        .into_iter()
        .filter(|candidate| candidate.encoding.is_supported() && candidate.quality > 0.0)
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    candidates
}

/// Pick the encoding to target for `header`; identity when nothing is usable.
pub fn negotiate(header: &str) -> Encoding {
    ranked_candidates(header)
        .into_iter()
        .next()
        .map(|candidate| candidate.encoding)
        .unwrap_or(Encoding::Identity)
}

/// Keep only the tokens naming gzip, deflate or identity, parameters intact.
pub fn restrict_header(header: &str) -> String {
    header
        .split(',')
        .map(str::trim)
        .filter(|token| {
            let name = token.split(';').next().unwrap_or_default();
            !name.is_empty() && name != "*" && Encoding::parse(name).is_supported()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite the request's `Accept-Encoding` so the upstream only produces
/// encodings the pipeline can decode. Returns the negotiated target.
///
/// A missing header is replaced by an empty one, which asks for identity.
pub fn restrict_request_headers(headers: &mut HeaderMap) -> Encoding {
    let original = headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ");

    let target = negotiate(&original);
    let restricted = restrict_header(&original);

    match HeaderValue::from_str(&restricted) {
        Ok(value) => {
            headers.insert(ACCEPT_ENCODING, value);
        }
        Err(_) => {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }
    }

    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_targets() {
        let cases = [
            ("gzip", Encoding::Gzip),
            ("deflate", Encoding::Deflate),
            ("identity", Encoding::Identity),
            ("br, gzip", Encoding::Gzip),
            ("*", Encoding::Gzip),
            ("gzip;q=0.8, deflate;q=0.6", Encoding::Gzip),
            ("gzip;q=0.8, deflate;q=0.9", Encoding::Deflate),
            ("br", Encoding::Identity),
            ("", Encoding::Identity),
        ];

        for (header, expected) in cases {
            assert_eq!(negotiate(header), expected, "Accept-Encoding: {header:?}");
        }
    }

    #[test]
    fn test_coding_names_ignore_case() {
        assert_eq!(negotiate("GZIP"), Encoding::Gzip);
        assert_eq!(negotiate("br, Deflate;q=0.5"), Encoding::Deflate);
    }

    #[test]
    fn test_ties_keep_header_order() {
        assert_eq!(negotiate("deflate, gzip"), Encoding::Deflate);
        assert_eq!(negotiate("gzip;q=0.5, deflate;q=0.5"), Encoding::Gzip);
    }

    #[test]
    fn test_quality_parsing() {
        let candidates = parse_accept_encoding("gzip;q=0.3, deflate; q=0.7, br;q=oops");
        assert_eq!(candidates[0].quality, 0.3);
        assert_eq!(candidates[1].quality, 0.7);
        assert_eq!(candidates[2].quality, 1.0);
        assert_eq!(candidates[2].encoding, Encoding::Unsupported("br".into()));
    }

    #[test]
    fn test_wildcard_expands() {
        let candidates = parse_accept_encoding("*");
        let encodings: Vec<_> = candidates.into_iter().map(|c| c.encoding).collect();
        assert_eq!(encodings, Encoding::supported().to_vec());
    }

    #[test]
    fn test_zero_quality_is_not_acceptable() {
        assert_eq!(negotiate("gzip;q=0, deflate;q=0.1"), Encoding::Deflate);
    }

    #[test]
    fn test_restrict_header() {
        let cases = [
            ("gzip", "gzip"),
            ("deflate", "deflate"),
            ("identity", "identity"),
            ("br, gzip", "gzip"),
            ("*", ""),
            ("gzip;q=0.8, deflate;q=0.6", "gzip;q=0.8, deflate;q=0.6"),
            ("br;q=1.0, zstd", ""),
        ];

        for (header, expected) in cases {
            assert_eq!(restrict_header(header), expected, "Accept-Encoding: {header:?}");
        }
    }

    #[test]
    fn test_restrict_request_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("br, gzip;q=0.5"));

        let target = restrict_request_headers(&mut headers);
        assert_eq!(target, Encoding::Gzip);
        assert_eq!(headers[ACCEPT_ENCODING], "gzip;q=0.5");
    }

    #[test]
    fn test_missing_header_asks_for_identity() {
        let mut headers = HeaderMap::new();
        assert_eq!(restrict_request_headers(&mut headers), Encoding::Identity);
        assert_eq!(headers[ACCEPT_ENCODING], "");
    }
}
