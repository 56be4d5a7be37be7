//! Content-Encoding names understood by the codec.

use std::fmt;

/// A `Content-Encoding` value.
///
/// Only the first three variants are ever produced or consumed by the codec;
/// anything else is carried by name and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    Gzip,
    Deflate,
    Identity,
    Unsupported(String),
}

impl Encoding {
    /// Parse a single encoding token. Matching is case-insensitive and an
    /// empty token means identity.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("identity") {
            Encoding::Identity
        } else if name.eq_ignore_ascii_case("gzip") {
            Encoding::Gzip
        } else if name.eq_ignore_ascii_case("deflate") {
            Encoding::Deflate
        } else {
            Encoding::Unsupported(name.to_string())
        }
    }

    /// Encodings the codec can decode and re-encode, in wildcard expansion order.
    pub fn supported() -> [Encoding; 3] {
        [Encoding::Gzip, Encoding::Deflate, Encoding::Identity]
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Encoding::Unsupported(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
            Encoding::Identity => "identity",
            Encoding::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(Encoding::parse("gzip"), Encoding::Gzip);
        assert_eq!(Encoding::parse(" GZIP "), Encoding::Gzip);
        assert_eq!(Encoding::parse("deflate"), Encoding::Deflate);
        assert_eq!(Encoding::parse("identity"), Encoding::Identity);
        assert_eq!(Encoding::parse(""), Encoding::Identity);
    }

    #[test]
    fn test_unknown_names_pass_through() {
        let br = Encoding::parse("br");
        assert_eq!(br, Encoding::Unsupported("br".into()));
        assert!(!br.is_supported());
        assert_eq!(br.to_string(), "br");
    }
}
