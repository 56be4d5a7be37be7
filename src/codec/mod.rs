//! Transparent body codec.
//!
//! # Responsibilities
//! - Decode gzip / deflate bodies into plain bytes
//! - Re-encode rewritten bodies with the encoding the upstream chose
//! - Treat identity and unknown encodings as pass-through
//!
//! # Design Decisions
//! - Stateless free functions; every call owns its own (de)compressor
//! - `decode` drains the whole stream, truncation is a `CorruptStream`
//! - `encode` never fails outward: on compressor failure the plain input is
//!   returned and flagged as not encoded
//! - `deflate` is written as zlib (RFC 9110); raw deflate is still accepted
//!   on the way in since some servers emit it

pub mod encoding;

use std::io::{self, Read, Write};

use bytes::Bytes;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

pub use encoding::Encoding;

/// Codec failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("corrupt {encoding} stream: {source}")]
    CorruptStream {
        encoding: Encoding,
        #[source]
        source: io::Error,
    },

    #[error("{encoding} compressor failed: {source}")]
    CompressorFailure {
        encoding: Encoding,
        #[source]
        source: io::Error,
    },
}

/// Result of [`encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// Bytes compressed with the requested encoding.
    Compressed(Bytes),
    /// The input, unchanged. Either identity was requested or the compressor failed.
    Plain(Bytes),
}

impl Encoded {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Encoded::Compressed(_))
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Encoded::Compressed(bytes) | Encoded::Plain(bytes) => bytes,
        }
    }
}

/// Decode `data` according to `encoding`.
///
/// An empty input decodes to an empty body whatever the encoding claims.
pub fn decode(data: &[u8], encoding: &Encoding) -> Result<Bytes, CodecError> {
    if data.is_empty() {
        return Ok(Bytes::new());
    }

    let decoded = match encoding {
        Encoding::Gzip => read_all(MultiGzDecoder::new(data)),
        Encoding::Deflate => read_all(ZlibDecoder::new(data))
            .or_else(|zlib_err| read_all(DeflateDecoder::new(data)).map_err(|_| zlib_err)),
        Encoding::Identity | Encoding::Unsupported(_) => return Ok(Bytes::copy_from_slice(data)),
    };

    decoded.map(Bytes::from).map_err(|source| CodecError::CorruptStream {
        encoding: encoding.clone(),
        source,
    })
}

/// Encode `data` with `encoding`, falling back to the plain input on failure.
pub fn encode(data: Bytes, encoding: &Encoding) -> Encoded {
    encode_with(data, encoding, Vec::new())
}

/// [`encode`] through a caller supplied output writer.
pub(crate) fn encode_with<W>(data: Bytes, encoding: &Encoding, writer: W) -> Encoded
where
    W: Write + Into<Bytes>,
{
    let compressed = match encoding {
        Encoding::Gzip => compress(GzEncoder::new(writer, Compression::default()), &data),
        Encoding::Deflate => compress(ZlibEncoder::new(writer, Compression::default()), &data),
        Encoding::Identity | Encoding::Unsupported(_) => return Encoded::Plain(data),
    };

    match compressed {
        Ok(out) => Encoded::Compressed(out.into()),
        Err(source) => {
            let err = CodecError::CompressorFailure {
                encoding: encoding.clone(),
                source,
            };
            tracing::error!(error = %err, "Unable to re-encode body, sending it uncompressed");
            Encoded::Plain(data)
        }
    }
}

fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

trait Finish: Write {
    type Output;

    fn finish_stream(self) -> io::Result<Self::Output>;
}

impl<W: Write> Finish for GzEncoder<W> {
    type Output = W;

    fn finish_stream(self) -> io::Result<W> {
        self.finish()
    }
}

impl<W: Write> Finish for ZlibEncoder<W> {
    type Output = W;

    fn finish_stream(self) -> io::Result<W> {
        self.finish()
    }
}

fn compress<E: Finish>(mut encoder: E, data: &[u8]) -> io::Result<E::Output> {
    encoder.write_all(data)?;
    encoder.finish_stream()
}
