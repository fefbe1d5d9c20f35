//! Body compression
//!
//! Two codecs ship with the crate: `DEF` (DEFLATE in a zlib stream) and
//! `GZIP`. A codec is selected on the way out by the builder and looked up on
//! the way in through the header's `zip` parameter by a
//! [`CompressionCodecResolver`].

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{Error, Result};
use crate::limits::MAX_DECOMPRESSED_PAYLOAD_SIZE;
use crate::token::Header;

/// Compresses and decompresses token bodies
pub trait CompressionCodec: Send + Sync + fmt::Debug {
    /// Value written to the `zip` header
    fn algorithm_name(&self) -> &str;

    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>>;

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>>;
}

/// `DEF`: DEFLATE wrapped in a zlib stream
#[derive(Debug, Clone, Copy, Default)]
pub struct Deflate;

/// `GZIP`
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip;

/// Shipped codecs
pub struct CompressionCodecs;

impl CompressionCodecs {
    pub const DEFLATE: Deflate = Deflate;
    pub const GZIP: Gzip = Gzip;
}

impl Deflate {
    pub const NAME: &'static str = "DEF";
}

impl Gzip {
    pub const NAME: &'static str = "GZIP";
}

fn reject_empty(payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        return Err(Error::IllegalArgument(
            "payload cannot be null or empty.".to_string(),
        ));
    }
    Ok(())
}

/// Inflates at most one byte past the limit, so an oversized body is detected
/// without being fully expanded
fn inflate(reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader
        .take(MAX_DECOMPRESSED_PAYLOAD_SIZE as u64 + 1)
        .read_to_end(&mut out)?;
    Ok(out)
}

fn within_limit(out: Vec<u8>, name: &str) -> Result<Vec<u8>> {
    if out.len() > MAX_DECOMPRESSED_PAYLOAD_SIZE {
        return Err(Error::Compression(format!(
            "Decompressed {name} body exceeds {MAX_DECOMPRESSED_PAYLOAD_SIZE} bytes"
        )));
    }
    Ok(out)
}

fn decompress_failed(name: &str, e: std::io::Error) -> Error {
    Error::Compression(format!("Unable to decompress bytes ({name}): {e}"))
}

impl CompressionCodec for Deflate {
    fn algorithm_name(&self) -> &str {
        Self::NAME
    }

    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        reject_empty(payload)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(payload)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::Compression(format!("Unable to compress bytes (DEF): {e}")))
    }

    /// Accepts zlib-wrapped streams and falls back to raw DEFLATE
    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        reject_empty(compressed)?;
        let out = match inflate(ZlibDecoder::new(compressed)) {
            Ok(out) => out,
            Err(_) => inflate(DeflateDecoder::new(compressed))
                .map_err(|e| decompress_failed(Self::NAME, e))?,
        };
        within_limit(out, Self::NAME)
    }
}

impl CompressionCodec for Gzip {
    fn algorithm_name(&self) -> &str {
        Self::NAME
    }

    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        reject_empty(payload)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(payload)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::Compression(format!("Unable to compress bytes (GZIP): {e}")))
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        reject_empty(compressed)?;
        let out = inflate(GzDecoder::new(compressed)).map_err(|e| decompress_failed(Self::NAME, e))?;
        within_limit(out, Self::NAME)
    }
}

/// Picks the codec for an incoming token from its header
pub trait CompressionCodecResolver: Send + Sync {
    /// `Ok(None)` when the header has no `zip` parameter
    fn resolve(&self, header: &Header) -> Result<Option<Arc<dyn CompressionCodec>>>;
}

/// Resolves `DEF` and `GZIP` case-insensitively, plus any registered codecs
#[derive(Debug, Clone)]
pub struct DefaultCompressionCodecResolver {
    codecs: HashMap<String, Arc<dyn CompressionCodec>>,
}

impl Default for DefaultCompressionCodecResolver {
    fn default() -> Self {
        let mut resolver = Self {
            codecs: HashMap::new(),
        };
        resolver.register(Arc::new(Deflate));
        resolver.register(Arc::new(Gzip));
        resolver
    }
}

impl DefaultCompressionCodecResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a codec, keyed by its algorithm name
    pub fn register(&mut self, codec: Arc<dyn CompressionCodec>) -> &mut Self {
        self.codecs
            .insert(codec.algorithm_name().to_ascii_uppercase(), codec);
        self
    }
}

impl CompressionCodecResolver for DefaultCompressionCodecResolver {
    fn resolve(&self, header: &Header) -> Result<Option<Arc<dyn CompressionCodec>>> {
        let Some(name) = header.compression_algorithm() else {
            return Ok(None);
        };
        self.codecs
            .get(&name.to_ascii_uppercase())
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                Error::Compression(format!(
                    "Unsupported compression algorithm '{name}'"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[u8] = b"The quick brown fox jumps over the lazy dog. The quick brown fox jumps over the lazy dog.";

    #[test]
    fn test_deflate_roundtrip() {
        let compressed = Deflate.compress(TEXT).unwrap();
        assert!(compressed.len() < TEXT.len());
        // zlib header
        assert_eq!(compressed[0], 0x78);
        assert_eq!(Deflate.decompress(&compressed).unwrap(), TEXT);
    }

    #[test]
    fn test_deflate_accepts_raw_stream() {
        let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(TEXT).unwrap();
        let raw = encoder.finish().unwrap();

        assert_eq!(Deflate.decompress(&raw).unwrap(), TEXT);
    }

    #[test]
    fn test_gzip_roundtrip() {
        let compressed = Gzip.compress(TEXT).unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
        assert_eq!(Gzip.decompress(&compressed).unwrap(), TEXT);
    }

    #[test]
    fn test_garbage_is_a_compression_error() {
        assert!(matches!(
            Gzip.decompress(b"definitely not gzip"),
            Err(Error::Compression(_))
        ));
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(Deflate.compress(b""), Err(Error::IllegalArgument(_))));
    }

    #[test]
    fn test_resolver_is_case_insensitive() {
        let resolver = DefaultCompressionCodecResolver::new();

        let mut header = Header::new();
        assert!(resolver.resolve(&header).unwrap().is_none());

        header.set_compression_algorithm("gzip");
        let codec = resolver.resolve(&header).unwrap().unwrap();
        assert_eq!(codec.algorithm_name(), "GZIP");

        header.set_compression_algorithm("Def");
        let codec = resolver.resolve(&header).unwrap().unwrap();
        assert_eq!(codec.algorithm_name(), "DEF");
    }

    #[test]
    fn test_unknown_codec() {
        let mut header = Header::new();
        header.set_compression_algorithm("LZ4");
        let result = DefaultCompressionCodecResolver::new().resolve(&header);
        assert!(matches!(result, Err(Error::Compression(_))));
    }

    #[test]
    fn test_inflation_is_capped() {
        let oversized = vec![b' '; MAX_DECOMPRESSED_PAYLOAD_SIZE + 1];
        for codec in [&Deflate as &dyn CompressionCodec, &Gzip] {
            let compressed = codec.compress(&oversized).unwrap();
            assert!(compressed.len() < 16 * 1024);
            match codec.decompress(&compressed) {
                Err(Error::Compression(message)) => assert!(message.contains("exceeds")),
                other => panic!("expected Compression error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_body_at_limit_is_accepted() {
        let payload = vec![b'a'; MAX_DECOMPRESSED_PAYLOAD_SIZE];
        let compressed = Deflate.compress(&payload).unwrap();
        assert_eq!(Deflate.decompress(&compressed).unwrap().len(), MAX_DECOMPRESSED_PAYLOAD_SIZE);
    }
}
