//! Base64URL encoding/decoding per RFC 4648 §5
//!
//! Encoding never emits padding. Decoding accepts segments with or without
//! trailing `=` so tokens produced by lenient encoders still parse.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::{Error, Result};

const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes to Base64URL string
pub fn encode_bytes(input: &[u8]) -> String {
    BASE64URL.encode(input)
}

/// Encode string to Base64URL
pub fn encode(input: &str) -> String {
    encode_bytes(input.as_bytes())
}

/// Decode Base64URL string to bytes
pub fn decode_bytes(input: &str) -> Result<Vec<u8>> {
    BASE64URL
        .decode(input)
        .map_err(|e| Error::Decoding(format!("Unable to decode input '{input}': {e}")))
}

/// Decode Base64URL string to UTF-8 string
pub fn decode(input: &str) -> Result<String> {
    let bytes = decode_bytes(input)?;
    String::from_utf8(bytes).map_err(|e| Error::Decoding(format!("Invalid UTF-8: {e}")))
}
