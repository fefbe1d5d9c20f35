//! Standard (padded) Base64, used for secrets handed around as text

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

/// Encode bytes to padded standard Base64
pub fn encode_bytes(input: &[u8]) -> String {
    STANDARD.encode(input)
}

/// Decode padded standard Base64. Surrounding whitespace is ignored.
pub fn decode_bytes(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::IllegalArgument(
            "Base64-encoded key bytes may not be empty".to_string(),
        ));
    }
    STANDARD
        .decode(trimmed)
        .map_err(|e| Error::Decoding(format!("Invalid Base64 key material: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_alphabet() {
        assert_eq!(encode_bytes(&[0xfb, 0xff]), "+/8=");
        assert_eq!(decode_bytes(" +/8= ").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(decode_bytes("  "), Err(Error::IllegalArgument(_))));
    }
}
