//! Size limits applied to untrusted input

/// Maximum length for a compact JWT string (256KB)
pub const MAX_TOKEN_LENGTH: usize = 256 * 1024;

/// Maximum size for a decompressed body (1MB)
/// Bodies are inflated before the signature is checked, so this bounds what
/// an unauthenticated token can make the parser allocate
pub const MAX_DECOMPRESSED_PAYLOAD_SIZE: usize = 1024 * 1024;
