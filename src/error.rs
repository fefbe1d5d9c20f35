//! Error types for building, signing, parsing and validating JWTs
//!
//! Every failure in the crate surfaces as one [`Error`] variant. Parse-time
//! failures are terminal: a parser never hands back a partially validated
//! token. Claim failures carry the decoded header and claims so callers can
//! log or inspect what was rejected.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::claims::Claims;
use crate::token::Header;

/// Errors that can occur while producing or consuming a JWT
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Format Errors
    // ============================================================================
    /// Structurally invalid compact string or segment
    #[error("Malformed JWT: {0}")]
    Malformed(String),

    /// A Base64 or Base64URL segment could not be decoded
    #[error("Base64 decoding failed: {0}")]
    Decoding(String),

    /// Compression or decompression of the body failed, or the codec is unknown
    #[error("Compression failed: {0}")]
    Compression(String),

    /// JSON serialization of a header or claims map failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // ============================================================================
    // Signature Errors
    // ============================================================================
    /// The computed signature does not match the one carried by the token
    #[error(
        "JWT signature does not match locally computed signature. JWT validity cannot be asserted and should not be trusted."
    )]
    SignatureInvalid,

    /// The cryptographic backend failed to produce a signature
    #[error("Unable to calculate signature: {0}")]
    Signing(String),

    /// Algorithm/key mismatch, or the token does not have the requested shape
    #[error("Unsupported JWT: {0}")]
    Unsupported(String),

    // ============================================================================
    // Key Errors
    // ============================================================================
    /// Key has the wrong type for the algorithm, or cannot be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key is shorter than the algorithm's minimum strength
    #[error("Weak key: {0}")]
    WeakKey(String),

    // ============================================================================
    // Claim Errors
    // ============================================================================
    /// The `exp` claim is in the past (after clock skew)
    #[error("{0}")]
    Expired(Box<TemporalViolation>),

    /// The `nbf` claim is in the future (after clock skew)
    #[error("{0}")]
    Premature(Box<TemporalViolation>),

    /// An expected claim is missing or has a different value
    #[error("{0}")]
    InvalidClaim(Box<InvalidClaim>),

    /// A claim or header value exists but cannot be converted to the requested type
    #[error("Cannot convert existing claim value of '{name}' to {expected}")]
    RequiredType { name: String, expected: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Conflicting builder or parser setup
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An argument is empty, out of range or otherwise unusable
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    // ============================================================================
    // Token provider Errors
    // ============================================================================
    /// Reading or writing the persisted signing key failed
    #[error("I/O error: {0}")]
    Io(String),

    /// A token handed to the provider was rejected
    #[error("Invalid {kind} token: {reason}")]
    InvalidToken { kind: String, reason: String },
}

impl Error {
    /// True for [`Error::WeakKey`]. Weak keys are a refinement of invalid keys.
    pub fn is_weak_key(&self) -> bool {
        matches!(self, Error::WeakKey(_))
    }

    /// True for any key rejection, weak or otherwise
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Error::InvalidKey(_) | Error::WeakKey(_))
    }

    /// True for missing and incorrect expected claims
    pub fn is_invalid_claim(&self) -> bool {
        matches!(self, Error::InvalidClaim(_))
    }

    /// True for every error that carries the decoded header and claims
    pub fn is_claim_error(&self) -> bool {
        matches!(
            self,
            Error::Expired(_) | Error::Premature(_) | Error::InvalidClaim(_)
        )
    }

    /// Claims of the rejected token, when the failure happened after decoding them
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Error::Expired(v) | Error::Premature(v) => Some(&v.claims),
            Error::InvalidClaim(c) => Some(c.claims()),
            _ => None,
        }
    }

    /// Header of the rejected token, when the failure happened after decoding it
    pub fn header(&self) -> Option<&Header> {
        match self {
            Error::Expired(v) | Error::Premature(v) => Some(&v.header),
            Error::InvalidClaim(c) => Some(c.header()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Which temporal claim was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalClaim {
    /// `exp`
    Expiration,
    /// `nbf`
    NotBefore,
}

/// Diagnostics for an expired or premature token
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalViolation {
    pub kind: TemporalClaim,
    pub header: Header,
    pub claims: Claims,
    /// Value of the violated claim
    pub claim_time: DateTime<Utc>,
    /// Clock reading at validation time
    pub now: DateTime<Utc>,
    /// Distance past the tolerated boundary, in milliseconds
    pub difference_millis: i64,
    pub allowed_clock_skew_millis: i64,
}

impl std::fmt::Display for TemporalViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let claim_time = self.claim_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let now = self.now.to_rfc3339_opts(SecondsFormat::Secs, true);
        match self.kind {
            TemporalClaim::Expiration => write!(
                f,
                "JWT expired at {claim_time}. Current time: {now}, a difference of {} milliseconds.  Allowed clock skew: {} milliseconds.",
                self.difference_millis, self.allowed_clock_skew_millis
            ),
            TemporalClaim::NotBefore => write!(
                f,
                "JWT must not be accepted before {claim_time}. Current time: {now}, a difference of {} milliseconds.  Allowed clock skew: {} milliseconds.",
                self.difference_millis, self.allowed_clock_skew_millis
            ),
        }
    }
}

/// Expected-claim failures
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidClaim {
    /// The claim is absent from the token
    Missing {
        header: Header,
        claims: Claims,
        name: String,
        expected: Value,
    },

    /// The claim is present but differs from the expected value
    Incorrect {
        header: Header,
        claims: Claims,
        name: String,
        expected: Value,
        actual: Value,
        message: Option<String>,
    },
}

impl InvalidClaim {
    pub fn name(&self) -> &str {
        match self {
            InvalidClaim::Missing { name, .. } | InvalidClaim::Incorrect { name, .. } => name,
        }
    }

    pub fn expected(&self) -> &Value {
        match self {
            InvalidClaim::Missing { expected, .. } | InvalidClaim::Incorrect { expected, .. } => {
                expected
            }
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            InvalidClaim::Missing { header, .. } | InvalidClaim::Incorrect { header, .. } => header,
        }
    }

    pub fn claims(&self) -> &Claims {
        match self {
            InvalidClaim::Missing { claims, .. } | InvalidClaim::Incorrect { claims, .. } => claims,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, InvalidClaim::Missing { .. })
    }
}

impl std::fmt::Display for InvalidClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidClaim::Missing { name, expected, .. } => write!(
                f,
                "Expected {name} claim to be: {expected}, but was not present in the JWT claims."
            ),
            InvalidClaim::Incorrect {
                message: Some(message),
                ..
            } => f.write_str(message),
            InvalidClaim::Incorrect {
                name,
                expected,
                actual,
                ..
            } => write!(f, "Expected {name} claim to be: {expected}, but was: {actual}."),
        }
    }
}

/// Result type alias for jwtkit operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_temporal_violation_message() {
        let violation = TemporalViolation {
            kind: TemporalClaim::Expiration,
            header: Header::new(),
            claims: Claims::new(),
            claim_time: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            now: Utc.timestamp_opt(1_600_000_010, 0).unwrap(),
            difference_millis: 10_000,
            allowed_clock_skew_millis: 0,
        };

        let msg = Error::Expired(Box::new(violation)).to_string();
        assert!(msg.starts_with("JWT expired at 2020-09-13T12:26:40Z"));
        assert!(msg.contains("a difference of 10000 milliseconds"));
    }

    #[test]
    fn test_invalid_claim_messages() {
        let missing = InvalidClaim::Missing {
            header: Header::new(),
            claims: Claims::new(),
            name: "iss".to_string(),
            expected: Value::from("me"),
        };
        assert_eq!(
            missing.to_string(),
            "Expected iss claim to be: \"me\", but was not present in the JWT claims."
        );
        assert!(missing.is_missing());

        let incorrect = InvalidClaim::Incorrect {
            header: Header::new(),
            claims: Claims::new(),
            name: "iss".to_string(),
            expected: Value::from("me"),
            actual: Value::from("you"),
            message: None,
        };
        assert_eq!(
            incorrect.to_string(),
            "Expected iss claim to be: \"me\", but was: \"you\"."
        );
        assert_eq!(incorrect.name(), "iss");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::WeakKey("short".into()).is_weak_key());
        assert!(Error::WeakKey("short".into()).is_invalid_key());
        assert!(!Error::InvalidKey("wrong".into()).is_weak_key());
        assert!(!Error::SignatureInvalid.is_claim_error());
    }
}
