use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::claims::{Claims, ValidationConfig};
use crate::clock::{Clock, SystemClock};
use crate::compression::{CompressionCodecResolver, DefaultCompressionCodecResolver};
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::parser::{JwtParser, SigningKeyResolver};
use crate::serialize::{Deserializer, JsonSerializer};
use crate::utils::base64;

/// Configures an immutable [`JwtParser`]
///
/// At most one of a key, key bytes or a key resolver may be set; [`build`]
/// rejects conflicting setups.
///
/// [`build`]: JwtParserBuilder::build
pub struct JwtParserBuilder {
    key: Option<Key>,
    key_bytes: Option<Vec<u8>>,
    resolver: Option<Arc<dyn SigningKeyResolver>>,
    codec_resolver: Option<Arc<dyn CompressionCodecResolver>>,
    deserializer: Option<Arc<dyn Deserializer>>,
    clock: Option<Arc<dyn Clock>>,
    validation: ValidationConfig,
    deferred: Option<Error>,
}

impl Default for JwtParserBuilder {
    fn default() -> Self {
        Self {
            key: None,
            key_bytes: None,
            resolver: None,
            codec_resolver: None,
            deserializer: None,
            clock: None,
            validation: ValidationConfig::default(),
            deferred: None,
        }
    }
}

impl JwtParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Verification key
    // ============================================================================

    pub fn set_signing_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Raw HMAC secret. Only usable with HS* tokens.
    pub fn set_signing_key_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            self.defer(Error::IllegalArgument(
                "signing key cannot be null or empty.".to_string(),
            ));
        } else {
            self.key_bytes = Some(bytes);
        }
        self
    }

    /// Standard-Base64 encoded HMAC secret
    pub fn set_signing_key_base64(mut self, encoded: &str) -> Self {
        match base64::decode_bytes(encoded) {
            Ok(bytes) => self.set_signing_key_bytes(bytes),
            Err(e) => {
                self.defer(e);
                self
            }
        }
    }

    pub fn set_signing_key_resolver(mut self, resolver: impl SigningKeyResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    // ============================================================================
    // Strategies
    // ============================================================================

    pub fn set_compression_codec_resolver(
        mut self,
        resolver: impl CompressionCodecResolver + 'static,
    ) -> Self {
        self.codec_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn deserialize_json_with(mut self, deserializer: impl Deserializer + 'static) -> Self {
        self.deserializer = Some(Arc::new(deserializer));
        self
    }

    pub fn set_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    // ============================================================================
    // Claim validation
    // ============================================================================

    /// Tolerance for `exp` and `nbf`, in seconds
    pub fn set_allowed_clock_skew_seconds(mut self, seconds: i64) -> Self {
        match std::mem::take(&mut self.validation).clock_skew(seconds) {
            Ok(validation) => self.validation = validation,
            Err(e) => self.defer(e),
        }
        self
    }

    /// Require claim `name` to equal `value`
    pub fn require(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if name.trim().is_empty() || value.is_null() {
            self.defer(Error::IllegalArgument(
                "claim name and value cannot be null or empty.".to_string(),
            ));
            return self;
        }
        self.validation = std::mem::take(&mut self.validation).require(name, value);
        self
    }

    /// Require claim `name` to hold `instant`, compared at millisecond precision
    pub fn require_date(mut self, name: &str, instant: DateTime<Utc>) -> Self {
        self.validation = std::mem::take(&mut self.validation).require(name, instant);
        self
    }

    pub fn require_issuer(self, iss: &str) -> Self {
        self.require(Claims::ISSUER, iss)
    }

    pub fn require_subject(self, sub: &str) -> Self {
        self.require(Claims::SUBJECT, sub)
    }

    pub fn require_audience(self, aud: &str) -> Self {
        self.require(Claims::AUDIENCE, aud)
    }

    pub fn require_id(self, jti: &str) -> Self {
        self.require(Claims::ID, jti)
    }

    pub fn require_expiration(self, exp: DateTime<Utc>) -> Self {
        self.require_date(Claims::EXPIRATION, exp)
    }

    pub fn require_not_before(self, nbf: DateTime<Utc>) -> Self {
        self.require_date(Claims::NOT_BEFORE, nbf)
    }

    pub fn require_issued_at(self, iat: DateTime<Utc>) -> Self {
        self.require_date(Claims::ISSUED_AT, iat)
    }

    fn defer(&mut self, error: Error) {
        self.deferred.get_or_insert(error);
    }

    /// Validate the configuration and freeze it into a parser
    pub fn build(self) -> Result<JwtParser> {
        if let Some(error) = self.deferred {
            return Err(error);
        }
        if self.key.is_some() && self.key_bytes.is_some() {
            return Err(Error::Configuration(
                "A key object and key bytes cannot both be specified. Choose either.".to_string(),
            ));
        }
        if self.resolver.is_some() && (self.key.is_some() || self.key_bytes.is_some()) {
            return Err(Error::Configuration(
                "A signing key resolver and a key object or key bytes cannot both be specified. Choose either.".to_string(),
            ));
        }

        Ok(JwtParser {
            key: self.key,
            key_bytes: self.key_bytes,
            resolver: self.resolver,
            codec_resolver: self
                .codec_resolver
                .unwrap_or_else(|| Arc::new(DefaultCompressionCodecResolver::new())),
            deserializer: self.deserializer.unwrap_or_else(|| Arc::new(JsonSerializer)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            validation: self.validation,
        })
    }
}
