//! Compact JWT construction
//!
//! [`JwtBuilder`] collects a header, a body (claims or a plaintext payload),
//! an optional signing key and an optional compression codec, then produces
//! the compact `header.body.signature` string in [`JwtBuilder::compact`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::algorithm::{JwtSigner, SignatureAlgorithm};
use crate::claims::Claims;
use crate::compression::CompressionCodec;
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::serialize::{JsonSerializer, Serializer};
use crate::token::Header;
use crate::utils::{base64, base64url};

/// Consuming builder for compact JWTs
///
/// # Examples
///
/// ```
/// use jwtkit::{Jwts, Keys, SignatureAlgorithm};
///
/// let key = Keys::secret_key_for(SignatureAlgorithm::HS256)?;
/// let token = Jwts::builder()
///     .set_subject("Joe")
///     .sign_with(key)?
///     .compact()?;
///
/// assert_eq!(token.matches('.').count(), 2);
/// # Ok::<(), jwtkit::Error>(())
/// ```
pub struct JwtBuilder {
    header: Option<Header>,
    claims: Option<Claims>,
    payload: Option<String>,
    signing: Option<(SignatureAlgorithm, Key)>,
    codec: Option<Arc<dyn CompressionCodec>>,
    serializer: Arc<dyn Serializer>,
    deferred: Option<Error>,
}

impl Default for JwtBuilder {
    fn default() -> Self {
        Self {
            header: None,
            claims: None,
            payload: None,
            signing: None,
            codec: None,
            serializer: Arc::new(JsonSerializer),
            deferred: None,
        }
    }
}

impl JwtBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize header and claims with `serializer` instead of the JSON default
    pub fn serialize_to_json_with(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    // ============================================================================
    // Header
    // ============================================================================

    /// Replace the header
    pub fn set_header(mut self, header: impl Into<Header>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Merge `params` into the header, creating it if needed
    pub fn set_header_params(mut self, params: Map<String, Value>) -> Self {
        self.header.get_or_insert_with(Header::new).extend(params);
        self
    }

    /// Set one header parameter; `null` removes it
    pub fn set_header_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.header.get_or_insert_with(Header::new).insert(name, value);
        self
    }

    // ============================================================================
    // Body
    // ============================================================================

    /// Use a plaintext body. Cannot be combined with claims.
    pub fn set_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Replace the claims
    pub fn set_claims(mut self, claims: impl Into<Claims>) -> Self {
        self.claims = Some(claims.into());
        self
    }

    /// Merge `claims` into the existing claims
    pub fn add_claims(mut self, claims: Map<String, Value>) -> Self {
        self.claims.get_or_insert_with(Claims::new).extend(claims);
        self
    }

    /// Set a single claim; a `None`/`null` value removes it
    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        if name.trim().is_empty() {
            self.defer(Error::IllegalArgument(
                "Claim property name cannot be null or empty.".to_string(),
            ));
            return self;
        }
        let value = value.into();
        if self.claims.is_none() && value.is_null() {
            return self;
        }
        self.claims.get_or_insert_with(Claims::new).insert(name, value);
        self
    }

    pub fn set_issuer(self, iss: &str) -> Self {
        self.registered(|c| c.set_issuer(iss), iss.trim().is_empty())
    }

    pub fn set_subject(self, sub: &str) -> Self {
        self.registered(|c| c.set_subject(sub), sub.trim().is_empty())
    }

    pub fn set_audience(self, aud: &str) -> Self {
        self.registered(|c| c.set_audience(aud), aud.trim().is_empty())
    }

    pub fn set_expiration(self, exp: impl Into<Option<DateTime<Utc>>>) -> Self {
        let exp = exp.into();
        self.registered(|c| c.set_expiration(exp), exp.is_none())
    }

    pub fn set_not_before(self, nbf: impl Into<Option<DateTime<Utc>>>) -> Self {
        let nbf = nbf.into();
        self.registered(|c| c.set_not_before(nbf), nbf.is_none())
    }

    pub fn set_issued_at(self, iat: impl Into<Option<DateTime<Utc>>>) -> Self {
        let iat = iat.into();
        self.registered(|c| c.set_issued_at(iat), iat.is_none())
    }

    pub fn set_id(self, jti: &str) -> Self {
        self.registered(|c| c.set_id(jti), jti.trim().is_empty())
    }

    /// Apply a registered-claim setter. Clearing a value never creates a claims map.
    fn registered(mut self, set: impl FnOnce(&mut Claims) -> &mut Claims, clearing: bool) -> Self {
        if self.claims.is_none() && clearing {
            return self;
        }
        set(self.claims.get_or_insert_with(Claims::new));
        self
    }

    // ============================================================================
    // Signing and compression
    // ============================================================================

    /// Sign with the strongest algorithm the key supports
    pub fn sign_with(self, key: Key) -> Result<Self> {
        let algorithm = SignatureAlgorithm::for_signing_key(&key)?;
        self.sign_with_algorithm(key, algorithm)
    }

    /// Sign with an explicit algorithm; the key must be valid for it
    pub fn sign_with_algorithm(mut self, key: Key, algorithm: SignatureAlgorithm) -> Result<Self> {
        algorithm.assert_valid_signing_key(&key)?;
        self.signing = Some((algorithm, key));
        Ok(self)
    }

    /// Sign with raw HMAC secret bytes
    pub fn sign_with_secret_bytes(self, algorithm: SignatureAlgorithm, secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::IllegalArgument(
                "secret key byte array cannot be null or empty.".to_string(),
            ));
        }
        if !algorithm.is_hmac() {
            return Err(Error::IllegalArgument(
                "Key bytes may only be specified for HMAC signatures.  If using RSA or Elliptic Curve, use the sign_with(Key) method instead.".to_string(),
            ));
        }
        self.sign_with_algorithm(Key::symmetric(secret), algorithm)
    }

    /// Sign with a standard-Base64 encoded HMAC secret
    pub fn sign_with_base64_secret(self, algorithm: SignatureAlgorithm, secret: &str) -> Result<Self> {
        let bytes = base64::decode_bytes(secret)?;
        self.sign_with_secret_bytes(algorithm, &bytes)
    }

    /// Compress the body with `codec` and advertise it in the `zip` header
    pub fn compress_with(mut self, codec: impl CompressionCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    fn defer(&mut self, error: Error) {
        self.deferred.get_or_insert(error);
    }

    // ============================================================================
    // Compact serialization
    // ============================================================================

    /// Produce the compact string
    ///
    /// Unsigned tokens end with a bare `.` and carry `"alg":"none"`.
    pub fn compact(self) -> Result<String> {
        if let Some(error) = self.deferred {
            return Err(error);
        }

        let claims = self.claims.filter(|c| !c.is_empty());
        let payload = match (self.payload, &claims) {
            (None, None) => Some(String::new()),
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "Both 'payload' and 'claims' cannot both be specified. Choose either one."
                        .to_string(),
                ))
            }
            (payload, _) => payload,
        };

        let mut header = self.header.unwrap_or_default();
        let algorithm = self
            .signing
            .as_ref()
            .map_or(SignatureAlgorithm::None, |(alg, _)| *alg);
        header.set_algorithm(algorithm.value());
        if let Some(codec) = &self.codec {
            header.set_compression_algorithm(codec.algorithm_name());
        }

        let header_json = self.serializer.serialize(header.as_map())?;
        let encoded_header = base64url::encode_bytes(&header_json);

        let mut body = match (payload, &claims) {
            (Some(payload), _) => payload.into_bytes(),
            (None, Some(claims)) => self.serializer.serialize(claims.as_map())?,
            (None, None) => Vec::new(),
        };
        if let Some(codec) = &self.codec {
            body = codec.compress(&body)?;
        }
        let encoded_body = base64url::encode_bytes(&body);

        let mut jwt = format!("{encoded_header}.{encoded_body}");
        match &self.signing {
            Some((algorithm, key)) => {
                let signature = JwtSigner::new(*algorithm, key)?.sign(&jwt)?;
                jwt.push('.');
                jwt.push_str(&signature);
            }
            None => jwt.push('.'),
        }

        debug!(
            alg = algorithm.value(),
            compressed = self.codec.is_some(),
            len = jwt.len(),
            "compacted JWT"
        );
        Ok(jwt)
    }
}
