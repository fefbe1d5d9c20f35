//! Compact JWT parsing and verification
//!
//! A [`JwtParser`] is configured once through [`JwtParserBuilder`] and then
//! shared freely: it holds no per-parse state. Parsing runs in a fixed
//! order: split, decode the header, decompress and decode the body, verify
//! the signature, then validate claims. The first failure ends the parse.
//!
//! Strings longer than [`MAX_TOKEN_LENGTH`] are rejected before splitting, and
//! compressed bodies are inflated only up to
//! [`MAX_DECOMPRESSED_PAYLOAD_SIZE`](crate::limits::MAX_DECOMPRESSED_PAYLOAD_SIZE).
//!
//! Bodies must decode to UTF-8. Invalid byte sequences are reported as
//! [`Error::Malformed`] rather than replaced.

mod builder;
mod handler;

pub use builder::JwtParserBuilder;
pub use handler::{JwtHandler, SigningKeyResolver};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::algorithm::{JwtSignatureValidator, SignatureAlgorithm};
use crate::claims::{Claims, ClaimsValidator, ValidationConfig};
use crate::clock::Clock;
use crate::compression::CompressionCodecResolver;
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::limits::MAX_TOKEN_LENGTH;
use crate::serialize::Deserializer;
use crate::token::{Body, Header, Jws, Jwt, Parsed};
use crate::utils::base64url;

const SEPARATOR: char = '.';

const MISSING_ALGORITHM: &str =
    "JWT string has a digest/signature, but the header does not reference a valid signature algorithm.";

const SIGNED_JWS_UNSUPPORTED: &str = "Signed JWSs are not supported.";

/// Immutable, thread-safe JWT parser
///
/// # Examples
///
/// ```
/// use jwtkit::{Jwts, Keys, SignatureAlgorithm};
///
/// let key = Keys::secret_key_for(SignatureAlgorithm::HS256)?;
/// let token = Jwts::builder()
///     .set_subject("Joe")
///     .sign_with(key.clone())?
///     .compact()?;
///
/// let parser = Jwts::parser_builder().set_signing_key(key).build()?;
/// let jws = parser.parse_claims_jws(&token)?;
/// assert_eq!(jws.body().subject(), Some("Joe"));
/// # Ok::<(), jwtkit::Error>(())
/// ```
#[derive(Clone)]
pub struct JwtParser {
    pub(crate) key: Option<Key>,
    pub(crate) key_bytes: Option<Vec<u8>>,
    pub(crate) resolver: Option<Arc<dyn SigningKeyResolver>>,
    pub(crate) codec_resolver: Arc<dyn CompressionCodecResolver>,
    pub(crate) deserializer: Arc<dyn Deserializer>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) validation: ValidationConfig,
}

impl std::fmt::Debug for JwtParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtParser")
            .field("key", &self.key.as_ref().map(Key::key_type))
            .field("key_bytes", &self.key_bytes.as_ref().map(|_| "[redacted]"))
            .field("resolver", &self.resolver.is_some())
            .field("validation", &self.validation)
            .finish()
    }
}

/// Trimmed compact segments. Empty segments are `None`.
struct Segments<'a> {
    header: Option<&'a str>,
    body: Option<&'a str>,
    signature: Option<&'a str>,
}

impl<'a> Segments<'a> {
    fn split(jwt: &'a str) -> Result<Self> {
        let parts: Vec<&str> = jwt.split(SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(Error::Malformed(format!(
                "JWT strings must contain exactly 2 period characters. Found: {}",
                parts.len() - 1
            )));
        }

        Ok(Self {
            header: clean(parts[0]),
            body: clean(parts[1]),
            signature: clean(parts[2]),
        })
    }

    /// The exact bytes covered by the signature
    fn signing_input(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            self.header.unwrap_or_default(),
            self.body.unwrap_or_default()
        )
    }
}

fn clean(segment: &str) -> Option<&str> {
    let trimmed = segment.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl JwtParser {
    /// True when `jwt` carries a non-empty third segment
    ///
    /// Only the character after the second separator is inspected; the token
    /// is not otherwise validated.
    pub fn is_signed(&self, jwt: &str) -> bool {
        let mut separators = 0;
        for c in jwt.chars() {
            if separators == 2 {
                return !c.is_whitespace() && c != SEPARATOR;
            }
            if c == SEPARATOR {
                separators += 1;
            }
        }
        false
    }

    /// Parse any of the four token shapes
    pub fn parse(&self, jwt: &str) -> Result<Parsed> {
        if jwt.trim().is_empty() {
            return Err(Error::IllegalArgument(
                "JWT String argument cannot be null or empty.".to_string(),
            ));
        }
        if jwt.len() > MAX_TOKEN_LENGTH {
            return Err(Error::Malformed(format!(
                "JWT string is {} bytes, which exceeds the maximum of {MAX_TOKEN_LENGTH}.",
                jwt.len()
            )));
        }
        if jwt == ".." {
            return Err(Error::Malformed(
                "JWT string '..' is missing a header.".to_string(),
            ));
        }

        let segments = Segments::split(jwt)?;
        let header_segment = segments
            .header
            .ok_or_else(|| Error::Malformed("JWT string is missing a header.".to_string()))?;

        let header_json = base64url::decode_bytes(header_segment)?;
        let header = Header::from(
            self.deserializer
                .deserialize(&header_json)
                .map_err(|e| Error::Malformed(format!("Unable to read JWT header: {e}")))?,
        );

        let body = self.read_body(&header, segments.body)?;

        if let Some(signature) = segments.signature {
            self.verify_signature(&header, &body, &segments.signing_input(), signature)?;
        }

        if let Body::Claims(claims) = &body {
            ClaimsValidator::validate(&header, claims, self.clock.now(), &self.validation)?;
        }

        debug!(
            alg = header.algorithm().unwrap_or("none"),
            signed = segments.signature.is_some(),
            "parsed JWT"
        );

        Ok(match (segments.signature, body) {
            (None, Body::Plaintext(text)) => Parsed::PlaintextJwt(Jwt::new(header, text)),
            (None, Body::Claims(claims)) => Parsed::ClaimsJwt(Jwt::new(header, claims)),
            (Some(sig), Body::Plaintext(text)) => {
                Parsed::PlaintextJws(Jws::new(header, text, sig.to_string()))
            }
            (Some(sig), Body::Claims(claims)) => {
                Parsed::ClaimsJws(Jws::new(header, claims, sig.to_string()))
            }
        })
    }

    /// Parse and dispatch to the callback matching the token shape
    pub fn parse_with<T, H>(&self, jwt: &str, handler: &H) -> Result<T>
    where
        H: JwtHandler<T> + ?Sized,
    {
        match self.parse(jwt)? {
            Parsed::PlaintextJwt(jwt) => handler.on_plaintext_jwt(jwt),
            Parsed::ClaimsJwt(jwt) => handler.on_claims_jwt(jwt),
            Parsed::PlaintextJws(jws) => handler.on_plaintext_jws(jws),
            Parsed::ClaimsJws(jws) => handler.on_claims_jws(jws),
        }
    }

    /// Accept only an unsigned token with a plaintext body
    pub fn parse_plaintext_jwt(&self, jwt: &str) -> Result<Jwt<String>> {
        self.parse(jwt)
            .map_err(unsigned_only)?
            .into_plaintext_jwt()
    }

    /// Accept only an unsigned token with a claims body
    pub fn parse_claims_jwt(&self, jwt: &str) -> Result<Jwt<Claims>> {
        self.parse(jwt).map_err(unsigned_only)?.into_claims_jwt()
    }

    /// Accept only a signed token with a plaintext body
    pub fn parse_plaintext_jws(&self, jws: &str) -> Result<Jws<String>> {
        self.parse(jws)?.into_plaintext_jws()
    }

    /// Accept only a signed token with a claims body
    pub fn parse_claims_jws(&self, jws: &str) -> Result<Jws<Claims>> {
        self.parse(jws)?.into_claims_jws()
    }

    fn read_body(&self, header: &Header, segment: Option<&str>) -> Result<Body> {
        let mut bytes = match segment {
            Some(segment) => base64url::decode_bytes(segment)?,
            None => Vec::new(),
        };

        if let Some(codec) = self.codec_resolver.resolve(header)? {
            bytes = codec.decompress(&bytes)?;
        }

        let text = String::from_utf8(bytes)
            .map_err(|_| Error::Malformed("JWT body is not valid UTF-8.".to_string()))?;

        if text.starts_with('{') && text.ends_with('}') {
            let map = self
                .deserializer
                .deserialize(text.as_bytes())
                .map_err(|e| Error::Malformed(format!("Unable to read JWT claims: {e}")))?;
            Ok(Body::Claims(Claims::from(map)))
        } else {
            Ok(Body::Plaintext(text))
        }
    }

    fn verify_signature(
        &self,
        header: &Header,
        body: &Body,
        signing_input: &str,
        signature: &str,
    ) -> Result<()> {
        let algorithm = header
            .algorithm()
            .and_then(|name| SignatureAlgorithm::for_name(name).ok())
            .filter(|alg| *alg != SignatureAlgorithm::None)
            .ok_or_else(|| Error::Malformed(MISSING_ALGORITHM.to_string()))?;

        let key = self.resolve_key(algorithm, header, body)?;

        match algorithm.assert_valid_verification_key(&key) {
            Ok(()) => {}
            Err(e) if e.is_weak_key() => {
                warn!(alg = %algorithm, error = %e, "verifying JWT with a weak key");
            }
            Err(Error::InvalidKey(_) | Error::IllegalArgument(_)) => {
                return Err(key_mismatch(algorithm, &key));
            }
            Err(e) => return Err(e),
        }

        let validator = JwtSignatureValidator::new(algorithm, &key).map_err(|e| match e {
            Error::InvalidKey(_) | Error::IllegalArgument(_) => key_mismatch(algorithm, &key),
            other => other,
        })?;

        if validator.is_valid(signing_input, signature)? {
            Ok(())
        } else {
            Err(Error::SignatureInvalid)
        }
    }

    fn resolve_key(&self, algorithm: SignatureAlgorithm, header: &Header, body: &Body) -> Result<Key> {
        if let Some(key) = &self.key {
            return Ok(key.clone());
        }
        if let Some(bytes) = &self.key_bytes {
            if !algorithm.is_hmac() {
                return Err(Error::IllegalArgument(
                    "Key bytes can only be specified for HMAC signatures. Please specify an RSA or ECDSA key instead."
                        .to_string(),
                ));
            }
            return Ok(Key::symmetric(bytes.clone()));
        }
        if let Some(resolver) = &self.resolver {
            return resolver.resolve_signing_key(header, body);
        }
        Err(Error::IllegalArgument(
            "A signing key must be specified if the specified JWT is digitally signed.".to_string(),
        ))
    }
}

fn key_mismatch(algorithm: SignatureAlgorithm, key: &Key) -> Error {
    Error::Unsupported(format!(
        "The parsed JWT indicates it was signed with the {algorithm} signature algorithm, but the specified signing key of type {} may not be used to validate {algorithm} signatures.  Because the specified signing key reflects a specific and expected algorithm, and the JWT does not reflect this algorithm, it is likely that the JWT was not expected and therefore should not be trusted.  Another possibility is that the parser was configured with the incorrect signing key, but this cannot be assumed for security reasons.",
        key.key_type()
    ))
}

/// Unsigned-only entry points report a missing key as an unsupported shape
fn unsigned_only(error: Error) -> Error {
    match error {
        Error::IllegalArgument(_) => Error::Unsupported(SIGNED_JWS_UNSUPPORTED.to_string()),
        other => other,
    }
}
