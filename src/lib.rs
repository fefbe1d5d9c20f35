//! # jwtkit - Build, Sign, Parse and Validate JSON Web Tokens
//!
//! **jwtkit** produces and consumes JWTs in compact serialization
//! (`header.body.signature`). It covers unsigned tokens, HMAC, RSA
//! (PKCS#1 v1.5 and PSS) and ECDSA signatures, optional body compression and
//! registered-claim validation with clock skew.
//!
//! ## Overview
//!
//! A token is a JSON header and a body, each Base64URL encoded. The body is
//! either a JSON claims object or arbitrary text. When the header names an
//! algorithm other than `none`, a signature over `header.body` forms the
//! third segment; otherwise the token ends with a bare `.`.
//!
//! [`JwtBuilder`] assembles and signs tokens. [`JwtParser`] is configured
//! once through [`JwtParserBuilder`], is immutable afterwards and can be
//! shared across threads. Parsing is all or nothing: split, decode, verify
//! and validate all succeed, or the caller gets a single [`Error`].
//!
//! ## Quick Start
//!
//! ```
//! use jwtkit::{Jwts, Keys, SignatureAlgorithm};
//!
//! let key = Keys::secret_key_for(SignatureAlgorithm::HS256)?;
//!
//! let token = Jwts::builder()
//!     .set_issuer("https://example.com")
//!     .set_subject("Joe")
//!     .sign_with(key.clone())?
//!     .compact()?;
//!
//! let jws = Jwts::parser_builder()
//!     .set_signing_key(key)
//!     .require_issuer("https://example.com")
//!     .build()?
//!     .parse_claims_jws(&token)?;
//!
//! assert_eq!(jws.body().subject(), Some("Joe"));
//! # Ok::<(), jwtkit::Error>(())
//! ```
//!
//! ## Parse Flow
//!
//! ```text
//! compact string
//!     │ split on '.', exactly two separators
//!     ▼
//! header (JSON) ──► compression codec from "zip"
//!     │ decode + decompress body
//!     ▼
//! Claims or plaintext body
//!     │ resolve key, check key against "alg", verify signature
//!     ▼
//! exp / nbf with clock skew, expected claims
//!     ▼
//! Parsed::{PlaintextJwt, ClaimsJwt, PlaintextJws, ClaimsJws}
//! ```
//!
//! ## Algorithm Support
//!
//! - **HMAC**: HS256, HS384, HS512 (minimum key length equals hash length)
//! - **RSA**: RS256, RS384, RS512, PS256, PS384, PS512 (2048-bit minimum)
//! - **ECDSA**: ES256, ES384, ES512 (signatures in IEEE P1363 `r || s` form)
//!
//! Keys shorter than the algorithm's minimum are refused when signing and
//! tolerated with a warning when verifying.
//!
//! ## Compression
//!
//! `DEF` (zlib) and `GZIP` bodies are written with
//! [`JwtBuilder::compress_with`] and read back automatically through the
//! `zip` header.
//!
//! ## Timing Attack Protection
//!
//! HMAC signature comparison uses the [`constant_time_eq`](https://crates.io/crates/constant_time_eq)
//! crate.
//!
//! ## References
//!
//! - [RFC 7515](https://datatracker.ietf.org/doc/html/rfc7515): JSON Web Signature (JWS)
//! - [RFC 7518](https://datatracker.ietf.org/doc/html/rfc7518): JSON Web Algorithms (JWA)
//! - [RFC 7519](https://datatracker.ietf.org/doc/html/rfc7519): JSON Web Token (JWT)

// Core modules
pub mod error;
pub mod limits;
pub mod utils;

// Algorithm system
pub mod algorithm;
pub mod keys;

// Claims and validation
pub mod claims;
pub mod clock;

// Token types
pub mod token;

// Encoding strategies
pub mod compression;
pub mod serialize;

// Builder and parser (main public API)
pub mod builder;
mod jwts;
pub mod parser;

// Application-facing token service
pub mod provider;

// ============================================================================
// PUBLIC API
// ============================================================================

// Entry points
pub use builder::JwtBuilder;
pub use jwts::Jwts;
pub use parser::{JwtHandler, JwtParser, JwtParserBuilder, SigningKeyResolver};

// Token types
pub use token::{Body, Header, Jws, Jwt, Parsed};

// Claims and validation
pub use claims::{Claims, ValidationConfig};
pub use clock::{Clock, FixedClock, SystemClock};

// Algorithms and keys
pub use algorithm::{AlgorithmFamily, HashAlgorithm, SignatureAlgorithm};
pub use keys::{EcdsaCurve, Key, KeyPair, Keys};

// Strategies
pub use compression::{
    CompressionCodec, CompressionCodecResolver, CompressionCodecs, Deflate,
    DefaultCompressionCodecResolver, Gzip,
};
pub use serialize::{Deserializer, JsonSerializer, Serializer};

// Errors
pub use error::{Error, InvalidClaim, Result, TemporalClaim, TemporalViolation};

// Token service
pub use provider::{JwtTokenProvider, KeyStore, TokenProvider, TokenProviderConfig};
