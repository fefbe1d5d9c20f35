//! Application-facing token service
//!
//! [`TokenProvider`] is the narrow interface an application layer depends
//! on: issue a token from a claims map, read it back, and validate it with
//! rejection reasons suitable for an API response. [`JwtTokenProvider`]
//! implements it on top of the builder and parser with a single symmetric
//! key, usually loaded from a [`KeyStore`].

mod key_store;

pub use key_store::KeyStore;

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::algorithm::SignatureAlgorithm;
use crate::builder::JwtBuilder;
use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::keys::{Key, Keys};
use crate::parser::{JwtParser, JwtParserBuilder};
use crate::token::Header;

/// Default token lifetime: seven days
pub const DEFAULT_EXPIRATION_MILLIS: i64 = 604_800_000;

const TOKEN_KIND: &str = "JWT";

/// Configuration for [`JwtTokenProvider`]
#[derive(Debug, Clone)]
pub struct TokenProviderConfig {
    /// JSON key file read or created by [`JwtTokenProvider::from_config`]
    pub key_path: PathBuf,
    /// Lifetime of issued tokens in milliseconds
    pub expiration_millis: i64,
    /// Algorithm used to sign issued tokens
    pub algorithm: SignatureAlgorithm,
}

impl Default for TokenProviderConfig {
    fn default() -> Self {
        Self {
            key_path: PathBuf::from("jws-key.json"),
            expiration_millis: DEFAULT_EXPIRATION_MILLIS,
            algorithm: SignatureAlgorithm::HS256,
        }
    }
}

impl TokenProviderConfig {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            ..Self::default()
        }
    }

    pub fn expiration_millis(mut self, millis: i64) -> Self {
        self.expiration_millis = millis;
        self
    }

    pub fn algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Issue and check tokens for an application
pub trait TokenProvider: Send + Sync {
    /// Signed token carrying `claims` plus `jti`, `iat` and `exp`
    fn generate_token_from_claims(&self, claims: Claims) -> Result<String>;

    /// Claims of a valid signed token
    fn get_claims_from_token(&self, token: &str) -> Result<Claims>;

    /// `sub` of a valid signed token
    fn get_subject_from_token(&self, token: &str) -> Result<Option<String>>;

    /// `exp` of a valid signed token
    fn get_token_expiry_from_token(&self, token: &str) -> Result<Option<DateTime<Utc>>>;

    /// Lifetime of issued tokens in milliseconds
    fn expiry_duration(&self) -> i64;

    /// `Ok(true)` for an acceptable token, [`Error::InvalidToken`] otherwise
    fn validate_token(&self, token: &str) -> Result<bool>;
}

/// [`TokenProvider`] backed by one signing key
#[derive(Clone)]
pub struct JwtTokenProvider {
    key: Key,
    key_id: String,
    algorithm: SignatureAlgorithm,
    expiration_millis: i64,
    parser: JwtParser,
}

impl std::fmt::Debug for JwtTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenProvider")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("expiration_millis", &self.expiration_millis)
            .finish()
    }
}

impl JwtTokenProvider {
    /// Provider signing with `key` under `config.algorithm`
    pub fn new(key: Key, config: &TokenProviderConfig) -> Result<Self> {
        config.algorithm.assert_valid_signing_key(&key)?;
        let parser = JwtParserBuilder::new()
            .set_signing_key(key.verification_key())
            .build()?;

        Ok(Self {
            key_id: Keys::create_key_id(&key),
            key,
            algorithm: config.algorithm,
            expiration_millis: config.expiration_millis,
            parser,
        })
    }

    /// Provider using the key file named in `config`, created on first use
    pub fn from_config(config: &TokenProviderConfig) -> Result<Self> {
        let store = KeyStore::load_or_generate(&config.key_path)?;
        Self::new(store.key().clone(), config)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Like [`TokenProvider::generate_token_from_claims`] with an explicit lifetime
    pub fn generate_token_from_claims_with_expiration(
        &self,
        claims: Claims,
        expiration_millis: i64,
    ) -> Result<String> {
        let now = Utc::now();
        let expiration = now + Duration::milliseconds(expiration_millis);

        JwtBuilder::new()
            .set_header_param(Header::KEY_ID, self.key_id.as_str())
            .set_claims(claims)
            .set_id(&Uuid::new_v4().to_string())
            .set_issued_at(now)
            .set_expiration(expiration)
            .sign_with_algorithm(self.key.clone(), self.algorithm)?
            .compact()
    }
}

impl TokenProvider for JwtTokenProvider {
    fn generate_token_from_claims(&self, claims: Claims) -> Result<String> {
        self.generate_token_from_claims_with_expiration(claims, self.expiration_millis)
    }

    fn get_claims_from_token(&self, token: &str) -> Result<Claims> {
        let (_, claims, _) = self.parser.parse_claims_jws(token)?.into_parts();
        Ok(claims)
    }

    fn get_subject_from_token(&self, token: &str) -> Result<Option<String>> {
        let claims = self.get_claims_from_token(token)?;
        Ok(claims.subject().map(str::to_string))
    }

    fn get_token_expiry_from_token(&self, token: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.get_claims_from_token(token)?.expiration())
    }

    fn expiry_duration(&self) -> i64 {
        self.expiration_millis
    }

    fn validate_token(&self, token: &str) -> Result<bool> {
        let reason = match self.parser.parse_claims_jws(token) {
            Ok(_) => return Ok(true),
            Err(Error::SignatureInvalid) => "Incorrect signature",
            Err(Error::Malformed(_) | Error::Decoding(_)) => "Malformed jwt token",
            Err(Error::Expired(_)) => "Token expired. Refresh required",
            Err(Error::Unsupported(_)) => "Unsupported JWT token",
            Err(Error::IllegalArgument(_)) => "Illegal argument token",
            Err(other) => return Err(other),
        };

        debug!(reason, "rejected token");
        Err(Error::InvalidToken {
            kind: TOKEN_KIND.to_string(),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> JwtTokenProvider {
        let key = Keys::secret_key_for(SignatureAlgorithm::HS512).unwrap();
        JwtTokenProvider::new(key, &TokenProviderConfig::default()).unwrap()
    }

    fn claims_for(sub: &str) -> Claims {
        let mut claims = Claims::new();
        claims.set_subject(sub).insert("role", "admin");
        claims
    }

    #[test]
    fn test_issued_token_carries_registered_claims() {
        let provider = provider();
        let token = provider.generate_token_from_claims(claims_for("alice")).unwrap();

        let claims = provider.get_claims_from_token(&token).unwrap();
        assert_eq!(claims.subject(), Some("alice"));
        assert_eq!(claims.get_str("role"), Some("admin"));
        assert_eq!(claims.id().map(str::len), Some(36));

        let iat = claims.issued_at().unwrap();
        let exp = provider.get_token_expiry_from_token(&token).unwrap().unwrap();
        assert_eq!((exp - iat).num_milliseconds(), DEFAULT_EXPIRATION_MILLIS);
    }

    #[test]
    fn test_kid_header() {
        let provider = provider();
        let token = provider.generate_token_from_claims(claims_for("bob")).unwrap();
        let jws = provider.parser.parse_claims_jws(&token).unwrap();
        assert_eq!(jws.header().key_id(), Some(provider.key_id()));
        assert_eq!(jws.header().algorithm(), Some("HS256"));
    }

    #[test]
    fn test_validate_token_reasons() {
        let provider = provider();

        let expired = provider
            .generate_token_from_claims_with_expiration(claims_for("carol"), -60_000)
            .unwrap();
        assert_eq!(
            provider.validate_token(&expired).unwrap_err(),
            Error::InvalidToken {
                kind: "JWT".into(),
                reason: "Token expired. Refresh required".into()
            }
        );

        let foreign = self::provider()
            .generate_token_from_claims(claims_for("carol"))
            .unwrap();
        assert_eq!(
            provider.validate_token(&foreign).unwrap_err().to_string(),
            "Invalid JWT token: Incorrect signature"
        );

        assert!(matches!(
            provider.validate_token("abc"),
            Err(Error::InvalidToken { reason, .. }) if reason == "Malformed jwt token"
        ));
        assert!(matches!(
            provider.validate_token(""),
            Err(Error::InvalidToken { reason, .. }) if reason == "Illegal argument token"
        ));

        let good = provider.generate_token_from_claims(claims_for("dave")).unwrap();
        assert!(provider.validate_token(&good).unwrap());
        assert_eq!(provider.get_subject_from_token(&good).unwrap().as_deref(), Some("dave"));
    }

    #[test]
    fn test_rejects_non_hmac_algorithm_for_secret() {
        let key = Keys::secret_key_for(SignatureAlgorithm::HS256).unwrap();
        let config = TokenProviderConfig::default().algorithm(SignatureAlgorithm::RS256);
        assert!(matches!(
            JwtTokenProvider::new(key, &config),
            Err(Error::InvalidKey(_))
        ));
    }
}
