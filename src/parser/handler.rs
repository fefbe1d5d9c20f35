use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::token::{
    Body, Header, Jws, Jwt, SIGNED_CLAIMS_UNSUPPORTED, SIGNED_PLAINTEXT_UNSUPPORTED,
    UNSIGNED_CLAIMS_UNSUPPORTED, UNSIGNED_PLAINTEXT_UNSUPPORTED,
};

/// Looks up the verification key from the token itself
///
/// Invoked exactly once per parse of a signed token, after the header and
/// body are decoded and before the signature is checked. Nothing is cached
/// between calls.
///
/// Closures taking `(&Header, &Body)` implement this trait:
///
/// ```
/// use jwtkit::{Body, Header, Jwts, Key};
///
/// let parser = Jwts::parser_builder()
///     .set_signing_key_resolver(|header: &Header, _body: &Body| {
///         match header.key_id() {
///             Some("primary") => Ok(Key::symmetric(vec![7u8; 32])),
///             other => Err(jwtkit::Error::InvalidKey(format!("unknown kid {other:?}"))),
///         }
///     })
///     .build()?;
/// # Ok::<(), jwtkit::Error>(())
/// ```
pub trait SigningKeyResolver: Send + Sync {
    fn resolve_signing_key(&self, header: &Header, body: &Body) -> Result<Key>;
}

impl<F> SigningKeyResolver for F
where
    F: Fn(&Header, &Body) -> Result<Key> + Send + Sync,
{
    fn resolve_signing_key(&self, header: &Header, body: &Body) -> Result<Key> {
        self(header, body)
    }
}

/// Visitor over the four token shapes, used with
/// [`JwtParser::parse_with`](crate::JwtParser::parse_with)
///
/// Every callback rejects its shape by default; implement only the ones the
/// caller accepts.
pub trait JwtHandler<T> {
    fn on_plaintext_jwt(&self, jwt: Jwt<String>) -> Result<T> {
        let _ = jwt;
        Err(Error::Unsupported(UNSIGNED_PLAINTEXT_UNSUPPORTED.to_string()))
    }

    fn on_claims_jwt(&self, jwt: Jwt<Claims>) -> Result<T> {
        let _ = jwt;
        Err(Error::Unsupported(UNSIGNED_CLAIMS_UNSUPPORTED.to_string()))
    }

    fn on_plaintext_jws(&self, jws: Jws<String>) -> Result<T> {
        let _ = jws;
        Err(Error::Unsupported(SIGNED_PLAINTEXT_UNSUPPORTED.to_string()))
    }

    fn on_claims_jws(&self, jws: Jws<Claims>) -> Result<T> {
        let _ = jws;
        Err(Error::Unsupported(SIGNED_CLAIMS_UNSUPPORTED.to_string()))
    }
}
