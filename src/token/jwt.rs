use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::token::Header;

/// Decoded body of a token: either free text or a claims object
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Plaintext(String),
    Claims(Claims),
}

impl Body {
    pub fn as_claims(&self) -> Option<&Claims> {
        match self {
            Body::Claims(claims) => Some(claims),
            Body::Plaintext(_) => None,
        }
    }

    pub fn as_plaintext(&self) -> Option<&str> {
        match self {
            Body::Plaintext(text) => Some(text),
            Body::Claims(_) => None,
        }
    }
}

/// Unsigned token
#[derive(Debug, Clone, PartialEq)]
pub struct Jwt<B> {
    header: Header,
    body: B,
}

impl<B> Jwt<B> {
    pub fn new(header: Header, body: B) -> Self {
        Self { header, body }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn into_parts(self) -> (Header, B) {
        (self.header, self.body)
    }
}

/// Signed token whose signature has been verified
#[derive(Debug, Clone, PartialEq)]
pub struct Jws<B> {
    header: Header,
    body: B,
    signature: String,
}

impl<B> Jws<B> {
    pub fn new(header: Header, body: B, signature: String) -> Self {
        Self {
            header,
            body,
            signature,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    /// Base64URL signature segment, as received
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn into_parts(self) -> (Header, B, String) {
        (self.header, self.body, self.signature)
    }
}

/// The four shapes a compact token can take
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    PlaintextJwt(Jwt<String>),
    ClaimsJwt(Jwt<Claims>),
    PlaintextJws(Jws<String>),
    ClaimsJws(Jws<Claims>),
}

pub(crate) const UNSIGNED_PLAINTEXT_UNSUPPORTED: &str = "Unsigned plaintext JWTs are not supported.";
pub(crate) const UNSIGNED_CLAIMS_UNSUPPORTED: &str = "Unsigned Claims JWTs are not supported.";
pub(crate) const SIGNED_PLAINTEXT_UNSUPPORTED: &str = "Signed plaintext JWSs are not supported.";
pub(crate) const SIGNED_CLAIMS_UNSUPPORTED: &str = "Signed Claims JWSs are not supported.";

impl Parsed {
    pub fn header(&self) -> &Header {
        match self {
            Parsed::PlaintextJwt(t) => t.header(),
            Parsed::ClaimsJwt(t) => t.header(),
            Parsed::PlaintextJws(t) => t.header(),
            Parsed::ClaimsJws(t) => t.header(),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Parsed::PlaintextJws(_) | Parsed::ClaimsJws(_))
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Parsed::PlaintextJws(t) => Some(t.signature()),
            Parsed::ClaimsJws(t) => Some(t.signature()),
            _ => None,
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Parsed::ClaimsJwt(t) => Some(t.body()),
            Parsed::ClaimsJws(t) => Some(t.body()),
            _ => None,
        }
    }

    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Parsed::PlaintextJwt(t) => Some(t.body()),
            Parsed::PlaintextJws(t) => Some(t.body()),
            _ => None,
        }
    }

    fn unsupported(&self) -> Error {
        let msg = match self {
            Parsed::PlaintextJwt(_) => UNSIGNED_PLAINTEXT_UNSUPPORTED,
            Parsed::ClaimsJwt(_) => UNSIGNED_CLAIMS_UNSUPPORTED,
            Parsed::PlaintextJws(_) => SIGNED_PLAINTEXT_UNSUPPORTED,
            Parsed::ClaimsJws(_) => SIGNED_CLAIMS_UNSUPPORTED,
        };
        Error::Unsupported(msg.to_string())
    }

    pub fn into_plaintext_jwt(self) -> Result<Jwt<String>> {
        match self {
            Parsed::PlaintextJwt(t) => Ok(t),
            other => Err(other.unsupported()),
        }
    }

    pub fn into_claims_jwt(self) -> Result<Jwt<Claims>> {
        match self {
            Parsed::ClaimsJwt(t) => Ok(t),
            other => Err(other.unsupported()),
        }
    }

    pub fn into_plaintext_jws(self) -> Result<Jws<String>> {
        match self {
            Parsed::PlaintextJws(t) => Ok(t),
            other => Err(other.unsupported()),
        }
    }

    pub fn into_claims_jws(self) -> Result<Jws<Claims>> {
        match self {
            Parsed::ClaimsJws(t) => Ok(t),
            other => Err(other.unsupported()),
        }
    }
}
