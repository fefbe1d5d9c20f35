mod traits;

pub mod ecdsa;
pub mod hmac;
pub mod rsa;

pub use traits::{
    create_signer, create_validator, JwtSignatureValidator, JwtSigner, SignatureValidator, Signer,
};

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::keys::{EcdsaCurve, Key};

/// Family an algorithm belongs to, which decides the acceptable key types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    None,
    Hmac,
    Rsa,
    RsaPss,
    Ecdsa,
}

/// Digest used by an algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

/// JWS signature algorithm, as named by the `alg` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// No digital signature or MAC performed
    None,

    /// HMAC with SHA-256
    HS256,

    /// HMAC with SHA-384
    HS384,

    /// HMAC with SHA-512
    HS512,

    /// RSASSA-PKCS-v1_5 with SHA-256
    RS256,

    /// RSASSA-PKCS-v1_5 with SHA-384
    RS384,

    /// RSASSA-PKCS-v1_5 with SHA-512
    RS512,

    /// ECDSA with P-256 and SHA-256
    ES256,

    /// ECDSA with P-384 and SHA-384
    ES384,

    /// ECDSA with P-521 and SHA-512
    ES512,

    /// RSASSA-PSS with SHA-256 and MGF1 with SHA-256
    PS256,

    /// RSASSA-PSS with SHA-384 and MGF1 with SHA-384
    PS384,

    /// RSASSA-PSS with SHA-512 and MGF1 with SHA-512
    PS512,
}

const RSA_MIN_KEY_BITS: u32 = 2048;

impl SignatureAlgorithm {
    pub const ALL: [SignatureAlgorithm; 13] = [
        SignatureAlgorithm::None,
        SignatureAlgorithm::HS256,
        SignatureAlgorithm::HS384,
        SignatureAlgorithm::HS512,
        SignatureAlgorithm::RS256,
        SignatureAlgorithm::RS384,
        SignatureAlgorithm::RS512,
        SignatureAlgorithm::ES256,
        SignatureAlgorithm::ES384,
        SignatureAlgorithm::ES512,
        SignatureAlgorithm::PS256,
        SignatureAlgorithm::PS384,
        SignatureAlgorithm::PS512,
    ];

    /// Name carried in the `alg` header
    pub fn value(&self) -> &'static str {
        match self {
            SignatureAlgorithm::None => "none",
            SignatureAlgorithm::HS256 => "HS256",
            SignatureAlgorithm::HS384 => "HS384",
            SignatureAlgorithm::HS512 => "HS512",
            SignatureAlgorithm::RS256 => "RS256",
            SignatureAlgorithm::RS384 => "RS384",
            SignatureAlgorithm::RS512 => "RS512",
            SignatureAlgorithm::ES256 => "ES256",
            SignatureAlgorithm::ES384 => "ES384",
            SignatureAlgorithm::ES512 => "ES512",
            SignatureAlgorithm::PS256 => "PS256",
            SignatureAlgorithm::PS384 => "PS384",
            SignatureAlgorithm::PS512 => "PS512",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignatureAlgorithm::None => "No digital signature or MAC performed",
            SignatureAlgorithm::HS256 => "HMAC using SHA-256",
            SignatureAlgorithm::HS384 => "HMAC using SHA-384",
            SignatureAlgorithm::HS512 => "HMAC using SHA-512",
            SignatureAlgorithm::RS256 => "RSASSA-PKCS-v1_5 using SHA-256",
            SignatureAlgorithm::RS384 => "RSASSA-PKCS-v1_5 using SHA-384",
            SignatureAlgorithm::RS512 => "RSASSA-PKCS-v1_5 using SHA-512",
            SignatureAlgorithm::ES256 => "ECDSA using P-256 and SHA-256",
            SignatureAlgorithm::ES384 => "ECDSA using P-384 and SHA-384",
            SignatureAlgorithm::ES512 => "ECDSA using P-521 and SHA-512",
            SignatureAlgorithm::PS256 => "RSASSA-PSS using SHA-256 and MGF1 with SHA-256",
            SignatureAlgorithm::PS384 => "RSASSA-PSS using SHA-384 and MGF1 with SHA-384",
            SignatureAlgorithm::PS512 => "RSASSA-PSS using SHA-512 and MGF1 with SHA-512",
        }
    }

    /// Family name as used by the JCA, e.g. `HmacSHA256` or `SHA256withECDSA`
    pub fn jca_name(&self) -> Option<&'static str> {
        match self {
            SignatureAlgorithm::None => None,
            SignatureAlgorithm::HS256 => Some("HmacSHA256"),
            SignatureAlgorithm::HS384 => Some("HmacSHA384"),
            SignatureAlgorithm::HS512 => Some("HmacSHA512"),
            SignatureAlgorithm::RS256 => Some("SHA256withRSA"),
            SignatureAlgorithm::RS384 => Some("SHA384withRSA"),
            SignatureAlgorithm::RS512 => Some("SHA512withRSA"),
            SignatureAlgorithm::ES256 => Some("SHA256withECDSA"),
            SignatureAlgorithm::ES384 => Some("SHA384withECDSA"),
            SignatureAlgorithm::ES512 => Some("SHA512withECDSA"),
            SignatureAlgorithm::PS256
            | SignatureAlgorithm::PS384
            | SignatureAlgorithm::PS512 => Some("RSASSA-PSS"),
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            SignatureAlgorithm::None => AlgorithmFamily::None,
            SignatureAlgorithm::HS256 | SignatureAlgorithm::HS384 | SignatureAlgorithm::HS512 => {
                AlgorithmFamily::Hmac
            }
            SignatureAlgorithm::RS256 | SignatureAlgorithm::RS384 | SignatureAlgorithm::RS512 => {
                AlgorithmFamily::Rsa
            }
            SignatureAlgorithm::PS256 | SignatureAlgorithm::PS384 | SignatureAlgorithm::PS512 => {
                AlgorithmFamily::RsaPss
            }
            SignatureAlgorithm::ES256 | SignatureAlgorithm::ES384 | SignatureAlgorithm::ES512 => {
                AlgorithmFamily::Ecdsa
            }
        }
    }

    pub fn digest(&self) -> Option<HashAlgorithm> {
        match self {
            SignatureAlgorithm::None => None,
            SignatureAlgorithm::HS256
            | SignatureAlgorithm::RS256
            | SignatureAlgorithm::ES256
            | SignatureAlgorithm::PS256 => Some(HashAlgorithm::Sha256),
            SignatureAlgorithm::HS384
            | SignatureAlgorithm::RS384
            | SignatureAlgorithm::ES384
            | SignatureAlgorithm::PS384 => Some(HashAlgorithm::Sha384),
            SignatureAlgorithm::HS512
            | SignatureAlgorithm::RS512
            | SignatureAlgorithm::ES512
            | SignatureAlgorithm::PS512 => Some(HashAlgorithm::Sha512),
        }
    }

    /// Minimum key strength in bits
    pub fn min_key_length(&self) -> u32 {
        match self.family() {
            AlgorithmFamily::None => 0,
            AlgorithmFamily::Hmac => self.digest_bits(),
            AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss => RSA_MIN_KEY_BITS,
            AlgorithmFamily::Ecdsa => self.curve().map_or(0, |c| c.order_bits()),
        }
    }

    fn digest_bits(&self) -> u32 {
        match self.digest() {
            Some(HashAlgorithm::Sha256) => 256,
            Some(HashAlgorithm::Sha384) => 384,
            Some(HashAlgorithm::Sha512) => 512,
            None => 0,
        }
    }

    /// Curve an ECDSA algorithm signs on
    pub fn curve(&self) -> Option<EcdsaCurve> {
        match self {
            SignatureAlgorithm::ES256 => Some(EcdsaCurve::P256),
            SignatureAlgorithm::ES384 => Some(EcdsaCurve::P384),
            SignatureAlgorithm::ES512 => Some(EcdsaCurve::P521),
            _ => None,
        }
    }

    /// Width of an `R || S` ECDSA signature: 64, 96 or 132 bytes
    pub fn signature_byte_length(&self) -> Option<usize> {
        self.curve().map(|c| 2 * c.coordinate_len())
    }

    pub fn is_hmac(&self) -> bool {
        self.family() == AlgorithmFamily::Hmac
    }

    /// RS* and PS*
    pub fn is_rsa(&self) -> bool {
        matches!(self.family(), AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss)
    }

    pub fn is_elliptic_curve(&self) -> bool {
        self.family() == AlgorithmFamily::Ecdsa
    }

    /// Look an algorithm up by its `alg` name, ignoring case
    pub fn for_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.value().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::Unsupported(format!("Unsupported signature algorithm '{name}'")))
    }

    /// Strongest algorithm the given private key can sign with
    ///
    /// Symmetric keys map to HS512/HS384/HS256 by length, RSA keys to
    /// RS512/RS384/RS256 by modulus size, ECDSA keys to the algorithm of their curve.
    pub fn for_signing_key(key: &Key) -> Result<Self> {
        match key {
            Key::Symmetric(secret) => {
                let bits = secret.bit_length();
                if bits >= 512 {
                    Ok(SignatureAlgorithm::HS512)
                } else if bits >= 384 {
                    Ok(SignatureAlgorithm::HS384)
                } else if bits >= 256 {
                    Ok(SignatureAlgorithm::HS256)
                } else {
                    Err(Error::WeakKey(format!(
                        "The specified SecretKey is not strong enough to be used with JWT HMAC signature algorithms.  The JWT specification requires HMAC keys to be >= 256 bits long.  The specified key is {bits} bits.  See https://tools.ietf.org/html/rfc7518#section-3.2 for more information."
                    )))
                }
            }
            Key::RsaPrivate(rsa) => {
                let bits = rsa.modulus_bits();
                if bits >= 4096 {
                    Ok(SignatureAlgorithm::RS512)
                } else if bits >= 3072 {
                    Ok(SignatureAlgorithm::RS384)
                } else if bits >= RSA_MIN_KEY_BITS {
                    Ok(SignatureAlgorithm::RS256)
                } else {
                    Err(Error::WeakKey(format!(
                        "The specified RSA signing key is not strong enough to be used with JWT RSA signature algorithms.  The JWT specification requires RSA keys to be >= 2048 bits long.  The specified RSA key is {bits} bits.  See https://tools.ietf.org/html/rfc7518#section-3.3 for more information."
                    )))
                }
            }
            Key::EcdsaPrivate(ec) => Ok(match ec.curve() {
                EcdsaCurve::P256 => SignatureAlgorithm::ES256,
                EcdsaCurve::P384 => SignatureAlgorithm::ES384,
                EcdsaCurve::P521 => SignatureAlgorithm::ES512,
            }),
            Key::RsaPublic(_) | Key::EcdsaPublic(_) => Err(Error::InvalidKey(format!(
                "JWT signing requires a private or secret key; {} keys can only verify signatures.",
                key.key_type()
            ))),
        }
    }

    /// Check that `key` can produce signatures with this algorithm
    pub fn assert_valid_signing_key(&self, key: &Key) -> Result<()> {
        self.assert_valid_key(key, true)
    }

    /// Check that `key` can verify signatures made with this algorithm
    pub fn assert_valid_verification_key(&self, key: &Key) -> Result<()> {
        self.assert_valid_key(key, false)
    }

    fn assert_valid_key(&self, key: &Key, signing: bool) -> Result<()> {
        let purpose = if signing { "signing" } else { "verification" };
        let type_ok = match (self.family(), key) {
            (AlgorithmFamily::None, _) => {
                return Err(Error::InvalidKey(
                    "The 'none' signature algorithm does not support cryptographic keys."
                        .to_string(),
                ))
            }
            (AlgorithmFamily::Hmac, Key::Symmetric(_)) => true,
            (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Key::RsaPrivate(_)) => true,
            (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Key::RsaPublic(_)) => !signing,
            (AlgorithmFamily::Ecdsa, Key::EcdsaPrivate(_)) => true,
            (AlgorithmFamily::Ecdsa, Key::EcdsaPublic(_)) => !signing,
            _ => false,
        };
        if !type_ok {
            return Err(Error::InvalidKey(format!(
                "{} {purpose} keys cannot be {} keys.",
                self.value(),
                key.key_type()
            )));
        }

        if let Some(curve) = self.curve() {
            let key_curve = match key {
                Key::EcdsaPrivate(k) => k.curve(),
                Key::EcdsaPublic(k) => k.curve(),
                _ => curve,
            };
            if key_curve != curve {
                return Err(Error::InvalidKey(format!(
                    "{} {purpose} keys must use curve {curve}, found {key_curve}.",
                    self.value()
                )));
            }
        }

        let bits = key.bit_length();
        if bits < self.min_key_length() {
            return Err(Error::WeakKey(format!(
                "The {purpose} key's size is {bits} bits which is not secure enough for the {} algorithm.  The JWT JWA Specification (RFC 7518) states that keys used with {} MUST have a size >= {} bits.",
                self.value(),
                self.value(),
                self.min_key_length()
            )));
        }
        Ok(())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::for_name(s)
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_name() {
        assert_eq!(SignatureAlgorithm::for_name("HS256").unwrap(), SignatureAlgorithm::HS256);
        assert_eq!(SignatureAlgorithm::for_name("es512").unwrap(), SignatureAlgorithm::ES512);
        assert_eq!(SignatureAlgorithm::for_name("NONE").unwrap(), SignatureAlgorithm::None);
        assert!(matches!(
            SignatureAlgorithm::for_name("HS1024"),
            Err(Error::Unsupported(_))
        ));
        assert_eq!("PS384".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::PS384);
    }

    #[test]
    fn test_value_roundtrip() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(SignatureAlgorithm::for_name(alg.value()).unwrap(), alg);
            assert_eq!(alg.to_string(), alg.value());
        }
    }

    #[test]
    fn test_min_key_lengths() {
        assert_eq!(SignatureAlgorithm::HS256.min_key_length(), 256);
        assert_eq!(SignatureAlgorithm::HS384.min_key_length(), 384);
        assert_eq!(SignatureAlgorithm::HS512.min_key_length(), 512);
        assert_eq!(SignatureAlgorithm::RS256.min_key_length(), 2048);
        assert_eq!(SignatureAlgorithm::PS512.min_key_length(), 2048);
        assert_eq!(SignatureAlgorithm::ES512.min_key_length(), 521);
    }

    #[test]
    fn test_signature_byte_lengths() {
        assert_eq!(SignatureAlgorithm::ES256.signature_byte_length(), Some(64));
        assert_eq!(SignatureAlgorithm::ES384.signature_byte_length(), Some(96));
        assert_eq!(SignatureAlgorithm::ES512.signature_byte_length(), Some(132));
        assert_eq!(SignatureAlgorithm::HS256.signature_byte_length(), None);
    }

    #[test]
    fn test_family_predicates() {
        assert!(SignatureAlgorithm::HS384.is_hmac());
        assert!(SignatureAlgorithm::PS256.is_rsa());
        assert!(SignatureAlgorithm::RS256.is_rsa());
        assert!(SignatureAlgorithm::ES384.is_elliptic_curve());
        assert!(!SignatureAlgorithm::None.is_hmac());
        assert_eq!(SignatureAlgorithm::PS256.jca_name(), Some("RSASSA-PSS"));
    }

    #[test]
    fn test_for_signing_key_by_length() {
        let alg = |len: usize| SignatureAlgorithm::for_signing_key(&Key::symmetric(vec![1u8; len]));
        assert_eq!(alg(64).unwrap(), SignatureAlgorithm::HS512);
        assert_eq!(alg(48).unwrap(), SignatureAlgorithm::HS384);
        assert_eq!(alg(32).unwrap(), SignatureAlgorithm::HS256);
        assert!(alg(16).unwrap_err().is_weak_key());
    }

    #[test]
    fn test_hmac_key_checks() {
        let key = Key::symmetric(vec![1u8; 32]);
        assert!(SignatureAlgorithm::HS256.assert_valid_signing_key(&key).is_ok());
        assert!(SignatureAlgorithm::HS512
            .assert_valid_signing_key(&key)
            .unwrap_err()
            .is_weak_key());
        assert!(matches!(
            SignatureAlgorithm::RS256.assert_valid_verification_key(&key),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            SignatureAlgorithm::None.assert_valid_signing_key(&key),
            Err(Error::InvalidKey(_))
        ));
    }
}
