/// Key types for JWT signing and signature verification
///
/// This module provides a type-safe abstraction over the supported keys:
/// - Symmetric keys (for HMAC algorithms)
/// - RSA private keys (PKCS#8) and public keys (PKCS#1 or SubjectPublicKeyInfo)
/// - ECDSA private and public keys on P-256, P-384 and P-521
///
/// Private keys always carry their public half, so a private key can be
/// handed to the parser to verify what it signed.
mod factory;

pub use factory::{KeyPair, Keys};

use std::fmt;
use std::sync::OnceLock;

use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair as _, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
    ECDSA_P384_SHA384_ASN1_SIGNING,
};

use crate::error::{Error, Result};
use crate::utils::der;

/// Process-wide secure random source
pub(crate) fn system_random() -> &'static SystemRandom {
    static RNG: OnceLock<SystemRandom> = OnceLock::new();
    RNG.get_or_init(SystemRandom::new)
}

/// A key that can be used for JWT signing or signature verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Symmetric key for HMAC algorithms
    Symmetric(SymmetricKey),

    /// RSA private key for RS*/PS* signing
    RsaPrivate(RsaPrivateKey),

    /// RSA public key for RS*/PS* verification
    RsaPublic(RsaPublicKey),

    /// ECDSA private key for ES* signing
    EcdsaPrivate(EcdsaPrivateKey),

    /// ECDSA public key for ES* verification
    EcdsaPublic(EcdsaPublicKey),
}

impl Key {
    /// Create a symmetric key from bytes
    pub fn symmetric(secret: impl Into<Vec<u8>>) -> Self {
        Key::Symmetric(SymmetricKey::new(secret.into()))
    }

    /// Create an RSA private key from PKCS#8 DER
    pub fn rsa_private_pkcs8(der: &[u8]) -> Result<Self> {
        RsaPrivateKey::from_pkcs8_der(der).map(Key::RsaPrivate)
    }

    /// Create an RSA public key from PKCS#1 `RSAPublicKey` DER
    pub fn rsa_public_pkcs1(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_pkcs1_der(der).map(Key::RsaPublic)
    }

    /// Create an RSA public key from DER-encoded SubjectPublicKeyInfo
    pub fn rsa_public_spki(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_spki_der(der).map(Key::RsaPublic)
    }

    /// Create an ECDSA private key from PKCS#8 DER (P-256 and P-384)
    pub fn ecdsa_private_pkcs8(curve: EcdsaCurve, der: &[u8]) -> Result<Self> {
        EcdsaPrivateKey::from_pkcs8_der(curve, der).map(Key::EcdsaPrivate)
    }

    /// Create an ECDSA private key from its raw scalar (P-521)
    pub fn ecdsa_private_scalar(curve: EcdsaCurve, scalar: &[u8]) -> Result<Self> {
        EcdsaPrivateKey::from_scalar(curve, scalar).map(Key::EcdsaPrivate)
    }

    /// Create an ECDSA public key from an uncompressed SEC1 point
    pub fn ecdsa_public(curve: EcdsaCurve, point: &[u8]) -> Result<Self> {
        EcdsaPublicKey::from_sec1(curve, point).map(Key::EcdsaPublic)
    }

    /// Get key type name for error messages
    pub fn key_type(&self) -> &'static str {
        match self {
            Key::Symmetric(_) => "Symmetric",
            Key::RsaPrivate(_) => "RSA private",
            Key::RsaPublic(_) => "RSA public",
            Key::EcdsaPrivate(_) => "ECDSA private",
            Key::EcdsaPublic(_) => "ECDSA public",
        }
    }

    /// Strength in bits: secret length, RSA modulus size or curve order size
    pub fn bit_length(&self) -> u32 {
        match self {
            Key::Symmetric(k) => k.bit_length(),
            Key::RsaPrivate(k) => k.modulus_bits(),
            Key::RsaPublic(k) => k.modulus_bits(),
            Key::EcdsaPrivate(k) => k.curve().order_bits(),
            Key::EcdsaPublic(k) => k.curve().order_bits(),
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(
            self,
            Key::Symmetric(_) | Key::RsaPrivate(_) | Key::EcdsaPrivate(_)
        )
    }

    /// The key that verifies what this key signs
    ///
    /// Public keys and symmetric keys return themselves.
    pub fn verification_key(&self) -> Key {
        match self {
            Key::RsaPrivate(k) => Key::RsaPublic(k.public_key().clone()),
            Key::EcdsaPrivate(k) => Key::EcdsaPublic(k.public_key().clone()),
            other => other.clone(),
        }
    }

    /// Get as symmetric key or return error
    pub fn as_symmetric(&self) -> Result<&SymmetricKey> {
        match self {
            Key::Symmetric(key) => Ok(key),
            _ => Err(Error::InvalidKey(format!(
                "HMAC signing keys must be symmetric keys, found {}",
                self.key_type()
            ))),
        }
    }
}

// ============================================================================
// Symmetric
// ============================================================================

/// Symmetric key for HMAC algorithms
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    secret: Vec<u8>,
}

impl SymmetricKey {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.secret
    }

    pub fn bit_length(&self) -> u32 {
        bits_for_len(self.secret.len())
    }
}

fn bits_for_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX).saturating_mul(8)
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bits", &self.bit_length())
            .finish_non_exhaustive()
    }
}

impl From<Vec<u8>> for SymmetricKey {
    fn from(secret: Vec<u8>) -> Self {
        Self::new(secret)
    }
}

impl From<&[u8]> for SymmetricKey {
    fn from(secret: &[u8]) -> Self {
        Self::new(secret.to_vec())
    }
}

impl From<&str> for SymmetricKey {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes().to_vec())
    }
}

// ============================================================================
// RSA
// ============================================================================

/// RSA public key, held as PKCS#1 `RSAPublicKey` DER
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    der: Vec<u8>,
    modulus_bits: u32,
}

impl RsaPublicKey {
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        let modulus_bits = der::rsa_modulus_bits(der)?;
        Ok(Self {
            der: der.to_vec(),
            modulus_bits,
        })
    }

    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        Self::from_pkcs1_der(der::rsa_spki_to_pkcs1(der)?)
    }

    /// PKCS#1 DER bytes
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn modulus_bits(&self) -> u32 {
        self.modulus_bits
    }
}

/// RSA private key, held as PKCS#8 DER
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    pkcs8: Vec<u8>,
    public: RsaPublicKey,
}

impl RsaPrivateKey {
    /// Parse and validate a PKCS#8 RSA key. Keys under 2048 bits are weak.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let key_pair = RsaKeyPair::from_pkcs8(der).map_err(|rejected| {
            let reason = rejected.to_string();
            if reason.contains("TooSmall") {
                Error::WeakKey(format!(
                    "RSA private key is too small ({reason}); RSA keys must be >= 2048 bits"
                ))
            } else {
                Error::InvalidKey(format!("Unable to parse RSA private key: {reason}"))
            }
        })?;
        let public = RsaPublicKey::from_pkcs1_der(key_pair.public().as_ref())?;
        Ok(Self {
            pkcs8: der.to_vec(),
            public,
        })
    }

    pub(crate) fn key_pair(&self) -> Result<RsaKeyPair> {
        RsaKeyPair::from_pkcs8(&self.pkcs8)
            .map_err(|e| Error::InvalidKey(format!("Unable to load RSA private key: {e}")))
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn modulus_bits(&self) -> u32 {
        self.public.modulus_bits
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ECDSA
// ============================================================================

/// ECDSA curve identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcdsaCurve {
    /// P-256 (secp256r1) curve
    P256,
    /// P-384 (secp384r1) curve
    P384,
    /// P-521 (secp521r1) curve
    P521,
}

impl EcdsaCurve {
    pub fn name(&self) -> &'static str {
        match self {
            EcdsaCurve::P256 => "P-256",
            EcdsaCurve::P384 => "P-384",
            EcdsaCurve::P521 => "P-521",
        }
    }

    /// Bit length of the curve order
    pub fn order_bits(&self) -> u32 {
        match self {
            EcdsaCurve::P256 => 256,
            EcdsaCurve::P384 => 384,
            EcdsaCurve::P521 => 521,
        }
    }

    /// Byte width of one coordinate or scalar
    pub fn coordinate_len(&self) -> usize {
        (self.order_bits() as usize).div_ceil(8)
    }

    /// Uncompressed SEC1 point length
    pub fn point_len(&self) -> usize {
        1 + 2 * self.coordinate_len()
    }
}

impl fmt::Display for EcdsaCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ECDSA public key as an uncompressed SEC1 point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaPublicKey {
    point: Vec<u8>,
    curve: EcdsaCurve,
}

impl EcdsaPublicKey {
    pub fn from_sec1(curve: EcdsaCurve, point: &[u8]) -> Result<Self> {
        if point.len() != curve.point_len() || point[0] != 0x04 {
            return Err(Error::InvalidKey(format!(
                "{curve} public keys must be uncompressed SEC1 points of {} bytes",
                curve.point_len()
            )));
        }
        Ok(Self {
            point: point.to_vec(),
            curve,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.point
    }

    pub fn curve(&self) -> EcdsaCurve {
        self.curve
    }
}

/// ECDSA private key
///
/// P-256 and P-384 keys are PKCS#8 DER; P-521 keys are the raw big-endian scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct EcdsaPrivateKey {
    material: Vec<u8>,
    public: EcdsaPublicKey,
}

impl EcdsaPrivateKey {
    pub fn from_pkcs8_der(curve: EcdsaCurve, der: &[u8]) -> Result<Self> {
        let alg = match curve {
            EcdsaCurve::P256 => &ECDSA_P256_SHA256_ASN1_SIGNING,
            EcdsaCurve::P384 => &ECDSA_P384_SHA384_ASN1_SIGNING,
            EcdsaCurve::P521 => {
                return Err(Error::InvalidKey(
                    "P-521 private keys are loaded from their raw scalar".to_string(),
                ))
            }
        };
        let key_pair = EcdsaKeyPair::from_pkcs8(alg, der, system_random())
            .map_err(|e| Error::InvalidKey(format!("Unable to parse {curve} private key: {e}")))?;
        let public = EcdsaPublicKey::from_sec1(curve, key_pair.public_key().as_ref())?;
        Ok(Self {
            material: der.to_vec(),
            public,
        })
    }

    pub fn from_scalar(curve: EcdsaCurve, scalar: &[u8]) -> Result<Self> {
        if curve != EcdsaCurve::P521 {
            return Err(Error::InvalidKey(format!(
                "{curve} private keys are loaded from PKCS#8"
            )));
        }
        let signing_key = p521::ecdsa::SigningKey::from_slice(scalar)
            .map_err(|e| Error::InvalidKey(format!("Unable to parse P-521 private key: {e}")))?;
        let verifying_key = p521::ecdsa::VerifyingKey::from(&signing_key);
        let point = verifying_key.to_encoded_point(false);
        let public = EcdsaPublicKey::from_sec1(curve, point.as_bytes())?;
        Ok(Self {
            material: scalar.to_vec(),
            public,
        })
    }

    pub(crate) fn material(&self) -> &[u8] {
        &self.material
    }

    pub fn curve(&self) -> EcdsaCurve {
        self.public.curve
    }

    pub fn public_key(&self) -> &EcdsaPublicKey {
        &self.public
    }
}

impl fmt::Debug for EcdsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaPrivateKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}
