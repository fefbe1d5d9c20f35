use ring::rand::SecureRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING, ECDSA_P384_SHA384_ASN1_SIGNING};
use sha2::{Digest, Sha256};

use crate::algorithm::SignatureAlgorithm;
use crate::error::{Error, Result};
use crate::keys::{system_random, EcdsaCurve, Key};
use crate::utils::base64url;

/// A private key and the public key that verifies its signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private: Key,
    pub public: Key,
}

/// Key creation and inspection helpers
pub struct Keys;

impl Keys {
    /// Wrap `bytes` as an HMAC key, rejecting anything shorter than 256 bits
    pub fn hmac_sha_key_for(bytes: &[u8]) -> Result<Key> {
        let bits = bytes.len() * 8;
        if bits < 256 {
            let msg = format!(
                "The specified key byte array is {bits} bits which is not secure enough for any JWT HMAC-SHA algorithm.  The JWT JWA Specification (RFC 7518, Section 3.2) states that keys used with HMAC-SHA algorithms MUST have a size >= 256 bits (the key size must be greater than or equal to the hash output size).  Consider using Keys::secret_key_for(SignatureAlgorithm::HS256) to create a key guaranteed to be secure enough for your preferred HMAC-SHA algorithm.  See https://tools.ietf.org/html/rfc7518#section-3.2 for more information."
            );
            return Err(Error::WeakKey(msg));
        }
        Ok(Key::symmetric(bytes))
    }

    /// Random secret exactly as long as the algorithm's minimum
    pub fn secret_key_for(algorithm: SignatureAlgorithm) -> Result<Key> {
        if !algorithm.is_hmac() {
            return Err(Error::IllegalArgument(format!(
                "The {algorithm} algorithm does not support shared secret keys."
            )));
        }
        let mut secret = vec![0u8; (algorithm.min_key_length() / 8) as usize];
        system_random()
            .fill(&mut secret)
            .map_err(|_| Error::Signing("Unable to generate random key bytes".to_string()))?;
        Ok(Key::symmetric(secret))
    }

    /// Fresh ECDSA key pair on the curve of `algorithm`
    ///
    /// RSA key generation is not offered; load RSA keys from PKCS#8 instead.
    pub fn ec_key_pair_for(algorithm: SignatureAlgorithm) -> Result<KeyPair> {
        let curve = algorithm.curve().ok_or_else(|| {
            Error::IllegalArgument(format!(
                "Key pair generation is only available for elliptic curve algorithms, not {algorithm}."
            ))
        })?;

        let private = match curve {
            EcdsaCurve::P256 | EcdsaCurve::P384 => {
                let alg = if curve == EcdsaCurve::P256 {
                    &ECDSA_P256_SHA256_ASN1_SIGNING
                } else {
                    &ECDSA_P384_SHA384_ASN1_SIGNING
                };
                let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, system_random())
                    .map_err(|_| Error::Signing(format!("Unable to generate {curve} key")))?;
                Key::ecdsa_private_pkcs8(curve, pkcs8.as_ref())?
            }
            EcdsaCurve::P521 => {
                let signing_key = p521::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
                Key::ecdsa_private_scalar(curve, &signing_key.to_bytes())?
            }
        };

        let public = private.verification_key();
        Ok(KeyPair { private, public })
    }

    /// Stable identifier for a key: Base64URL SHA-256 of its public material
    ///
    /// Symmetric keys hash their secret, RSA keys their PKCS#1 public key and
    /// ECDSA keys their uncompressed point, so a private key and its public
    /// half share an id.
    pub fn create_key_id(key: &Key) -> String {
        let mut hasher = Sha256::new();
        match key.verification_key() {
            Key::Symmetric(k) => hasher.update(k.as_bytes()),
            Key::RsaPublic(k) => hasher.update(k.as_der()),
            Key::EcdsaPublic(k) => hasher.update(k.as_bytes()),
            Key::RsaPrivate(_) | Key::EcdsaPrivate(_) => {}
        }
        base64url::encode_bytes(&hasher.finalize())
    }
}
