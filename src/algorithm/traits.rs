use crate::algorithm::{ecdsa, hmac, rsa, AlgorithmFamily, SignatureAlgorithm};
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::utils::base64url;

/// Produces raw signatures over arbitrary bytes
///
/// HMAC, RSA and ECDSA implement this trait; [`create_signer`] picks the
/// implementation for an algorithm.
pub trait Signer: Send + Sync {
    /// The algorithm this signer produces signatures for
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Sign `data`, returning the signature in its JWS byte form
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Checks raw signatures over arbitrary bytes
pub trait SignatureValidator: Send + Sync {
    fn algorithm(&self) -> SignatureAlgorithm;

    /// `Ok(false)` for a well-formed signature that does not match.
    /// Errors are reserved for signatures that cannot be interpreted at all.
    fn is_valid(&self, data: &[u8], signature: &[u8]) -> Result<bool>;
}

/// Build the signer for `algorithm`, enforcing key type and strength
pub fn create_signer(algorithm: SignatureAlgorithm, key: &Key) -> Result<Box<dyn Signer>> {
    algorithm.assert_valid_signing_key(key)?;

    match (algorithm.family(), key) {
        (AlgorithmFamily::Hmac, Key::Symmetric(secret)) => {
            Ok(Box::new(hmac::MacSigner::new(algorithm, secret)?))
        }
        (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Key::RsaPrivate(private)) => {
            Ok(Box::new(rsa::RsaSigner::new(algorithm, private)?))
        }
        (AlgorithmFamily::Ecdsa, Key::EcdsaPrivate(private)) => {
            Ok(Box::new(ecdsa::EcdsaSigner::new(algorithm, private)?))
        }
        _ => Err(Error::IllegalArgument(format!(
            "The '{algorithm}' algorithm cannot be used to sign with a {} key.",
            key.key_type()
        ))),
    }
}

/// Build the validator for `algorithm`
///
/// Only the key type is checked here; callers decide how to treat weak keys.
pub fn create_validator(
    algorithm: SignatureAlgorithm,
    key: &Key,
) -> Result<Box<dyn SignatureValidator>> {
    match (algorithm.family(), key) {
        (AlgorithmFamily::Hmac, Key::Symmetric(secret)) => {
            Ok(Box::new(hmac::MacValidator::new(algorithm, secret)?))
        }
        (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Key::RsaPublic(public)) => {
            Ok(Box::new(rsa::RsaValidator::for_public_key(algorithm, public)?))
        }
        (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Key::RsaPrivate(private)) => {
            Ok(Box::new(rsa::RsaValidator::for_private_key(algorithm, private)?))
        }
        (AlgorithmFamily::Ecdsa, Key::EcdsaPublic(public)) => {
            Ok(Box::new(ecdsa::EcdsaValidator::new(algorithm, public)?))
        }
        (AlgorithmFamily::Ecdsa, Key::EcdsaPrivate(private)) => Ok(Box::new(
            ecdsa::EcdsaValidator::new(algorithm, private.public_key())?,
        )),
        (AlgorithmFamily::None, _) => Err(Error::IllegalArgument(
            "The 'none' algorithm has no signature to validate.".to_string(),
        )),
        _ => Err(Error::InvalidKey(format!(
            "{algorithm} verification keys cannot be {} keys.",
            key.key_type()
        ))),
    }
}

/// Signs the `header.payload` text of a compact JWT
pub struct JwtSigner {
    signer: Box<dyn Signer>,
}

impl JwtSigner {
    pub fn new(algorithm: SignatureAlgorithm, key: &Key) -> Result<Self> {
        Ok(Self {
            signer: create_signer(algorithm, key)?,
        })
    }

    /// Base64URL signature of `jwt_without_signature`
    pub fn sign(&self, jwt_without_signature: &str) -> Result<String> {
        let signature = self.signer.sign(jwt_without_signature.as_bytes())?;
        Ok(base64url::encode_bytes(&signature))
    }
}

/// Checks the signature segment of a compact JWS
pub struct JwtSignatureValidator {
    validator: Box<dyn SignatureValidator>,
}

impl JwtSignatureValidator {
    pub fn new(algorithm: SignatureAlgorithm, key: &Key) -> Result<Self> {
        Ok(Self {
            validator: create_validator(algorithm, key)?,
        })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.validator.algorithm()
    }

    pub fn is_valid(&self, jwt_without_signature: &str, base64url_signature: &str) -> Result<bool> {
        let signature = base64url::decode_bytes(base64url_signature)?;
        self.validator
            .is_valid(jwt_without_signature.as_bytes(), &signature)
    }
}
