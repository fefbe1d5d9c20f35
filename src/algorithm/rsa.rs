use ::rsa::pkcs1::DecodeRsaPublicKey;
use ::rsa::{Pkcs1v15Sign, Pss};
use constant_time_eq::constant_time_eq;
use ring::signature::{self, RsaEncoding, RsaParameters, UnparsedPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::algorithm::{AlgorithmFamily, SignatureAlgorithm, SignatureValidator, Signer};
use crate::error::{Error, Result};
use crate::keys::{system_random, RsaPrivateKey, RsaPublicKey};

fn signing_padding(algorithm: SignatureAlgorithm) -> Result<&'static dyn RsaEncoding> {
    match algorithm {
        SignatureAlgorithm::RS256 => Ok(&signature::RSA_PKCS1_SHA256),
        SignatureAlgorithm::RS384 => Ok(&signature::RSA_PKCS1_SHA384),
        SignatureAlgorithm::RS512 => Ok(&signature::RSA_PKCS1_SHA512),
        SignatureAlgorithm::PS256 => Ok(&signature::RSA_PSS_SHA256),
        SignatureAlgorithm::PS384 => Ok(&signature::RSA_PSS_SHA384),
        SignatureAlgorithm::PS512 => Ok(&signature::RSA_PSS_SHA512),
        other => Err(not_rsa(other)),
    }
}

fn verification_parameters(algorithm: SignatureAlgorithm) -> Result<&'static RsaParameters> {
    match algorithm {
        SignatureAlgorithm::RS256 => Ok(&signature::RSA_PKCS1_2048_8192_SHA256),
        SignatureAlgorithm::RS384 => Ok(&signature::RSA_PKCS1_2048_8192_SHA384),
        SignatureAlgorithm::RS512 => Ok(&signature::RSA_PKCS1_2048_8192_SHA512),
        SignatureAlgorithm::PS256 => Ok(&signature::RSA_PSS_2048_8192_SHA256),
        SignatureAlgorithm::PS384 => Ok(&signature::RSA_PSS_2048_8192_SHA384),
        SignatureAlgorithm::PS512 => Ok(&signature::RSA_PSS_2048_8192_SHA512),
        other => Err(not_rsa(other)),
    }
}

/// Smallest modulus ring will verify
const RING_MIN_MODULUS_BITS: u32 = 2048;

/// Verifies against a modulus ring refuses
///
/// Weak keys are reported by the caller but must still verify, so shorter
/// moduli go through the `rsa` crate instead.
fn verify_short_modulus(
    algorithm: SignatureAlgorithm,
    key: &RsaPublicKey,
    data: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let public = ::rsa::RsaPublicKey::from_pkcs1_der(key.as_der())
        .map_err(|e| Error::InvalidKey(format!("Unable to read RSA public key: {e}")))?;
    let outcome = match algorithm {
        SignatureAlgorithm::RS256 => {
            public.verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(data), signature)
        }
        SignatureAlgorithm::RS384 => {
            public.verify(Pkcs1v15Sign::new::<Sha384>(), &Sha384::digest(data), signature)
        }
        SignatureAlgorithm::RS512 => {
            public.verify(Pkcs1v15Sign::new::<Sha512>(), &Sha512::digest(data), signature)
        }
        SignatureAlgorithm::PS256 => {
            public.verify(Pss::new::<Sha256>(), &Sha256::digest(data), signature)
        }
        SignatureAlgorithm::PS384 => {
            public.verify(Pss::new::<Sha384>(), &Sha384::digest(data), signature)
        }
        SignatureAlgorithm::PS512 => {
            public.verify(Pss::new::<Sha512>(), &Sha512::digest(data), signature)
        }
        other => return Err(not_rsa(other)),
    };
    Ok(outcome.is_ok())
}

fn not_rsa(algorithm: SignatureAlgorithm) -> Error {
    Error::IllegalArgument(format!("The {algorithm} algorithm is not an RSA algorithm."))
}

/// RS*/PS* signer backed by ring
pub struct RsaSigner {
    algorithm: SignatureAlgorithm,
    padding: &'static dyn RsaEncoding,
    key: RsaPrivateKey,
}

impl RsaSigner {
    pub fn new(algorithm: SignatureAlgorithm, key: &RsaPrivateKey) -> Result<Self> {
        Ok(Self {
            algorithm,
            padding: signing_padding(algorithm)?,
            key: key.clone(),
        })
    }
}

impl Signer for RsaSigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key_pair = self.key.key_pair()?;
        let mut signature = vec![0u8; key_pair.public().modulus_len()];
        key_pair
            .sign(self.padding, system_random(), data, &mut signature)
            .map_err(|_| Error::Signing(format!("{} signing failed", self.algorithm)))?;
        Ok(signature)
    }
}

/// RS*/PS* validator
///
/// With a public key the signature is verified directly. With a private key,
/// PKCS#1 v1.5 signatures are recomputed and compared (they are
/// deterministic); PSS signatures are verified with the derived public key.
/// Public keys under 2048 bits are verified outside ring.
pub struct RsaValidator {
    algorithm: SignatureAlgorithm,
    parameters: &'static RsaParameters,
    public: RsaPublicKey,
    resigner: Option<RsaSigner>,
}

impl RsaValidator {
    pub fn for_public_key(algorithm: SignatureAlgorithm, key: &RsaPublicKey) -> Result<Self> {
        Ok(Self {
            algorithm,
            parameters: verification_parameters(algorithm)?,
            public: key.clone(),
            resigner: None,
        })
    }

    pub fn for_private_key(algorithm: SignatureAlgorithm, key: &RsaPrivateKey) -> Result<Self> {
        let resigner = match algorithm.family() {
            AlgorithmFamily::Rsa => Some(RsaSigner::new(algorithm, key)?),
            _ => None,
        };
        Ok(Self {
            algorithm,
            parameters: verification_parameters(algorithm)?,
            public: key.public_key().clone(),
            resigner,
        })
    }
}

impl SignatureValidator for RsaValidator {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn is_valid(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        if let Some(signer) = &self.resigner {
            let computed = signer.sign(data)?;
            return Ok(computed.len() == signature.len() && constant_time_eq(&computed, signature));
        }
        if self.public.modulus_bits() < RING_MIN_MODULUS_BITS {
            return verify_short_modulus(self.algorithm, &self.public, data, signature);
        }
        let public_key = UnparsedPublicKey::new(self.parameters, self.public.as_der());
        Ok(public_key.verify(data, signature).is_ok())
    }
}
