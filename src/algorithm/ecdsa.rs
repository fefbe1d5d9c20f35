use ::ecdsa::signature::{Signer as _, Verifier as _};
use ring::signature::{
    EcdsaKeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_ASN1, ECDSA_P256_SHA256_ASN1_SIGNING,
    ECDSA_P384_SHA384_ASN1, ECDSA_P384_SHA384_ASN1_SIGNING,
};

use crate::algorithm::{SignatureAlgorithm, SignatureValidator, Signer};
use crate::error::{Error, Result};
use crate::keys::{system_random, EcdsaCurve, EcdsaPrivateKey, EcdsaPublicKey};
use crate::utils::der;

fn signature_length(algorithm: SignatureAlgorithm) -> Result<usize> {
    algorithm.signature_byte_length().ok_or_else(|| {
        Error::IllegalArgument(format!("The {algorithm} algorithm is not an ECDSA algorithm."))
    })
}

/// ES256/ES384/ES512 signer
///
/// The backend produces ASN.1 DER signatures; they are transcoded to the
/// fixed-width `R || S` form before being returned.
pub struct EcdsaSigner {
    algorithm: SignatureAlgorithm,
    signature_len: usize,
    key: EcdsaPrivateKey,
}

impl EcdsaSigner {
    pub fn new(algorithm: SignatureAlgorithm, key: &EcdsaPrivateKey) -> Result<Self> {
        Ok(Self {
            algorithm,
            signature_len: signature_length(algorithm)?,
            key: key.clone(),
        })
    }

    fn sign_der(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_failed = |e: &dyn std::fmt::Display| {
            Error::Signing(format!("{} signing failed: {e}", self.algorithm))
        };

        let ring_alg = match self.key.curve() {
            EcdsaCurve::P256 => &ECDSA_P256_SHA256_ASN1_SIGNING,
            EcdsaCurve::P384 => &ECDSA_P384_SHA384_ASN1_SIGNING,
            EcdsaCurve::P521 => {
                let signing_key = p521::ecdsa::SigningKey::from_slice(self.key.material())
                    .map_err(|e| Error::InvalidKey(format!("Unable to load P-521 key: {e}")))?;
                let signature: p521::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(|e| signing_failed(&e))?;
                return Ok(signature.to_der().as_bytes().to_vec());
            }
        };

        let rng = system_random();
        let key_pair = EcdsaKeyPair::from_pkcs8(ring_alg, self.key.material(), rng)
            .map_err(|e| Error::InvalidKey(format!("Unable to load {} key: {e}", self.key.curve())))?;
        let signature = key_pair.sign(rng, data).map_err(|e| signing_failed(&e))?;
        Ok(signature.as_ref().to_vec())
    }
}

impl Signer for EcdsaSigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let der_signature = self.sign_der(data)?;
        der::der_to_concat(&der_signature, self.signature_len)
    }
}

/// ES256/ES384/ES512 validator
///
/// Incoming `R || S` signatures of the wrong width are malformed; anything
/// else is transcoded to DER and handed to the backend.
pub struct EcdsaValidator {
    algorithm: SignatureAlgorithm,
    signature_len: usize,
    key: EcdsaPublicKey,
}

impl EcdsaValidator {
    pub fn new(algorithm: SignatureAlgorithm, key: &EcdsaPublicKey) -> Result<Self> {
        Ok(Self {
            algorithm,
            signature_len: signature_length(algorithm)?,
            key: key.clone(),
        })
    }
}

impl SignatureValidator for EcdsaValidator {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn is_valid(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        let der_signature = der::concat_to_der(signature, self.signature_len)?;

        match self.key.curve() {
            EcdsaCurve::P256 => Ok(UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, self.key.as_bytes())
                .verify(data, &der_signature)
                .is_ok()),
            EcdsaCurve::P384 => Ok(UnparsedPublicKey::new(&ECDSA_P384_SHA384_ASN1, self.key.as_bytes())
                .verify(data, &der_signature)
                .is_ok()),
            EcdsaCurve::P521 => {
                let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(self.key.as_bytes())
                    .map_err(|e| Error::InvalidKey(format!("Invalid P-521 public key: {e}")))?;
                let Ok(signature) = p521::ecdsa::Signature::from_der(&der_signature) else {
                    return Ok(false);
                };
                Ok(verifying_key.verify(data, &signature).is_ok())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{Key, Keys};

    fn private_key(algorithm: SignatureAlgorithm) -> EcdsaPrivateKey {
        match Keys::ec_key_pair_for(algorithm).unwrap().private {
            Key::EcdsaPrivate(key) => key,
            other => panic!("unexpected key {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_all_curves() {
        for (alg, len) in [
            (SignatureAlgorithm::ES256, 64),
            (SignatureAlgorithm::ES384, 96),
            (SignatureAlgorithm::ES512, 132),
        ] {
            let key = private_key(alg);
            let signature = EcdsaSigner::new(alg, &key).unwrap().sign(b"data").unwrap();
            assert_eq!(signature.len(), len, "{alg}");

            let validator = EcdsaValidator::new(alg, key.public_key()).unwrap();
            assert!(validator.is_valid(b"data", &signature).unwrap(), "{alg}");
            assert!(!validator.is_valid(b"other", &signature).unwrap(), "{alg}");
        }
    }

    #[test]
    fn test_flipped_bit_fails() {
        let key = private_key(SignatureAlgorithm::ES256);
        let mut signature = EcdsaSigner::new(SignatureAlgorithm::ES256, &key)
            .unwrap()
            .sign(b"data")
            .unwrap();
        signature[10] ^= 0x01;

        let validator = EcdsaValidator::new(SignatureAlgorithm::ES256, key.public_key()).unwrap();
        assert!(!validator.is_valid(b"data", &signature).unwrap());
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        let key = private_key(SignatureAlgorithm::ES384);
        let validator = EcdsaValidator::new(SignatureAlgorithm::ES384, key.public_key()).unwrap();
        assert!(matches!(
            validator.is_valid(b"data", &[1u8; 64]),
            Err(Error::Malformed(_))
        ));
    }
}
