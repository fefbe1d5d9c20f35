use constant_time_eq::constant_time_eq;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::algorithm::{HashAlgorithm, SignatureAlgorithm, SignatureValidator, Signer};
use crate::error::{Error, Result};
use crate::keys::SymmetricKey;

/// HS256/HS384/HS512 signer
pub struct MacSigner {
    algorithm: SignatureAlgorithm,
    digest: HashAlgorithm,
    secret: Vec<u8>,
}

impl MacSigner {
    pub fn new(algorithm: SignatureAlgorithm, key: &SymmetricKey) -> Result<Self> {
        let digest = match (algorithm.is_hmac(), algorithm.digest()) {
            (true, Some(digest)) => digest,
            _ => {
                return Err(Error::IllegalArgument(format!(
                    "The {algorithm} algorithm is not an HMAC algorithm."
                )))
            }
        };
        Ok(Self {
            algorithm,
            digest,
            secret: key.as_bytes().to_vec(),
        })
    }
}

impl Signer for MacSigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.digest {
            HashAlgorithm::Sha256 => compute_mac::<Hmac<Sha256>>(&self.secret, data),
            HashAlgorithm::Sha384 => compute_mac::<Hmac<Sha384>>(&self.secret, data),
            HashAlgorithm::Sha512 => compute_mac::<Hmac<Sha512>>(&self.secret, data),
        }
    }
}

/// Recomputes the MAC and compares in constant time
pub struct MacValidator {
    signer: MacSigner,
}

impl MacValidator {
    pub fn new(algorithm: SignatureAlgorithm, key: &SymmetricKey) -> Result<Self> {
        Ok(Self {
            signer: MacSigner::new(algorithm, key)?,
        })
    }
}

impl SignatureValidator for MacValidator {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.signer.algorithm
    }

    fn is_valid(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        let expected = self.signer.sign(data)?;
        Ok(expected.len() == signature.len() && constant_time_eq(&expected, signature))
    }
}

fn compute_mac<M: Mac + KeyInit>(secret: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(secret)
        .map_err(|e| Error::Signing(format!("Unable to initialize HMAC: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
