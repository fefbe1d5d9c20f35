use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::algorithm::SignatureAlgorithm;
use crate::error::{Error, Result};
use crate::keys::{Key, Keys};
use crate::utils::base64;

/// On-disk layout of a persisted signing secret
#[derive(Clone, Serialize, Deserialize)]
struct KeyRecord {
    secret: String,
    algorithm: String,
    key_id: String,
}

/// A symmetric signing key persisted as a small JSON file
///
/// ```json
/// { "secret": "<standard base64>", "algorithm": "HS512", "key_id": "<base64url sha-256>" }
/// ```
#[derive(Clone)]
pub struct KeyStore {
    key: Key,
    algorithm: SignatureAlgorithm,
    key_id: String,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .field("key", &"[hidden]")
            .finish()
    }
}

impl KeyStore {
    /// Algorithm used for freshly generated keys
    pub const DEFAULT_ALGORITHM: SignatureAlgorithm = SignatureAlgorithm::HS512;

    /// Generate a random secret sized for `algorithm`
    pub fn generate(algorithm: SignatureAlgorithm) -> Result<Self> {
        let key = Keys::secret_key_for(algorithm)?;
        let key_id = Keys::create_key_id(&key);
        Ok(Self {
            key,
            algorithm,
            key_id,
        })
    }

    /// Read a previously saved key
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let record: KeyRecord = serde_json::from_str(&contents)
            .map_err(|e| Error::Serialization(format!("Unable to read key file: {e}")))?;

        let algorithm = SignatureAlgorithm::for_name(&record.algorithm)?;
        let secret = base64::decode_bytes(&record.secret)?;
        Ok(Self {
            key: Key::symmetric(secret),
            algorithm,
            key_id: record.key_id,
        })
    }

    /// Load the key at `path`, or generate and save an HS512 key when the
    /// file is missing or empty
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let empty = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if !empty {
            let store = Self::load(path)?;
            info!(path = %path.display(), key_id = %store.key_id, "loaded signing key");
            return Ok(store);
        }

        let store = Self::generate(Self::DEFAULT_ALGORITHM)?;
        store.save(path)?;
        info!(path = %path.display(), key_id = %store.key_id, "generated signing key");
        Ok(store)
    }

    /// Write the key as pretty-printed JSON, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let record = KeyRecord {
            secret: base64::encode_bytes(self.key.as_symmetric()?.as_bytes()),
            algorithm: self.algorithm.value().to_string(),
            key_id: self.key_id.clone(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}
