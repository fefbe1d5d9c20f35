use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// JOSE header
///
/// An ordered JSON object. Registered parameters have typed accessors; any
/// other member is reachable through [`Header::get`] and [`Header::insert`].
/// Setting a registered parameter to an empty string removes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header {
    params: Map<String, Value>,
}

impl Header {
    pub const TYPE: &'static str = "typ";
    pub const CONTENT_TYPE: &'static str = "cty";
    pub const COMPRESSION_ALGORITHM: &'static str = "zip";
    pub const ALGORITHM: &'static str = "alg";
    pub const KEY_ID: &'static str = "kid";
    pub const JWK_SET_URL: &'static str = "jku";
    pub const JSON_WEB_KEY: &'static str = "jwk";
    pub const X509_URL: &'static str = "x5u";
    pub const X509_CERT_CHAIN: &'static str = "x5c";
    pub const X509_CERT_SHA1_THUMBPRINT: &'static str = "x5t";
    pub const X509_CERT_SHA256_THUMBPRINT: &'static str = "x5t#S256";
    pub const CRITICAL: &'static str = "crit";

    pub const JWT_TYPE: &'static str = "JWT";

    pub fn new() -> Self {
        Self::default()
    }

    /// Header with `typ` already set to `JWT`
    pub fn jwt() -> Self {
        let mut header = Self::new();
        header.set_type(Self::JWT_TYPE);
        header
    }

    // ============================================================================
    // Map access
    // ============================================================================

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// String value of a parameter, `None` when absent or not a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Insert a parameter. A `null` value removes it instead.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        match value.into() {
            Value::Null => self.params.remove(&name),
            value => self.params.insert(name, value),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.params.remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Merge every member of `params` into this header
    pub fn extend(&mut self, params: Map<String, Value>) {
        for (name, value) in params {
            self.insert(name, value);
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.params.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.params
    }

    fn set_text(&mut self, name: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.params.remove(name);
        } else {
            self.params.insert(name.to_string(), Value::from(value));
        }
        self
    }

    fn string_list(&self, name: &str) -> Result<Option<Vec<String>>> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|_| Error::RequiredType {
                    name: name.to_string(),
                    expected: "a list of strings".to_string(),
                }),
        }
    }

    fn set_string_list(&mut self, name: &str, values: Vec<String>) -> &mut Self {
        if values.is_empty() {
            self.params.remove(name);
        } else {
            self.params.insert(name.to_string(), Value::from(values));
        }
        self
    }

    // ============================================================================
    // Registered parameters
    // ============================================================================

    pub fn token_type(&self) -> Option<&str> {
        self.get_str(Self::TYPE)
    }

    pub fn set_type(&mut self, typ: &str) -> &mut Self {
        self.set_text(Self::TYPE, typ)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_str(Self::CONTENT_TYPE)
    }

    pub fn set_content_type(&mut self, cty: &str) -> &mut Self {
        self.set_text(Self::CONTENT_TYPE, cty)
    }

    /// Name of the codec the body was compressed with (`zip`)
    pub fn compression_algorithm(&self) -> Option<&str> {
        self.get_str(Self::COMPRESSION_ALGORITHM)
    }

    pub fn set_compression_algorithm(&mut self, zip: &str) -> &mut Self {
        self.set_text(Self::COMPRESSION_ALGORITHM, zip)
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.get_str(Self::ALGORITHM)
    }

    pub fn set_algorithm(&mut self, alg: &str) -> &mut Self {
        self.set_text(Self::ALGORITHM, alg)
    }

    pub fn key_id(&self) -> Option<&str> {
        self.get_str(Self::KEY_ID)
    }

    pub fn set_key_id(&mut self, kid: &str) -> &mut Self {
        self.set_text(Self::KEY_ID, kid)
    }

    pub fn jwk_set_url(&self) -> Option<&str> {
        self.get_str(Self::JWK_SET_URL)
    }

    pub fn set_jwk_set_url(&mut self, jku: &str) -> &mut Self {
        self.set_text(Self::JWK_SET_URL, jku)
    }

    /// Embedded public key (`jwk`), kept as raw JSON
    pub fn json_web_key(&self) -> Option<&Map<String, Value>> {
        self.params.get(Self::JSON_WEB_KEY).and_then(Value::as_object)
    }

    pub fn set_json_web_key(&mut self, jwk: Map<String, Value>) -> &mut Self {
        if jwk.is_empty() {
            self.params.remove(Self::JSON_WEB_KEY);
        } else {
            self.params
                .insert(Self::JSON_WEB_KEY.to_string(), Value::Object(jwk));
        }
        self
    }

    pub fn x509_url(&self) -> Option<&str> {
        self.get_str(Self::X509_URL)
    }

    pub fn set_x509_url(&mut self, x5u: &str) -> &mut Self {
        self.set_text(Self::X509_URL, x5u)
    }

    /// Base64 DER certificates (`x5c`)
    pub fn x509_cert_chain(&self) -> Result<Option<Vec<String>>> {
        self.string_list(Self::X509_CERT_CHAIN)
    }

    pub fn set_x509_cert_chain(&mut self, chain: Vec<String>) -> &mut Self {
        self.set_string_list(Self::X509_CERT_CHAIN, chain)
    }

    pub fn x509_cert_sha1_thumbprint(&self) -> Option<&str> {
        self.get_str(Self::X509_CERT_SHA1_THUMBPRINT)
    }

    pub fn set_x509_cert_sha1_thumbprint(&mut self, x5t: &str) -> &mut Self {
        self.set_text(Self::X509_CERT_SHA1_THUMBPRINT, x5t)
    }

    pub fn x509_cert_sha256_thumbprint(&self) -> Option<&str> {
        self.get_str(Self::X509_CERT_SHA256_THUMBPRINT)
    }

    pub fn set_x509_cert_sha256_thumbprint(&mut self, thumbprint: &str) -> &mut Self {
        self.set_text(Self::X509_CERT_SHA256_THUMBPRINT, thumbprint)
    }

    /// Extensions the recipient must understand (`crit`)
    pub fn critical(&self) -> Result<Option<Vec<String>>> {
        self.string_list(Self::CRITICAL)
    }

    pub fn set_critical(&mut self, names: Vec<String>) -> &mut Self {
        self.set_string_list(Self::CRITICAL, names)
    }
}

impl From<Map<String, Value>> for Header {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registered_parameters() {
        let mut header = Header::jwt();
        header
            .set_algorithm("HS256")
            .set_key_id("key-1")
            .set_compression_algorithm("DEF");

        assert_eq!(header.token_type(), Some("JWT"));
        assert_eq!(header.algorithm(), Some("HS256"));
        assert_eq!(header.key_id(), Some("key-1"));
        assert_eq!(header.compression_algorithm(), Some("DEF"));
        assert_eq!(header.len(), 4);
    }

    #[test]
    fn test_empty_value_removes_parameter() {
        let mut header = Header::new();
        header.set_key_id("abc");
        header.set_key_id("");
        assert!(!header.contains_key(Header::KEY_ID));

        header.insert("custom", "x");
        header.insert("custom", Value::Null);
        assert!(header.is_empty());
    }

    #[test]
    fn test_insertion_order_survives_serialization() {
        let mut header = Header::new();
        header.set_type("JWT").set_algorithm("ES256");
        header.insert("b", 1);

        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, r#"{"typ":"JWT","alg":"ES256","b":1}"#);
    }

    #[test]
    fn test_string_list_parameters() {
        let mut header = Header::new();
        header.set_critical(vec!["exp".to_string()]);
        assert_eq!(header.critical().unwrap(), Some(vec!["exp".to_string()]));

        header.insert(Header::X509_CERT_CHAIN, json!([1, 2]));
        assert!(matches!(
            header.x509_cert_chain(),
            Err(Error::RequiredType { .. })
        ));
    }
}
