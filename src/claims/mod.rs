mod validator;

pub use validator::{ClaimsValidator, ExpectedClaim, ValidationConfig, MAX_CLOCK_SKEW_MILLIS};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// JWT claims set as defined in [RFC 7519 Section 4](https://datatracker.ietf.org/doc/html/rfc7519#section-4)
///
/// An ordered JSON object. The seven registered claims have typed accessors;
/// dates are exposed as [`DateTime<Utc>`] and stored as whole seconds since the
/// epoch, which is how they travel on the wire. Custom claims are plain JSON
/// values.
///
/// # Examples
///
/// ```
/// use jwtkit::Claims;
///
/// let mut claims = Claims::new();
/// claims.set_subject("Joe").set_issuer("https://issuer.example");
/// claims.insert("admin", true);
///
/// assert_eq!(claims.subject(), Some("Joe"));
/// assert_eq!(claims.get_as::<bool>("admin").unwrap(), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims {
    values: Map<String, Value>,
}

impl Claims {
    pub const ISSUER: &'static str = "iss";
    pub const SUBJECT: &'static str = "sub";
    pub const AUDIENCE: &'static str = "aud";
    pub const EXPIRATION: &'static str = "exp";
    pub const NOT_BEFORE: &'static str = "nbf";
    pub const ISSUED_AT: &'static str = "iat";
    pub const ID: &'static str = "jti";

    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Map access
    // ============================================================================

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Convert a claim to `T`
    ///
    /// Absent and `null` claims yield `Ok(None)`. A present value that does
    /// not convert yields [`Error::RequiredType`].
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|_| Error::RequiredType {
                    name: name.to_string(),
                    expected: std::any::type_name::<T>().to_string(),
                }),
        }
    }

    /// Read a claim as an instant
    ///
    /// Numbers are seconds since the epoch; strings may hold either a number
    /// of seconds or an RFC 3339 timestamp.
    pub fn get_date(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value_to_date(value).map(Some).ok_or_else(|| Error::RequiredType {
                name: name.to_string(),
                expected: "a date".to_string(),
            }),
        }
    }

    /// Insert a claim. A `null` value removes it instead.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        match value.into() {
            Value::Null => self.values.remove(&name),
            value => self.values.insert(name, value),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Merge every member of `values`; `null` members remove existing claims
    pub fn extend(&mut self, values: Map<String, Value>) {
        for (name, value) in values {
            self.insert(name, value);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.values.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    fn set_text(&mut self, name: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), Value::from(value));
        }
        self
    }

    fn set_instant(&mut self, name: &str, value: Option<DateTime<Utc>>) -> &mut Self {
        match value {
            Some(instant) => {
                self.values
                    .insert(name.to_string(), Value::from(instant.timestamp()));
            }
            None => {
                self.values.remove(name);
            }
        }
        self
    }

    // ============================================================================
    // Registered claims
    // ============================================================================

    pub fn issuer(&self) -> Option<&str> {
        self.get_str(Self::ISSUER)
    }

    pub fn set_issuer(&mut self, iss: &str) -> &mut Self {
        self.set_text(Self::ISSUER, iss)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str(Self::SUBJECT)
    }

    pub fn set_subject(&mut self, sub: &str) -> &mut Self {
        self.set_text(Self::SUBJECT, sub)
    }

    /// Single-valued audience
    pub fn audience(&self) -> Option<&str> {
        self.get_str(Self::AUDIENCE)
    }

    /// Every audience, whether `aud` is a string or an array of strings
    pub fn audiences(&self) -> Vec<&str> {
        match self.values.get(Self::AUDIENCE) {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_audience(&mut self, aud: &str) -> &mut Self {
        self.set_text(Self::AUDIENCE, aud)
    }

    /// Expiration (`exp`); `None` when absent or not a date
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.get_date(Self::EXPIRATION).ok().flatten()
    }

    pub fn set_expiration(&mut self, exp: impl Into<Option<DateTime<Utc>>>) -> &mut Self {
        self.set_instant(Self::EXPIRATION, exp.into())
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.get_date(Self::NOT_BEFORE).ok().flatten()
    }

    pub fn set_not_before(&mut self, nbf: impl Into<Option<DateTime<Utc>>>) -> &mut Self {
        self.set_instant(Self::NOT_BEFORE, nbf.into())
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.get_date(Self::ISSUED_AT).ok().flatten()
    }

    pub fn set_issued_at(&mut self, iat: impl Into<Option<DateTime<Utc>>>) -> &mut Self {
        self.set_instant(Self::ISSUED_AT, iat.into())
    }

    /// JWT ID (`jti`)
    pub fn id(&self) -> Option<&str> {
        self.get_str(Self::ID)
    }

    pub fn set_id(&mut self, jti: &str) -> &mut Self {
        self.set_text(Self::ID, jti)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl<'a> IntoIterator for &'a Claims {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Interpret a JSON value as an instant
pub(crate) fn value_to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            if let Some(seconds) = n.as_i64() {
                DateTime::from_timestamp(seconds, 0)
            } else {
                let seconds = n.as_f64()?;
                DateTime::from_timestamp_millis((seconds * 1000.0) as i64)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(seconds) => DateTime::from_timestamp(seconds, 0),
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            }
        }
        _ => None,
    }
}
