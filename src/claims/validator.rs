use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::claims::Claims;
use crate::error::{Error, InvalidClaim, Result, TemporalClaim, TemporalViolation};
use crate::token::Header;

/// Largest accepted clock skew, so that `skew * 1000` never overflows
pub const MAX_CLOCK_SKEW_MILLIS: i64 = i64::MAX / 1000;

/// A value a claim must have for the token to be accepted
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedClaim {
    /// Compared structurally; integer and float numbers compare by value
    Value(Value),
    /// Compared at millisecond precision against the claim read as a date
    Date(DateTime<Utc>),
}

impl ExpectedClaim {
    fn to_value(&self) -> Value {
        match self {
            ExpectedClaim::Value(v) => v.clone(),
            ExpectedClaim::Date(d) => Value::from(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<Value> for ExpectedClaim {
    fn from(value: Value) -> Self {
        ExpectedClaim::Value(value)
    }
}

impl From<DateTime<Utc>> for ExpectedClaim {
    fn from(value: DateTime<Utc>) -> Self {
        ExpectedClaim::Date(value)
    }
}

/// Configuration for claims validation
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    /// Tolerance applied to `exp` and `nbf`, in milliseconds
    pub allowed_clock_skew_millis: i64,

    /// Claims that must be present with a given value, checked in order
    pub expected: Vec<(String, ExpectedClaim)>,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set clock skew tolerance in seconds
    ///
    /// Values above [`MAX_CLOCK_SKEW_MILLIS`] are rejected; negative values clamp to zero.
    pub fn clock_skew(mut self, seconds: i64) -> Result<Self> {
        if seconds > MAX_CLOCK_SKEW_MILLIS {
            return Err(Error::IllegalArgument(format!(
                "Illegal allowed clock skew value: {seconds}. Must be less than or equal to {MAX_CLOCK_SKEW_MILLIS} seconds."
            )));
        }
        self.allowed_clock_skew_millis = seconds.max(0) * 1000;
        Ok(self)
    }

    /// Require `name` to equal `value`. Requiring the same claim twice keeps the last value.
    pub fn require(mut self, name: impl Into<String>, value: impl Into<ExpectedClaim>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.expected.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.expected.push((name, value)),
        }
        self
    }
}

/// Claims validator
pub struct ClaimsValidator;

impl ClaimsValidator {
    /// Validate temporal claims, then expected claims, against `now`
    pub fn validate(
        header: &Header,
        claims: &Claims,
        now: DateTime<Utc>,
        config: &ValidationConfig,
    ) -> Result<()> {
        Self::validate_temporal(header, claims, now, config)?;
        Self::validate_expected(header, claims, config)
    }

    fn validate_temporal(
        header: &Header,
        claims: &Claims,
        now: DateTime<Utc>,
        config: &ValidationConfig,
    ) -> Result<()> {
        let skew = config.allowed_clock_skew_millis;
        let now_millis = now.timestamp_millis();

        // exp is accepted up to and including now - skew
        if let Some(exp) = claims.get_date(Claims::EXPIRATION)? {
            let max = now_millis.saturating_sub(skew);
            let exp_millis = exp.timestamp_millis();
            if max > exp_millis {
                return Err(Error::Expired(Box::new(TemporalViolation {
                    kind: TemporalClaim::Expiration,
                    header: header.clone(),
                    claims: claims.clone(),
                    claim_time: exp,
                    now,
                    difference_millis: max.saturating_sub(exp_millis),
                    allowed_clock_skew_millis: skew,
                })));
            }
        }

        if let Some(nbf) = claims.get_date(Claims::NOT_BEFORE)? {
            let min = now_millis.saturating_add(skew);
            let nbf_millis = nbf.timestamp_millis();
            if min < nbf_millis {
                return Err(Error::Premature(Box::new(TemporalViolation {
                    kind: TemporalClaim::NotBefore,
                    header: header.clone(),
                    claims: claims.clone(),
                    claim_time: nbf,
                    now,
                    difference_millis: nbf_millis.saturating_sub(min),
                    allowed_clock_skew_millis: skew,
                })));
            }
        }

        Ok(())
    }

    fn validate_expected(header: &Header, claims: &Claims, config: &ValidationConfig) -> Result<()> {
        for (name, expected) in &config.expected {
            let actual = match claims.get(name) {
                None | Some(Value::Null) => {
                    return Err(Error::InvalidClaim(Box::new(InvalidClaim::Missing {
                        header: header.clone(),
                        claims: claims.clone(),
                        name: name.clone(),
                        expected: expected.to_value(),
                    })));
                }
                Some(actual) => actual,
            };

            let incorrect = |message: Option<String>| {
                Error::InvalidClaim(Box::new(InvalidClaim::Incorrect {
                    header: header.clone(),
                    claims: claims.clone(),
                    name: name.clone(),
                    expected: expected.to_value(),
                    actual: actual.clone(),
                    message,
                }))
            };

            match expected {
                ExpectedClaim::Date(date) => {
                    let actual_date = claims.get_date(name).map_err(|_| {
                        incorrect(Some(format!(
                            "JWT Claim '{name}' was expected to be a Date, but its value cannot be converted to a Date using current heuristics.  Value: {actual}"
                        )))
                    })?;
                    if actual_date.map(|d| d.timestamp_millis()) != Some(date.timestamp_millis()) {
                        return Err(incorrect(None));
                    }
                }
                ExpectedClaim::Value(value) => {
                    if !values_match(value, actual) {
                        return Err(incorrect(None));
                    }
                }
            }
        }
        Ok(())
    }
}

fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                a.as_f64() == b.as_f64()
            }
        }
        _ => expected == actual,
    }
}
