//! Temporal checks with clock skew and expected-claim assertions

use chrono::{DateTime, Duration, TimeZone, Utc};
use jwtkit::*;

fn key() -> Key {
    Key::symmetric(vec![0x44u8; 32])
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

const NOW: i64 = 1_700_000_000;

fn parser_at(seconds: i64) -> JwtParserBuilder {
    Jwts::parser_builder()
        .set_signing_key(key())
        .set_clock(FixedClock::new(at(seconds)))
}

fn sign(builder: JwtBuilder) -> String {
    builder.sign_with(key()).unwrap().compact().unwrap()
}

// ============================================================================
// Expiration
// ============================================================================

#[test]
fn expired_token_reports_violation() {
    let token = sign(Jwts::builder().set_subject("a").set_expiration(at(NOW - 10)));

    match parser_at(NOW).build().unwrap().parse(&token) {
        Err(Error::Expired(violation)) => {
            assert_eq!(violation.kind, TemporalClaim::Expiration);
            assert_eq!(violation.claim_time, at(NOW - 10));
            assert_eq!(violation.now, at(NOW));
            assert_eq!(violation.difference_millis, 10_000);
            assert_eq!(violation.claims.subject(), Some("a"));
            assert_eq!(violation.header.algorithm(), Some("HS256"));
        }
        other => panic!("expected expiry, got {other:?}"),
    }
}

#[test]
fn clock_skew_tolerates_recent_expiry() {
    let token = sign(Jwts::builder().set_expiration(at(NOW - 30)));

    let tolerant = parser_at(NOW).set_allowed_clock_skew_seconds(60).build().unwrap();
    assert!(tolerant.parse(&token).is_ok());

    let strict = parser_at(NOW).set_allowed_clock_skew_seconds(10).build().unwrap();
    let err = strict.parse(&token).unwrap_err();
    assert!(err.is_claim_error());
    assert!(err.to_string().contains("Allowed clock skew: 10000 milliseconds"));
}

#[test]
fn expiry_boundary_is_inclusive() {
    let token = sign(Jwts::builder().set_expiration(at(NOW)));
    assert!(parser_at(NOW).build().unwrap().parse(&token).is_ok());
    assert!(parser_at(NOW + 1).build().unwrap().parse(&token).is_err());
}

// ============================================================================
// Not before
// ============================================================================

#[test]
fn premature_token_is_rejected() {
    let token = sign(Jwts::builder().set_not_before(at(NOW + 120)));

    match parser_at(NOW).build().unwrap().parse(&token) {
        Err(Error::Premature(violation)) => {
            assert_eq!(violation.kind, TemporalClaim::NotBefore);
            assert_eq!(violation.difference_millis, 120_000);
        }
        other => panic!("expected premature token, got {other:?}"),
    }

    let tolerant = parser_at(NOW).set_allowed_clock_skew_seconds(180).build().unwrap();
    assert!(tolerant.parse(&token).is_ok());
}

#[test]
fn premature_token_accepted_once_clock_advances() {
    let token = sign(Jwts::builder().set_not_before(at(NOW + 10)));
    assert!(parser_at(NOW).build().unwrap().parse(&token).is_err());
    assert!(parser_at(NOW + 10).build().unwrap().parse(&token).is_ok());
}

#[test]
fn negative_skew_clamps_to_zero() {
    let token = sign(Jwts::builder().set_not_before(at(NOW)));
    let parser = parser_at(NOW).set_allowed_clock_skew_seconds(-30).build().unwrap();
    assert!(parser.parse(&token).is_ok());
}

#[test]
fn closure_clock() {
    let token = sign(Jwts::builder().set_expiration(at(NOW)));
    let parser = Jwts::parser_builder()
        .set_signing_key(key())
        .set_clock(|| at(NOW + 3600))
        .build()
        .unwrap();
    assert!(matches!(parser.parse(&token), Err(Error::Expired(_))));
}

// ============================================================================
// Expected claims
// ============================================================================

#[test]
fn expected_registered_claims_match() {
    let issued = at(NOW - 5) + Duration::milliseconds(750);
    let token = sign(
        Jwts::builder()
            .set_issuer("https://issuer")
            .set_subject("joe")
            .set_audience("api")
            .set_id("42")
            .set_issued_at(issued)
            .set_expiration(at(NOW + 60)),
    );

    let parser = parser_at(NOW)
        .require_issuer("https://issuer")
        .require_subject("joe")
        .require_audience("api")
        .require_id("42")
        .require_issued_at(at(NOW - 5))
        .require_expiration(at(NOW + 60))
        .build()
        .unwrap();
    assert!(parser.parse_claims_jws(&token).is_ok());

    // the token carries whole seconds, so the dropped 750ms no longer matches
    let strict = parser_at(NOW).require_issued_at(issued).build().unwrap();
    assert!(matches!(strict.parse(&token), Err(Error::InvalidClaim(_))));
}

#[test]
fn missing_expected_claim() {
    let token = sign(Jwts::builder().set_subject("joe"));
    let err = parser_at(NOW)
        .require_issuer("https://issuer")
        .build()
        .unwrap()
        .parse(&token)
        .unwrap_err();

    assert!(err.is_invalid_claim());
    match err {
        Error::InvalidClaim(claim) => {
            assert!(claim.is_missing());
            assert_eq!(claim.name(), "iss");
            assert_eq!(claim.claims().subject(), Some("joe"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn incorrect_expected_claim() {
    let token = sign(Jwts::builder().set_subject("joe"));
    let err = parser_at(NOW)
        .require_subject("bob")
        .build()
        .unwrap()
        .parse(&token)
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Expected sub claim to be: \"bob\", but was: \"joe\"."
    );
}

#[test]
fn custom_expected_claims() {
    let token = sign(
        Jwts::builder()
            .claim("count", 5)
            .claim("admin", true)
            .claim("roles", serde_json::json!(["a", "b"])),
    );

    let ok = parser_at(NOW)
        .require("count", 5)
        .require("admin", true)
        .require("roles", serde_json::json!(["a", "b"]))
        .build()
        .unwrap();
    assert!(ok.parse(&token).is_ok());

    let wrong = parser_at(NOW).require("count", 6).build().unwrap();
    assert!(matches!(wrong.parse(&token), Err(Error::InvalidClaim(_))));
}

#[test]
fn expected_date_against_non_date() {
    let token = sign(Jwts::builder().claim("exp_like", "soon"));
    let err = parser_at(NOW)
        .require_date("exp_like", at(NOW))
        .build()
        .unwrap()
        .parse(&token)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidClaim(ref c) if !c.is_missing()));
}

// ============================================================================
// Typed claim access
// ============================================================================

#[test]
fn typed_claim_lookup() {
    let token = sign(
        Jwts::builder()
            .claim("count", 5)
            .claim("name", "joe")
            .set_audience("api"),
    );

    let jws = parser_at(NOW).build().unwrap().parse_claims_jws(&token).unwrap();
    let claims = jws.body();

    assert_eq!(claims.get_as::<i64>("count").unwrap(), Some(5));
    assert_eq!(claims.get_as::<String>("name").unwrap().as_deref(), Some("joe"));
    assert_eq!(claims.get_as::<i64>("missing").unwrap(), None);
    assert!(matches!(
        claims.get_as::<i64>("name"),
        Err(Error::RequiredType { .. })
    ));
    assert_eq!(claims.audiences(), vec!["api"]);
}
