//! Token service backed by a key file

use std::fs;

use jwtkit::*;

fn claims_for(sub: &str) -> Claims {
    let mut claims = Jwts::claims();
    claims.set_subject(sub).insert("scope", "read write");
    claims
}

#[test]
fn from_config_creates_and_reuses_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = TokenProviderConfig::new(dir.path().join("jws-key.json"));

    let first = JwtTokenProvider::from_config(&config).unwrap();
    assert!(config.key_path.exists());
    let token = first.generate_token_from_claims(claims_for("alice")).unwrap();

    // a second provider over the same file accepts the first one's tokens
    let second = JwtTokenProvider::from_config(&config).unwrap();
    assert_eq!(first.key_id(), second.key_id());
    assert!(second.validate_token(&token).unwrap());
    assert_eq!(
        second.get_subject_from_token(&token).unwrap().as_deref(),
        Some("alice")
    );
}

#[test]
fn key_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jws-key.json");
    let store = KeyStore::load_or_generate(&path).unwrap();

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(record["algorithm"], "HS512");
    assert_eq!(record["key_id"], store.key_id());
    assert_eq!(record["key_id"], Keys::create_key_id(store.key()).as_str());
    assert!(record["secret"].as_str().is_some_and(|s| s.ends_with("==")));
}

#[test]
fn custom_expiration() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        TokenProviderConfig::new(dir.path().join("key.json")).expiration_millis(60_000);
    let provider = JwtTokenProvider::from_config(&config).unwrap();
    assert_eq!(provider.expiry_duration(), 60_000);

    let token = provider.generate_token_from_claims(claims_for("bob")).unwrap();
    let claims = provider.get_claims_from_token(&token).unwrap();
    let lifetime = claims.expiration().unwrap() - claims.issued_at().unwrap();
    assert_eq!(lifetime.num_seconds(), 60);
    assert_eq!(claims.get_str("scope"), Some("read write"));
}

#[test]
fn tokens_get_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let provider =
        JwtTokenProvider::from_config(&TokenProviderConfig::new(dir.path().join("k.json")))
            .unwrap();

    let a = provider.generate_token_from_claims(claims_for("x")).unwrap();
    let b = provider.generate_token_from_claims(claims_for("x")).unwrap();
    let id_a = provider.get_claims_from_token(&a).unwrap().id().map(str::to_string);
    let id_b = provider.get_claims_from_token(&b).unwrap().id().map(str::to_string);
    assert!(id_a.is_some());
    assert_ne!(id_a, id_b);
}

#[test]
fn validate_token_maps_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let provider =
        JwtTokenProvider::from_config(&TokenProviderConfig::new(dir.path().join("k.json")))
            .unwrap();

    let unsigned = Jwts::builder().set_subject("x").compact().unwrap();
    assert_eq!(
        provider.validate_token(&unsigned).unwrap_err(),
        Error::InvalidToken {
            kind: "JWT".into(),
            reason: "Unsupported JWT token".into()
        }
    );

    let expired = provider
        .generate_token_from_claims_with_expiration(claims_for("x"), -1_000)
        .unwrap();
    assert_eq!(
        provider.validate_token(&expired).unwrap_err().to_string(),
        "Invalid JWT token: Token expired. Refresh required"
    );

    assert!(matches!(
        provider.validate_token("a.b"),
        Err(Error::InvalidToken { reason, .. }) if reason == "Malformed jwt token"
    ));
}
