//! Known JWT attack vectors: unsigned downgrades, algorithm confusion,
//! signature stripping and weak keys

use jwtkit::*;

fn hmac_token(secret: &[u8], alg: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let header = format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#);
    let payload = r#"{"iss":"https://example.com","sub":"user123"}"#;

    let header_b64 = utils::base64url::encode(&header);
    let payload_b64 = utils::base64url::encode(payload);
    let signing_input = format!("{}.{}", header_b64, payload_b64);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(signing_input.as_bytes());
    let signature_b64 = utils::base64url::encode_bytes(&mac.finalize().into_bytes());

    format!("{}.{}", signing_input, signature_b64)
}

fn secret_parser(secret: &[u8]) -> JwtParser {
    Jwts::parser_builder()
        .set_signing_key_bytes(secret.to_vec())
        .build()
        .unwrap()
}

// ============================================================================
// "none" Algorithm Attack
// ============================================================================

#[test]
fn none_algorithm_with_signature_is_malformed() {
    for alg in ["none", "None", "NONE"] {
        let header = utils::base64url::encode(&format!(r#"{{"alg":"{alg}"}}"#));
        let payload = utils::base64url::encode(r#"{"sub":"admin"}"#);
        let token = format!("{header}.{payload}.c2lnbmF0dXJl");

        let result = secret_parser(&[1u8; 32]).parse(&token);
        assert!(matches!(result, Err(Error::Malformed(_))), "alg {alg}");
    }
}

#[test]
fn missing_algorithm_with_signature_is_malformed() {
    let header = utils::base64url::encode(r#"{"typ":"JWT"}"#);
    let payload = utils::base64url::encode(r#"{"sub":"admin"}"#);
    let token = format!("{header}.{payload}.c2lnbmF0dXJl");
    assert!(matches!(
        secret_parser(&[1u8; 32]).parse(&token),
        Err(Error::Malformed(_))
    ));
}

#[test]
fn unknown_algorithm_is_malformed() {
    let token = hmac_token(&[1u8; 32], "HS999");
    assert!(matches!(
        secret_parser(&[1u8; 32]).parse(&token),
        Err(Error::Malformed(_))
    ));
}

// ============================================================================
// Signature stripping
// ============================================================================

#[test]
fn stripped_signature_is_not_a_jws() {
    let secret = [7u8; 32];
    let token = hmac_token(&secret, "HS256");
    let (unsigned, _) = token.rsplit_once('.').unwrap();
    let stripped = format!("{unsigned}.");

    let parser = secret_parser(&secret);
    assert!(matches!(
        parser.parse_claims_jws(&stripped),
        Err(Error::Unsupported(_))
    ));
}

// ============================================================================
// Algorithm confusion (RS256 public key used as an HMAC secret)
// ============================================================================

#[test]
fn hmac_token_against_rsa_public_key_is_unsupported() {
    use rsa::pkcs1::EncodeRsaPublicKey;

    let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
    let public_der = private.to_public_key().to_pkcs1_der().unwrap();

    // attacker signs with the public key bytes as an HMAC secret
    let token = hmac_token(public_der.as_bytes(), "HS256");

    let parser = Jwts::parser_builder()
        .set_signing_key(Key::rsa_public_pkcs1(public_der.as_bytes()).unwrap())
        .build()
        .unwrap();

    match parser.parse(&token) {
        Err(Error::Unsupported(msg)) => {
            assert!(msg.contains("HS256"));
            assert!(msg.contains("should not be trusted"));
        }
        other => panic!("expected algorithm confusion to be refused, got {other:?}"),
    }
}

#[test]
fn key_bytes_cannot_verify_asymmetric_tokens() {
    let pair = Keys::ec_key_pair_for(SignatureAlgorithm::ES256).unwrap();
    let token = Jwts::builder()
        .set_subject("a")
        .sign_with(pair.private)
        .unwrap()
        .compact()
        .unwrap();

    assert!(matches!(
        secret_parser(&[1u8; 32]).parse(&token),
        Err(Error::IllegalArgument(_))
    ));
}

// ============================================================================
// Weak keys
// ============================================================================

#[test]
fn weak_hmac_key_cannot_be_created() {
    let err = Keys::hmac_sha_key_for(&[0u8; 16]).unwrap_err();
    assert!(err.is_weak_key());
    assert!(err.to_string().contains("128 bits"));
}

#[test]
fn weak_hmac_key_cannot_sign() {
    let result = Jwts::builder().sign_with_secret_bytes(SignatureAlgorithm::HS256, &[0u8; 16]);
    assert!(matches!(result, Err(Error::WeakKey(_))));
}

#[test]
fn weak_hmac_key_is_tolerated_when_verifying() {
    let secret = b"short-secret";
    let token = hmac_token(secret, "HS256");

    let jws = secret_parser(secret).parse_claims_jws(&token).unwrap();
    assert_eq!(jws.body().subject(), Some("user123"));
}

#[test]
fn weak_rsa_public_key_is_tolerated_when_verifying() {
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::pkcs1v15::SigningKey;
    use rsa::pss::BlindedSigningKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer};
    use sha2::Sha256;

    let mut rng = rand::thread_rng();
    let private = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let public_der = private.to_public_key().to_pkcs1_der().unwrap();
    let parser = Jwts::parser_builder()
        .set_signing_key(Key::rsa_public_pkcs1(public_der.as_bytes()).unwrap())
        .build()
        .unwrap();

    let payload = utils::base64url::encode(r#"{"sub":"Joe"}"#);
    let signing_input = |alg: &str| {
        format!("{}.{payload}", utils::base64url::encode(&format!(r#"{{"alg":"{alg}"}}"#)))
    };

    let rs256 = signing_input("RS256");
    let signature = SigningKey::<Sha256>::new(private.clone()).sign(rs256.as_bytes());
    let token = format!("{rs256}.{}", utils::base64url::encode_bytes(&signature.to_vec()));
    let jws = parser.parse_claims_jws(&token).unwrap();
    assert_eq!(jws.body().subject(), Some("Joe"));

    let ps256 = signing_input("PS256");
    let signature = BlindedSigningKey::<Sha256>::new(private).sign_with_rng(&mut rng, ps256.as_bytes());
    let token = format!("{ps256}.{}", utils::base64url::encode_bytes(&signature.to_vec()));
    assert!(parser.parse_claims_jws(&token).is_ok());

    let forged = token.replacen(&payload, &utils::base64url::encode(r#"{"sub":"admin"}"#), 1);
    assert_eq!(parser.parse(&forged).unwrap_err(), Error::SignatureInvalid);
}

// ============================================================================
// Resource exhaustion
// ============================================================================

#[test]
fn oversized_token_is_rejected_before_splitting() {
    let token = "a".repeat(limits::MAX_TOKEN_LENGTH + 1);
    match secret_parser(&[1u8; 32]).parse(&token) {
        Err(Error::Malformed(msg)) => assert!(msg.contains("exceeds")),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn inflation_bomb_is_stopped_before_key_resolution() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    // a few KB on the wire, several MB once inflated
    let mut body = br#"{"sub":""#.to_vec();
    body.extend(std::iter::repeat(b' ').take(8 * 1024 * 1024));
    body.extend_from_slice(br#""}"#);
    let compressed = CompressionCodecs::DEFLATE.compress(&body).unwrap();

    let header = utils::base64url::encode(r#"{"alg":"HS256","zip":"DEF"}"#);
    let token = format!(
        "{header}.{}.c2lnbmF0dXJl",
        utils::base64url::encode_bytes(&compressed)
    );
    assert!(token.len() < limits::MAX_TOKEN_LENGTH);

    let resolved = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&resolved);
    let parser = Jwts::parser_builder()
        .set_signing_key_resolver(move |_: &Header, _: &Body| -> Result<Key> {
            seen.store(true, Ordering::SeqCst);
            Ok(Key::symmetric(vec![1u8; 32]))
        })
        .build()
        .unwrap();

    assert!(matches!(parser.parse(&token), Err(Error::Compression(_))));
    assert!(!resolved.load(Ordering::SeqCst));
}
