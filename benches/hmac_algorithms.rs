//! HMAC algorithm benchmarks (HS256, HS384, HS512)
//!
//! Signs with the builder and verifies with a shared parser to compare hash
//! function overhead across the three variants.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jwtkit::*;

const ALGORITHMS: [SignatureAlgorithm; 3] = [
    SignatureAlgorithm::HS256,
    SignatureAlgorithm::HS384,
    SignatureAlgorithm::HS512,
];

fn signed_token(key: &Key, alg: SignatureAlgorithm) -> String {
    Jwts::builder()
        .set_issuer("https://example.com")
        .set_subject("user123")
        .sign_with_algorithm(key.clone(), alg)
        .unwrap()
        .compact()
        .unwrap()
}

fn bench_hmac_signing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hmac_signing");

    for alg in ALGORITHMS {
        let key = Keys::secret_key_for(alg).unwrap();
        group.bench_function(alg.value(), |b| {
            b.iter(|| signed_token(black_box(&key), alg));
        });
    }

    group.finish();
}

fn bench_hmac_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("hmac_verification");

    for alg in ALGORITHMS {
        let key = Keys::secret_key_for(alg).unwrap();
        let token = signed_token(&key, alg);
        let parser = Jwts::parser_builder().set_signing_key(key).build().unwrap();

        group.bench_function(alg.value(), |b| {
            b.iter(|| parser.parse_claims_jws(black_box(&token)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hmac_signing, bench_hmac_verification);
criterion_main!(benches);
