mod header;
mod jwt;

pub use header::Header;
pub use jwt::{Body, Jws, Jwt, Parsed};

pub(crate) use jwt::{
    SIGNED_CLAIMS_UNSUPPORTED, SIGNED_PLAINTEXT_UNSUPPORTED, UNSIGNED_CLAIMS_UNSUPPORTED,
    UNSIGNED_PLAINTEXT_UNSUPPORTED,
};
