pub mod base64;
pub mod base64url;
pub mod der;

pub use base64url::{decode, decode_bytes, encode, encode_bytes};
