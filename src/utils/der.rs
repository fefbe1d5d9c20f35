//! Minimal DER reading and writing
//!
//! Covers exactly what JWS needs: converting ECDSA signatures between the
//! ASN.1 `SEQUENCE { r INTEGER, s INTEGER }` form produced by crypto backends
//! and the fixed-width `R || S` form carried in tokens, plus reading the
//! modulus size out of RSA public keys.

use crate::error::{Error, Result};

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// rsaEncryption, 1.2.840.113549.1.1.1
const RSA_ENCRYPTION_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

fn der_len(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else {
        let mut tmp = Vec::new();
        let mut n = len;
        while n > 0 {
            tmp.push((n & 0xFF) as u8);
            n >>= 8;
        }
        tmp.reverse();
        let mut v = Vec::with_capacity(1 + tmp.len());
        v.push(0x80 | (tmp.len() as u8));
        v.extend_from_slice(&tmp);
        v
    }
}

fn der_integer(bytes: &[u8]) -> Vec<u8> {
    let mut value = strip_leading_zeros(bytes).to_vec();
    if value.is_empty() {
        value.push(0x00);
    }
    // Positive INTEGER: if MSB set, prepend 0x00
    if value[0] & 0x80 != 0 {
        value.insert(0, 0x00);
    }
    let mut out = Vec::with_capacity(2 + value.len());
    out.push(TAG_INTEGER);
    out.extend_from_slice(&der_len(value.len()));
    out.extend_from_slice(&value);
    out
}

fn der_sequence(children: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + children.len());
    out.push(TAG_SEQUENCE);
    out.extend_from_slice(&der_len(children.len()));
    out.extend_from_slice(children);
    out
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Read one tag-length-value element, returning `(tag, content, remainder)`
fn read_tlv(input: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = input.split_first()?;
    let (&first, rest) = rest.split_first()?;

    let (len, rest) = if first < 0x80 {
        (first as usize, rest)
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 || rest.len() < count {
            return None;
        }
        let len = rest[..count]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, &rest[count..])
    };

    if rest.len() < len {
        return None;
    }
    let (content, remainder) = rest.split_at(len);
    Some((tag, content, remainder))
}

fn expect_tlv(input: &[u8], tag: u8) -> Option<(&[u8], &[u8])> {
    match read_tlv(input)? {
        (t, content, rest) if t == tag => Some((content, rest)),
        _ => None,
    }
}

// ============================================================================
// ECDSA signature transcoding
// ============================================================================

/// Convert an ASN.1 DER ECDSA signature to the concatenated `R || S` form
///
/// `output_len` is the total width of the result (64 for P-256, 96 for P-384,
/// 132 for P-521). Each integer is left-padded with zeros to half that width.
pub fn der_to_concat(der: &[u8], output_len: usize) -> Result<Vec<u8>> {
    if output_len == 0 || output_len % 2 != 0 {
        return Err(Error::IllegalArgument(format!(
            "Invalid ECDSA signature output length: {output_len}"
        )));
    }
    let invalid = || Error::Malformed("Invalid ECDSA signature format".to_string());

    let (body, trailing) = expect_tlv(der, TAG_SEQUENCE).ok_or_else(invalid)?;
    if !trailing.is_empty() {
        return Err(invalid());
    }
    let (r, body) = expect_tlv(body, TAG_INTEGER).ok_or_else(invalid)?;
    let (s, body) = expect_tlv(body, TAG_INTEGER).ok_or_else(invalid)?;
    if !body.is_empty() {
        return Err(invalid());
    }

    let half = output_len / 2;
    let r = strip_leading_zeros(r);
    let s = strip_leading_zeros(s);
    if r.len() > half || s.len() > half {
        return Err(invalid());
    }

    let mut concat = vec![0u8; output_len];
    concat[half - r.len()..half].copy_from_slice(r);
    concat[output_len - s.len()..].copy_from_slice(s);
    Ok(concat)
}

/// Convert a concatenated `R || S` ECDSA signature to ASN.1 DER
///
/// A signature whose length differs from `expected_len` is rejected as
/// malformed before any conversion happens.
pub fn concat_to_der(concat: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if concat.len() != expected_len || concat.is_empty() {
        return Err(Error::Malformed(format!(
            "Invalid ECDSA signature length: expected {expected_len} bytes, found {}",
            concat.len()
        )));
    }

    let (r, s) = concat.split_at(concat.len() / 2);
    let mut body = der_integer(r);
    body.extend_from_slice(&der_integer(s));
    Ok(der_sequence(&body))
}

// ============================================================================
// RSA public key inspection
// ============================================================================

/// Bit length of the modulus of a PKCS#1 `RSAPublicKey`
pub fn rsa_modulus_bits(pkcs1: &[u8]) -> Result<u32> {
    let invalid = || Error::InvalidKey("RSA public key is not a valid PKCS#1 structure".to_string());

    let (body, _) = expect_tlv(pkcs1, TAG_SEQUENCE).ok_or_else(invalid)?;
    let (modulus, body) = expect_tlv(body, TAG_INTEGER).ok_or_else(invalid)?;
    // exponent must follow
    expect_tlv(body, TAG_INTEGER).ok_or_else(invalid)?;

    let modulus = strip_leading_zeros(modulus);
    let first = *modulus.first().ok_or_else(invalid)?;
    let bits = (modulus.len() as u32 - 1) * 8 + (8 - first.leading_zeros());
    Ok(bits)
}

/// Unwrap the PKCS#1 `RSAPublicKey` from an X.509 `SubjectPublicKeyInfo`
pub fn rsa_spki_to_pkcs1(spki: &[u8]) -> Result<&[u8]> {
    let invalid =
        || Error::InvalidKey("RSA public key is not a valid SubjectPublicKeyInfo".to_string());

    let (body, _) = expect_tlv(spki, TAG_SEQUENCE).ok_or_else(invalid)?;
    let (algorithm, body) = expect_tlv(body, TAG_SEQUENCE).ok_or_else(invalid)?;
    let (oid, _) = expect_tlv(algorithm, TAG_OID).ok_or_else(invalid)?;
    if oid != RSA_ENCRYPTION_OID {
        return Err(Error::InvalidKey(
            "SubjectPublicKeyInfo does not hold an RSA key".to_string(),
        ));
    }
    let (bits, _) = expect_tlv(body, TAG_BIT_STRING).ok_or_else(invalid)?;
    match bits.split_first() {
        Some((0, key)) => Ok(key),
        _ => Err(invalid()),
    }
}
