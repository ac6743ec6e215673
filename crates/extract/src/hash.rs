use crate::error::Result;
use crate::tokenizer::tokenize;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

/// Hex characters kept from the content digest
pub const CONTENT_HASH_LEN: usize = 12;

const TOKEN_SEPARATOR: &str = "\u{1f}";

/// Short printable hash of raw file content; the registry key of a file
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let mut hex = hex_encode_lower(&hasher.finalize());
    hex.truncate(CONTENT_HASH_LEN);
    hex
}

fn hex_encode_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Fast non-cryptographic hash of a token sequence
#[must_use]
pub fn fingerprint(tokens: &[String]) -> String {
    let joined = tokens.join(TOKEN_SEPARATOR);
    format!("{:016x}", xxh64(joined.as_bytes(), 0))
}

/// Tokenize then fingerprint a code fragment
pub fn fingerprint_code(code: &str) -> Result<String> {
    Ok(fingerprint(&tokenize(code)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_short_and_stable() {
        let a = content_hash(b"test('x', () => {})");
        let b = content_hash(b"test('x', () => {})");
        assert_eq!(a, b);
        assert_eq!(a.len(), CONTENT_HASH_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, content_hash(b"test('y', () => {})"));
    }

    #[test]
    fn content_hash_matches_sha256_prefix() {
        // sha256("") = e3b0c442 98fc1c14 ...
        assert_eq!(content_hash(b""), "e3b0c44298fc");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let tokens: Vec<String> = vec!["(".into(), ")".into(), "=>".into(), "1".into()];
        assert_eq!(fingerprint(&tokens), fingerprint(&tokens.clone()));
        assert_eq!(fingerprint(&tokens).len(), 16);
    }

    #[test]
    fn fingerprint_separates_tokens() {
        let joined: Vec<String> = vec!["ab".into()];
        let split: Vec<String> = vec!["a".into(), "b".into()];
        assert_ne!(fingerprint(&joined), fingerprint(&split));
    }

    #[test]
    fn formatting_variants_share_a_fingerprint() {
        let a = fingerprint_code("() => console.log('Hi!')").unwrap();
        let b = fingerprint_code("() =>\n  console.log(\"Hi!\");").unwrap();
        assert_eq!(a, b);
    }
}
