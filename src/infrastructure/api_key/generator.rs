//! API key generation
//!
//! Generates cryptographically random key tokens and the digests under
//! which they are stored. The token is pure OS randomness; nothing about
//! the requester ever feeds into it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// How many leading token characters are kept for display in listings
const DISPLAY_PREFIX_CHARS: usize = 8;

/// Result of generating a new key token
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    /// The full token (only ever shown once, at creation)
    pub token: String,
    /// Leading characters for identification in listings
    pub prefix: String,
    /// The digest stored in place of the token
    pub hash: String,
}

/// Generator for API key tokens
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    /// Prefix for all generated tokens (e.g. "qk_")
    prefix: String,
    /// Number of random bytes behind each token
    key_bytes: usize,
}

impl KeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key_bytes: 32,
        }
    }

    /// Set the number of random bytes
    pub fn with_key_bytes(mut self, bytes: usize) -> Self {
        self.key_bytes = bytes;
        self
    }

    /// Generate a new key token
    pub fn generate(&self) -> GeneratedKey {
        let mut random_bytes = vec![0u8; self.key_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let token = format!("{}{}", self.prefix, hex::encode(&random_bytes));
        let prefix_len = (self.prefix.len() + DISPLAY_PREFIX_CHARS).min(token.len());
        let prefix = token[..prefix_len].to_string();
        let hash = Self::hash_token(&token);

        GeneratedKey {
            token,
            prefix,
            hash,
        }
    }

    /// Digest a token for storage and lookup
    ///
    /// Deterministic, so an exact match on the digest is an exact match on
    /// the token.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        format!("sha256${}", URL_SAFE_NO_PAD.encode(result))
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new("qk_")
    }
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut result = 0u8;

    for i in 0..a.len() {
        result |= a_bytes[i] ^ b_bytes[i];
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let generated = KeyGenerator::default().generate();

        assert!(generated.token.starts_with("qk_"));
        // 32 random bytes hex-encoded, plus the prefix
        assert_eq!(generated.token.len(), "qk_".len() + 64);
        assert!(generated.hash.starts_with("sha256$"));
        assert_eq!(generated.prefix.len(), "qk_".len() + 8);
        assert!(generated.token.starts_with(&generated.prefix));
    }

    #[test]
    fn test_token_uniqueness() {
        let generator = KeyGenerator::default();
        let one = generator.generate();
        let two = generator.generate();

        assert_ne!(one.token, two.token);
        assert_ne!(one.hash, two.hash);
    }

    #[test]
    fn test_hash_deterministic() {
        let token = "qk_0123456789abcdef";

        assert_eq!(KeyGenerator::hash_token(token), KeyGenerator::hash_token(token));
        assert_ne!(
            KeyGenerator::hash_token(token),
            KeyGenerator::hash_token("qk_fedcba9876543210")
        );
    }

    #[test]
    fn test_custom_key_bytes() {
        let generated = KeyGenerator::new("qk_").with_key_bytes(16).generate();

        assert_eq!(generated.token.len(), "qk_".len() + 32);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("", "x"));
        assert!(constant_time_compare("", ""));
    }
}
