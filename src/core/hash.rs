//! Digest Utility
//!
//! SHA-256 hashing for commitments, combined seeds and peg map hashes.
//! Every digest that crosses the protocol boundary is rendered as
//! lowercase hex so any implementation can compare it byte for byte.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type DigestBytes = [u8; 32];

/// Separator placed between fields of a colon-joined preimage.
pub const FIELD_SEPARATOR: &[u8] = b":";

/// Incremental hasher for colon-joined text preimages.
///
/// `FieldHasher::new().field("a").field("b").finalize_hex()` hashes the
/// exact bytes `a:b`. Separators are not escaped, so a field containing a
/// colon can collide with a different split of the same bytes. That is part
/// of the protocol and must not change.
pub struct FieldHasher {
    hasher: Sha256,
    fields: usize,
}

impl FieldHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            fields: 0,
        }
    }

    /// Append a text field, preceded by a separator unless it is the first.
    pub fn field(mut self, value: &str) -> Self {
        if self.fields > 0 {
            self.hasher.update(FIELD_SEPARATOR);
        }
        self.hasher.update(value.as_bytes());
        self.fields += 1;
        self
    }

    /// Finalize and return the raw hash.
    pub fn finalize(self) -> DigestBytes {
        self.hasher.finalize().into()
    }

    /// Finalize and return the hash as lowercase hex.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.finalize())
    }
}

impl Default for FieldHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a simple hash of arbitrary data.
pub fn hash_bytes(data: &[u8]) -> DigestBytes {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of `data`, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(hash_bytes(data))
}

/// SHA-256 of the UTF-8 bytes of `fields` joined with `:`, lowercase hex.
pub fn hash_fields_hex(fields: &[&str]) -> String {
    fields
        .iter()
        .fold(FieldHasher::new(), |hasher, field| hasher.field(field))
        .finalize_hex()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        // FIPS 180-2 vectors
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_is_lowercase() {
        let digest = sha256_hex(b"peg drop");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_fields_match_joined_text() {
        let joined = sha256_hex(b"seed:player:7");
        assert_eq!(hash_fields_hex(&["seed", "player", "7"]), joined);
    }

    #[test]
    fn test_empty_field_keeps_separator() {
        // An empty middle field still contributes its separator: "a::b"
        assert_eq!(hash_fields_hex(&["a", "", "b"]), sha256_hex(b"a::b"));
        assert_ne!(hash_fields_hex(&["a", "", "b"]), hash_fields_hex(&["a", "b"]));
    }

    #[test]
    fn test_unescaped_separator_collides() {
        // Known limitation: different splits of the same bytes hash the same.
        assert_eq!(hash_fields_hex(&["a:b", "c"]), hash_fields_hex(&["a", "b:c"]));
    }

    #[test]
    fn test_field_order_matters() {
        assert_ne!(hash_fields_hex(&["1", "2"]), hash_fields_hex(&["2", "1"]));
    }
}
