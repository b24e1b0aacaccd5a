//! Round Commitment Protocol
//!
//! Commit to a server seed before the player picks anything.
//! Reveal it after the round and let anyone check the binding.
//!
//! ```text
//! commit_hex    = SHA256(server_seed ":" nonce)
//! combined_seed = SHA256(server_seed ":" client_seed ":" nonce)
//! ```
//!
//! All fields are hashed as their UTF-8 text. The server seed enters the
//! hash as its hex text, not as decoded bytes.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::hash_fields_hex;

/// Server seed length in bytes (64 hex characters).
pub const SERVER_SEED_BYTES: usize = 32;

/// Secret server seed, kept as hex text.
///
/// `Debug` never prints the value so a round can be logged safely
/// before disclosure.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed(String);

impl ServerSeed {
    /// Generate a fresh seed from the operating system CSPRNG.
    pub fn generate() -> Result<Self, CommitmentError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a fresh seed from the given cryptographic RNG.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, CommitmentError> {
        let mut bytes = [0u8; SERVER_SEED_BYTES];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| CommitmentError::RandomSource(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Accept a disclosed seed. Must be non-empty hex text.
    ///
    /// The text is kept verbatim (no case folding) because the
    /// commitment hashes the text itself.
    pub fn from_hex(hex_seed: &str) -> Result<Self, CommitmentError> {
        if hex_seed.is_empty() {
            return Err(CommitmentError::EmptySeed);
        }
        hex::decode(hex_seed)?;
        Ok(Self(hex_seed.to_string()))
    }

    /// Hex text of the seed.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Consume and return the hex text.
    pub fn into_hex(self) -> String {
        self.0
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSeed(<redacted>)")
    }
}

/// Published commitment for a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCommitment {
    /// Commitment hash (published before the player's choice).
    pub commit_hex: String,

    /// Nonce bound into the commitment.
    pub nonce: String,
}

impl RoundCommitment {
    /// Create commitment from a seed and nonce.
    pub fn new(server_seed: &ServerSeed, nonce: &str) -> Self {
        Self {
            commit_hex: compute_commit_hex(server_seed.as_hex(), nonce),
            nonce: nonce.to_string(),
        }
    }

    /// Verify that a disclosed seed matches this commitment.
    pub fn verify(&self, server_seed: &ServerSeed) -> bool {
        compute_commit_hex(server_seed.as_hex(), &self.nonce) == self.commit_hex
    }
}

/// Generate a server seed and commit to it under `nonce`.
pub fn commit(nonce: &str) -> Result<(ServerSeed, RoundCommitment), CommitmentError> {
    let server_seed = ServerSeed::generate()?;
    let commitment = RoundCommitment::new(&server_seed, nonce);
    Ok((server_seed, commitment))
}

/// `SHA256(server_seed ":" nonce)` as lowercase hex.
pub fn compute_commit_hex(server_seed: &str, nonce: &str) -> String {
    hash_fields_hex(&[server_seed, nonce])
}

/// `SHA256(server_seed ":" client_seed ":" nonce)` as lowercase hex.
pub fn compute_combined_seed(server_seed: &str, client_seed: &str, nonce: &str) -> String {
    hash_fields_hex(&[server_seed, client_seed, nonce])
}

/// Errors from seed generation and seed parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitmentError {
    /// The secure random source failed.
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),

    /// Disclosed seed is empty.
    #[error("server seed must not be empty")]
    EmptySeed,

    /// Disclosed seed is not hex.
    #[error("server seed must be hex: {0}")]
    InvalidSeedHex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ZERO_SEED: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    #[test]
    fn test_commit_known_vector() {
        assert_eq!(
            compute_commit_hex(ZERO_SEED, "1"),
            "0014ab94578f46aac267ddc24503efc56ad0d5941c006f8ca0ef7e5a63c8f17f"
        );
    }

    #[test]
    fn test_combined_seed_known_vector() {
        assert_eq!(
            compute_combined_seed(ZERO_SEED, "", "1"),
            "c2a139a655c31e0c65339b4c4bdd5b99b4c3de568d6b5a42e5f80bb5f13380df"
        );
    }

    #[test]
    fn test_commitment_determinism() {
        let seed = ServerSeed::from_hex(ZERO_SEED).unwrap();

        let commitment1 = RoundCommitment::new(&seed, "1");
        let commitment2 = RoundCommitment::new(&seed, "1");

        assert_eq!(commitment1, commitment2);
        assert!(commitment1.verify(&seed));
    }

    #[test]
    fn test_wrong_seed_fails() {
        let seed = ServerSeed::from_hex(ZERO_SEED).unwrap();
        let commitment = RoundCommitment::new(&seed, "1");

        let wrong = ServerSeed::from_hex(&"11".repeat(SERVER_SEED_BYTES)).unwrap();
        assert!(!commitment.verify(&wrong));
    }

    #[test]
    fn test_generated_seed_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let seed = ServerSeed::generate_with(&mut rng).unwrap();

        assert_eq!(seed.as_hex().len(), SERVER_SEED_BYTES * 2);
        assert!(seed.as_hex().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let other = ServerSeed::generate_with(&mut rng).unwrap();
        assert_ne!(seed, other);
    }

    #[test]
    fn test_commit_binds_fresh_seed() {
        let (seed, commitment) = commit("42").unwrap();
        assert_eq!(commitment.nonce, "42");
        assert_eq!(commitment.commit_hex, compute_commit_hex(seed.as_hex(), "42"));
        assert!(commitment.verify(&seed));
    }

    #[test]
    fn test_seed_debug_is_redacted() {
        let seed = ServerSeed::from_hex(ZERO_SEED).unwrap();
        let printed = format!("{:?}", seed);
        assert!(!printed.contains(ZERO_SEED));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_from_hex_validation() {
        assert_eq!(ServerSeed::from_hex(""), Err(CommitmentError::EmptySeed));
        assert!(matches!(
            ServerSeed::from_hex("zz"),
            Err(CommitmentError::InvalidSeedHex(_))
        ));
        // Case is preserved because the commitment hashes the text.
        let upper = ServerSeed::from_hex("ABCD").unwrap();
        assert_eq!(upper.as_hex(), "ABCD");
    }
}
