//! Core deterministic primitives.
//!
//! Everything a verifier needs to recompute a round bit for bit:
//! hashing, the seeded generator and the six-decimal number rule.

pub mod decimal;
pub mod rng;
pub mod hash;

// Re-export core types
pub use decimal::{Decimal6, Micros, format_micros, round6, to_micros, from_micros};
pub use rng::{DeterministicRng, SeedFormatError};
pub use hash::{DigestBytes, FieldHasher, sha256_hex, hash_fields_hex};
