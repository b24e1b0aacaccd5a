//! Deterministic Random Number Generator
//!
//! Uses the Xorshift32 algorithm seeded from a round's combined seed.
//! Given the same seed, produces identical sequence on all platforms.
//!
//! The generator is a single ordered stream. Peg map generation draws
//! first, then path computation continues from the same state, so the
//! draw order is part of the fairness protocol.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Seed used in place of zero, which is a fixed point of xorshift.
pub const ZERO_SEED_SUBSTITUTE: u32 = 0xDEAD_BEEF;

/// 2^32 as f64, the divisor mapping a u32 draw onto [0, 1).
pub const U32_RANGE: f64 = 4_294_967_296.0;

/// Deterministic PRNG using the Xorshift32 algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG will produce the exact same sequence
/// of random numbers on any platform.
///
/// # Example
///
/// ```
/// use peg_drop::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(1);
/// assert_eq!(rng.next_u32(), 270369); // Always the same!
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u32,
    draws: u64,
}

impl DeterministicRng {
    /// Create a new RNG from a 32-bit seed.
    ///
    /// A zero seed is replaced by [`ZERO_SEED_SUBSTITUTE`].
    pub fn new(seed: u32) -> Self {
        Self {
            state: non_zero(seed),
            draws: 0,
        }
    }

    /// Create RNG from a hex-encoded seed (normally a combined seed digest).
    ///
    /// The first 4 decoded bytes are read as a big-endian u32. Shorter
    /// seeds are left-padded with zero bytes.
    pub fn from_hex_seed(hex_seed: &str) -> Result<Self, SeedFormatError> {
        if hex_seed.is_empty() {
            return Err(SeedFormatError::Empty);
        }
        let bytes = hex::decode(hex_seed)?;
        Ok(Self::new(seed_from_bytes(&bytes)))
    }

    /// Generate the next 32-bit random value (the post-step state).
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.draws += 1;
        x
    }

    /// Generate a float in [0, 1) as `next_u32() / 2^32`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / U32_RANGE
    }

    /// Number of values drawn since the generator was seeded.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Current generator state.
    pub fn state(&self) -> u32 {
        self.state
    }
}

#[inline]
fn non_zero(seed: u32) -> u32 {
    if seed == 0 {
        ZERO_SEED_SUBSTITUTE
    } else {
        seed
    }
}

/// Read the first 4 bytes of `bytes` as a big-endian u32.
///
/// Inputs shorter than 4 bytes are left-padded with zeros.
pub fn seed_from_bytes(bytes: &[u8]) -> u32 {
    let take = bytes.len().min(4);
    let mut buf = [0u8; 4];
    buf[4 - take..].copy_from_slice(&bytes[..take]);
    u32::from_be_bytes(buf)
}

/// Errors for malformed hex seeds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeedFormatError {
    /// Seed text is empty.
    #[error("seed must not be empty")]
    Empty,

    /// Seed text is not valid hex.
    #[error("seed must be hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        // Same seed must produce same sequence
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        assert_ne!(rng1.next_u32(), rng2.next_u32());
    }

    #[test]
    fn test_rng_known_values() {
        // These values must never change!
        // If they do, every published round becomes unverifiable.
        let mut rng = DeterministicRng::new(1);
        assert_eq!(rng.next_u32(), 270369);
        assert_eq!(rng.next_u32(), 67634689);
        assert_eq!(rng.next_u32(), 2647435461);

        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.next_u32(), 11355432);
        assert_eq!(rng.next_u32(), 2836018348);
        assert_eq!(rng.next_u32(), 476557059);
    }

    #[test]
    fn test_zero_seed_substituted() {
        let mut zero = DeterministicRng::new(0);
        assert_eq!(zero.state(), ZERO_SEED_SUBSTITUTE);
        assert_eq!(zero.next_u32(), 1199382711);
        assert_eq!(zero.next_u32(), 2384302402);
        assert_eq!(zero.next_u32(), 3129746520);

        let mut substitute = DeterministicRng::new(ZERO_SEED_SUBSTITUTE);
        let mut zero = DeterministicRng::new(0);
        for _ in 0..100 {
            let value = zero.next_u32();
            assert_ne!(value, 0);
            assert_eq!(value, substitute.next_u32());
        }
    }

    #[test]
    fn test_from_hex_seed() {
        let combined = "c2a139a655c31e0c65339b4c4bdd5b99b4c3de568d6b5a42e5f80bb5f13380df";
        let mut rng = DeterministicRng::from_hex_seed(combined).unwrap();
        assert_eq!(rng.state(), 0xc2a1_39a6);
        assert_eq!(rng.next_u32(), 1462036204);
        assert_eq!(rng.next_u32(), 3034145040);

        // Uppercase hex decodes to the same bytes
        let upper = DeterministicRng::from_hex_seed(&combined.to_uppercase()).unwrap();
        assert_eq!(upper.state(), 0xc2a1_39a6);
    }

    #[test]
    fn test_hex_seed_errors() {
        assert_eq!(DeterministicRng::from_hex_seed(""), Err(SeedFormatError::Empty));
        assert!(matches!(
            DeterministicRng::from_hex_seed("not-hex!"),
            Err(SeedFormatError::InvalidHex(_))
        ));
        assert!(matches!(
            DeterministicRng::from_hex_seed("abc"),
            Err(SeedFormatError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_short_seed_left_padded() {
        assert_eq!(seed_from_bytes(&[0x01]), 1);
        assert_eq!(seed_from_bytes(&[0x01, 0x02]), 0x0102);
        assert_eq!(seed_from_bytes(&[0xde, 0xad, 0xbe, 0xef, 0xff]), 0xdead_beef);
        assert_eq!(seed_from_bytes(&[]), 0);

        let rng = DeterministicRng::from_hex_seed("00000000").unwrap();
        assert_eq!(rng.state(), ZERO_SEED_SUBSTITUTE);
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = DeterministicRng::new(9999);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }

        let mut rng = DeterministicRng::from_hex_seed("c2a139a6").unwrap();
        assert_eq!(rng.next_f64(), 0.34040683042258024);
        assert_eq!(rng.next_f64(), 3034145040.0 / U32_RANGE);
    }

    #[test]
    fn test_draw_counter() {
        let mut rng = DeterministicRng::new(1);
        assert_eq!(rng.draws(), 0);
        for _ in 0..77 {
            rng.next_u32();
        }
        rng.next_f64();
        assert_eq!(rng.draws(), 78);
    }
}
