//! Peg Map Generation
//!
//! Builds the triangular table of left-bias values for a board and the hash
//! that pins it. Row `r` holds `r + 1` pegs. Each peg consumes exactly one
//! generator draw, row by row and left to right, so a board of `rows` rows
//! consumes `rows * (rows + 1) / 2` draws before any path decision.
//!
//! ```text
//! bias = round6(0.5 + (draw - 0.5) * 0.2)        // in [0.4, 0.6]
//! text = [[b00],[b10,b11],[b20,b21,b22],...]     // no whitespace
//! hash = SHA256(text)
//! ```

use crate::core::decimal::{Micros, format_micros, from_micros, to_micros};
use crate::core::hash::sha256_hex;
use crate::core::rng::DeterministicRng;

/// Bias every peg is centred on.
pub const BIAS_CENTER: f64 = 0.5;

/// Width of the bias band around the centre.
pub const BIAS_SPREAD: f64 = 0.2;

/// Triangular table of peg biases in micro-units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PegMap {
    rows: Vec<Vec<Micros>>,
}

impl PegMap {
    /// Generate a peg map by drawing one value per peg from `rng`.
    pub fn generate(rng: &mut DeterministicRng, rows: u32) -> Self {
        let rows = (0..rows as usize)
            .map(|r| (0..=r).map(|_| peg_bias(rng.next_f64())).collect())
            .collect();
        Self { rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of pegs.
    pub fn peg_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[Vec<Micros>] {
        &self.rows
    }

    /// Bias of one peg in micro-units.
    pub fn bias_micros(&self, row: usize, peg: usize) -> Option<Micros> {
        self.rows.get(row).and_then(|r| r.get(peg)).copied()
    }

    /// Bias of one peg as a float.
    pub fn bias(&self, row: usize, peg: usize) -> Option<f64> {
        self.bias_micros(row, peg).map(from_micros)
    }

    /// Canonical text of the table.
    pub fn canonical_text(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(|&m| format_micros(m)).collect();
                format!("[{}]", values.join(","))
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    /// SHA256 of the canonical text, lowercase hex.
    pub fn hash_hex(&self) -> String {
        sha256_hex(self.canonical_text().as_bytes())
    }
}

/// Map a draw in [0, 1) to a peg bias in micro-units.
#[inline]
pub fn peg_bias(draw: f64) -> Micros {
    to_micros(BIAS_CENTER + (draw - BIAS_CENTER) * BIAS_SPREAD)
}

/// Generate a peg map and its hash in one step.
pub fn generate_peg_map(rng: &mut DeterministicRng, rows: u32) -> (PegMap, String) {
    let peg_map = PegMap::generate(rng, rows);
    let hash = peg_map.hash_hex();
    (peg_map, hash)
}

// =============================================================================
// TESTS
// =============================================================================
