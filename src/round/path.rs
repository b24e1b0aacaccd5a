//! Path Computation
//!
//! Walks the ball down the board. At each row it looks up the peg under the
//! ball, shifts its bias by the drop-column adjustment and takes one draw
//! from the generator (continuing after the peg map draws): left if the
//! draw is below the adjusted bias, right otherwise. The number of right
//! moves is the final bin.

use serde::{Serialize, Deserialize};

use crate::core::decimal::{from_micros, round6};
use crate::core::rng::DeterministicRng;
use crate::round::pegmap::PegMap;

/// Bias shift per column of distance from the centre column.
pub const ADJUSTMENT_PER_COLUMN: f64 = 0.01;

/// Payout multiplier increase per bin of distance from the centre bin.
pub const PAYOUT_STEP: f64 = 0.25;

/// Direction taken at a peg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Ball went left; bin position unchanged.
    #[serde(rename = "L")]
    Left,
    /// Ball went right; bin position advances.
    #[serde(rename = "R")]
    Right,
}

/// One row's decision record.
///
/// Every field is disclosed so a verifier can check each intermediate
/// value, not only the final bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// Row index (0-based).
    pub row: u32,
    /// Peg the ball hit in this row.
    pub peg_index: u32,
    /// Peg bias from the peg map.
    pub base_bias: f64,
    /// Drop-column adjustment (6 decimals).
    pub adjustment: f64,
    /// Adjusted, clamped bias (6 decimals).
    pub bias_prime: f64,
    /// Generator draw in [0, 1).
    pub draw: f64,
    /// Direction taken.
    pub decision: Direction,
}

/// Full path result.
#[derive(Clone, Debug, PartialEq)]
pub struct PathOutcome {
    /// One record per row.
    pub steps: Vec<PathStep>,
    /// Final bin in [0, rows].
    pub bin_index: u32,
}

impl PathOutcome {
    /// Decisions as a compact `L`/`R` string.
    pub fn decisions(&self) -> String {
        self.steps
            .iter()
            .map(|s| match s.decision {
                Direction::Left => 'L',
                Direction::Right => 'R',
            })
            .collect()
    }
}

/// Centre column / centre bin for a board.
#[inline]
pub fn center(rows: u32) -> u32 {
    rows / 2
}

/// Bias adjustment for a drop column: `(drop_column - rows/2) * 0.01`.
#[inline]
pub fn drop_adjustment(drop_column: u32, rows: u32) -> f64 {
    (drop_column as i64 - center(rows) as i64) as f64 * ADJUSTMENT_PER_COLUMN
}

/// Compute the path through `peg_map` for `drop_column`.
///
/// The board depth is the peg map's row count. `rng` must be the same
/// generator that produced the peg map, positioned right after it.
pub fn compute_path(rng: &mut DeterministicRng, peg_map: &PegMap, drop_column: u32) -> PathOutcome {
    let rows = peg_map.row_count() as u32;
    let adjustment = drop_adjustment(drop_column, rows);

    let mut pos: usize = 0;
    let mut steps = Vec::with_capacity(peg_map.row_count());

    for (r, row) in peg_map.rows().iter().enumerate() {
        let peg_index = pos.min(r);
        // Row r holds r + 1 pegs and peg_index <= r.
        let base_bias = from_micros(row[peg_index]);
        let bias_prime = (base_bias + adjustment).clamp(0.0, 1.0);

        let draw = rng.next_f64();
        let decision = if draw < bias_prime {
            Direction::Left
        } else {
            pos += 1;
            Direction::Right
        };

        steps.push(PathStep {
            row: r as u32,
            peg_index: peg_index as u32,
            base_bias,
            adjustment: round6(adjustment),
            bias_prime: round6(bias_prime),
            draw,
            decision,
        });
    }

    PathOutcome {
        steps,
        bin_index: pos as u32,
    }
}

/// Payout multiplier: `1 + |bin_index - rows/2| * 0.25`.
pub fn payout_multiplier(bin_index: u32, rows: u32) -> f64 {
    let distance = (bin_index as i64 - center(rows) as i64).unsigned_abs();
    1.0 + distance as f64 * PAYOUT_STEP
}

// =============================================================================
// TESTS
// =============================================================================
