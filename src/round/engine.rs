//! Round Lifecycle Engine
//!
//! Pure transitions over [`Round`] values:
//!
//! ```text
//! create_round  -> Created   (fresh secret, commitment published)
//! start_round   -> Started   (combined seed, peg map, path, payout)
//! reveal_round  -> Revealed  (secret disclosed, revealed_at set once)
//! ```
//!
//! No function here touches storage or the clock on its own; callers pass
//! the current round and the current time, and persist what comes back.
//! The check-and-set against concurrent starts lives in the store.

use chrono::{DateTime, Utc};
use rand::{CryptoRng, RngCore};
use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::proof::commitment::{compute_combined_seed, RoundCommitment, ServerSeed};
use crate::round::error::RoundError;
use crate::round::path::{center, compute_path, payout_multiplier, PathOutcome};
use crate::round::pegmap::generate_peg_map;
use crate::round::state::{Round, RoundOutcome, RoundStatus};

// =============================================================================
// CONFIG
// =============================================================================

/// Smallest board the engine accepts.
pub const MIN_ROWS: u32 = 1;

/// Largest `max_rows` a deployment may configure.
pub const ROWS_CEILING: u32 = 64;

/// Board limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Rows used when a caller does not pick one.
    pub default_rows: u32,
    /// Largest board accepted.
    pub max_rows: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            default_rows: crate::DEFAULT_ROWS,
            max_rows: 32,
        }
    }
}

impl RoundConfig {
    /// Check the limits themselves. `max_rows` must lie in
    /// `[MIN_ROWS, ROWS_CEILING]` and the default must fit under it.
    pub fn validate(&self) -> Result<(), RoundError> {
        if self.max_rows < MIN_ROWS || self.max_rows > ROWS_CEILING {
            return Err(RoundError::RowsOutOfRange {
                rows: self.max_rows,
                min: MIN_ROWS,
                max: ROWS_CEILING,
            });
        }
        self.resolve_rows(None).map(|_| ())
    }

    /// Resolve an optional row count against the configured range.
    pub fn resolve_rows(&self, rows: Option<u32>) -> Result<u32, RoundError> {
        let rows = rows.unwrap_or(self.default_rows);
        if rows < MIN_ROWS || rows > self.max_rows {
            return Err(RoundError::RowsOutOfRange {
                rows,
                min: MIN_ROWS,
                max: self.max_rows,
            });
        }
        Ok(rows)
    }
}

/// Resolve an optional drop column for a board. Defaults to the centre.
pub fn resolve_drop_column(drop_column: Option<u32>, rows: u32) -> Result<u32, RoundError> {
    let max = rows.saturating_mul(2);
    match drop_column {
        None => Ok(center(rows)),
        Some(drop_column) if drop_column <= max => Ok(drop_column),
        Some(drop_column) => Err(RoundError::DropColumnOutOfRange { drop_column, max }),
    }
}

// =============================================================================
// PLAY
// =============================================================================

/// Everything derived from one set of round inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundPlay {
    /// SHA256(server_seed:client_seed:nonce).
    pub combined_seed: String,
    /// Hash of the canonical peg map text.
    pub peg_map_hash: String,
    /// Path and final bin.
    pub path: PathOutcome,
    /// Generator draws consumed (peg map plus path).
    pub draws: u64,
}

/// Run the deterministic part of a round.
///
/// Start and verification both go through here so the two can never
/// drift apart. `drop_column` and `rows` must already be range checked.
pub fn play_round(
    server_seed: &str,
    client_seed: &str,
    nonce: &str,
    drop_column: u32,
    rows: u32,
) -> Result<RoundPlay, RoundError> {
    let combined_seed = compute_combined_seed(server_seed, client_seed, nonce);
    let mut rng = DeterministicRng::from_hex_seed(&combined_seed)?;

    // Peg map draws first, path draws continue from the same generator.
    let (peg_map, peg_map_hash) = generate_peg_map(&mut rng, rows);
    let path = compute_path(&mut rng, &peg_map, drop_column);

    Ok(RoundPlay {
        combined_seed,
        peg_map_hash,
        path,
        draws: rng.draws(),
    })
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Player inputs for the start step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Player seed (empty when omitted).
    #[serde(default)]
    pub client_seed: String,
    /// Stake in cents.
    #[serde(default)]
    pub bet_cents: u64,
    /// Drop column; centre when omitted.
    #[serde(default)]
    pub drop_column: Option<u32>,
}

/// Create a round with a fresh secret from the OS CSPRNG.
pub fn create_round(nonce: &str, rows: u32, now: DateTime<Utc>) -> Result<Round, RoundError> {
    let server_seed = ServerSeed::generate()?;
    new_round(server_seed, nonce, rows, now)
}

/// Create a round with a secret drawn from `rng`.
pub fn create_round_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    nonce: &str,
    rows: u32,
    now: DateTime<Utc>,
) -> Result<Round, RoundError> {
    let server_seed = ServerSeed::generate_with(rng)?;
    new_round(server_seed, nonce, rows, now)
}

fn new_round(
    server_seed: ServerSeed,
    nonce: &str,
    rows: u32,
    now: DateTime<Utc>,
) -> Result<Round, RoundError> {
    if nonce.is_empty() {
        return Err(RoundError::MissingField("nonce"));
    }
    let commitment = RoundCommitment::new(&server_seed, nonce);
    Ok(Round::new(server_seed, commitment, rows, now))
}

/// Compute the outcome of a `Created` round.
///
/// Returns the `Started` round; the input is left untouched so a failed
/// start persists nothing.
pub fn start_round(round: &Round, request: StartRequest) -> Result<Round, RoundError> {
    if round.status != RoundStatus::Created {
        return Err(RoundError::InvalidTransition {
            id: round.id,
            status: round.status,
            expected: RoundStatus::Created,
        });
    }

    let drop_column = resolve_drop_column(request.drop_column, round.rows)?;
    let play = play_round(
        round.server_seed.as_hex(),
        &request.client_seed,
        &round.nonce,
        drop_column,
        round.rows,
    )?;

    let bin_index = play.path.bin_index;
    let mut started = round.clone();
    started.status = RoundStatus::Started;
    started.outcome = Some(RoundOutcome {
        client_seed: request.client_seed,
        combined_seed: play.combined_seed,
        peg_map_hash: play.peg_map_hash,
        drop_column,
        bet_cents: request.bet_cents,
        path: play.path.steps,
        bin_index,
        payout_multiplier: payout_multiplier(bin_index, round.rows),
    });
    Ok(started)
}

/// Disclose the secret.
///
/// Idempotent: a round that is already revealed comes back unchanged,
/// keeping its first `revealed_at`. A `Created` round may be revealed,
/// which abandons it since it can no longer be started.
pub fn reveal_round(round: &Round, now: DateTime<Utc>) -> Round {
    let mut revealed = round.clone();
    if revealed.status != RoundStatus::Revealed {
        revealed.status = RoundStatus::Revealed;
        revealed.revealed_at = Some(now);
    }
    revealed
}
