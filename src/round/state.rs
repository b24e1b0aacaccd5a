//! Round State Definitions
//!
//! A round is a plain value. Engine functions take a round and return the
//! next version of it; the store decides where it lives.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::proof::commitment::{RoundCommitment, ServerSeed};
use crate::round::path::PathStep;

// =============================================================================
// ROUND ID
// =============================================================================

/// Unique round identifier (UUID v4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub Uuid);

impl RoundId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ROUND STATUS
// =============================================================================

/// Lifecycle status. Moves forward only: Created -> Started -> Revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Committed, waiting for the player.
    Created,
    /// Outcome computed and recorded.
    Started,
    /// Server seed disclosed (terminal).
    Revealed,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Revealed => "revealed",
        };
        f.write_str(name)
    }
}

// =============================================================================
// ROUND
// =============================================================================

/// Outcome recorded by the start step. Written once, never recomputed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Player-supplied seed (may be empty).
    pub client_seed: String,

    /// SHA256(server_seed:client_seed:nonce).
    pub combined_seed: String,

    /// Hash of the canonical peg map text.
    pub peg_map_hash: String,

    /// Player's drop column in [0, 2 * rows].
    pub drop_column: u32,

    /// Stake in cents.
    pub bet_cents: u64,

    /// One decision record per row.
    pub path: Vec<PathStep>,

    /// Final bin in [0, rows].
    pub bin_index: u32,

    /// Payout multiplier for the bin.
    pub payout_multiplier: f64,
}

/// A single provably-fair round.
///
/// Deliberately not `Serialize`: use [`Round::to_view`] for anything that
/// leaves the process, which hides the seed until the round is revealed.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    /// Round identifier.
    pub id: RoundId,

    /// Lifecycle status.
    pub status: RoundStatus,

    /// Nonce bound into the commitment.
    pub nonce: String,

    /// Published commitment hash.
    pub commit_hex: String,

    /// Secret server seed.
    pub server_seed: ServerSeed,

    /// Board depth.
    pub rows: u32,

    /// Creation time (list ordering).
    pub created_at: DateTime<Utc>,

    /// Start outcome, once started.
    pub outcome: Option<RoundOutcome>,

    /// Disclosure time, set on first reveal.
    pub revealed_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Create a round in `Created` status from a fresh commitment.
    pub fn new(
        server_seed: ServerSeed,
        commitment: RoundCommitment,
        rows: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RoundId::new(),
            status: RoundStatus::Created,
            nonce: commitment.nonce,
            commit_hex: commitment.commit_hex,
            server_seed,
            rows,
            created_at,
            outcome: None,
            revealed_at: None,
        }
    }

    /// Has the seed been disclosed?
    pub fn is_revealed(&self) -> bool {
        self.status == RoundStatus::Revealed
    }

    /// Server seed, only once revealed.
    pub fn disclosed_seed(&self) -> Option<&ServerSeed> {
        if self.is_revealed() {
            Some(&self.server_seed)
        } else {
            None
        }
    }

    /// Public view of the round.
    pub fn to_view(&self) -> RoundView {
        let outcome = self.outcome.as_ref();
        RoundView {
            id: self.id,
            status: self.status,
            nonce: self.nonce.clone(),
            commit_hex: self.commit_hex.clone(),
            server_seed: self.disclosed_seed().map(|s| s.as_hex().to_string()),
            rows: self.rows,
            created_at: self.created_at,
            client_seed: outcome.map(|o| o.client_seed.clone()),
            combined_seed: outcome
                .filter(|_| self.is_revealed())
                .map(|o| o.combined_seed.clone()),
            peg_map_hash: outcome.map(|o| o.peg_map_hash.clone()),
            drop_column: outcome.map(|o| o.drop_column),
            bet_cents: outcome.map(|o| o.bet_cents),
            bin_index: outcome.map(|o| o.bin_index),
            payout_multiplier: outcome.map(|o| o.payout_multiplier),
            path: outcome.map(|o| o.path.clone()),
            revealed_at: self.revealed_at,
        }
    }
}

/// Externally visible round record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    /// Round identifier.
    pub id: RoundId,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// Commitment nonce.
    pub nonce: String,
    /// Commitment hash.
    pub commit_hex: String,
    /// Server seed (revealed rounds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_seed: Option<String>,
    /// Board depth.
    pub rows: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Client seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_seed: Option<String>,
    /// Combined seed (revealed rounds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_seed: Option<String>,
    /// Peg map hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peg_map_hash: Option<String>,
    /// Drop column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_column: Option<u32>,
    /// Stake in cents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_cents: Option<u64>,
    /// Final bin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_index: Option<u32>,
    /// Payout multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_multiplier: Option<f64>,
    /// Decision records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathStep>>,
    /// Disclosure time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_at: Option<DateTime<Utc>>,
}
