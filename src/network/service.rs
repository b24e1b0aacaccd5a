//! Round Service
//!
//! The boundary operations (commit, start, reveal, get, list, verify) over a
//! shared [`RoundStore`]. Transport code calls these and only translates
//! messages; every rule lives in `round/` and `proof/`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, instrument, warn};

use crate::network::store::RoundStore;
use crate::proof::verify::{verify, verify_round, ExpectedOutcome, VerificationReport, VerifyInput};
use crate::round::engine::{create_round, reveal_round, start_round, RoundConfig, StartRequest};
use crate::round::error::RoundError;
use crate::round::path::PathStep;
use crate::round::state::{RoundId, RoundView};

/// Rounds returned by a list call when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Largest list a caller can ask for.
pub const MAX_LIST_LIMIT: usize = 100;

/// Clamp a requested list size. Zero or absent means the default.
pub fn clamp_list_limit(limit: Option<usize>) -> usize {
    limit
        .filter(|&l| l > 0)
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .min(MAX_LIST_LIMIT)
}

// =============================================================================
// NONCES
// =============================================================================

/// Strictly increasing default nonces based on wall-clock milliseconds.
///
/// Two commits in the same millisecond still get distinct nonces.
#[derive(Debug, Default)]
pub struct NonceSequence {
    last: AtomicU64,
}

impl NonceSequence {
    /// Create a new sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next nonce for the given time.
    pub fn next_at(&self, now: DateTime<Utc>) -> u64 {
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now_ms.max(previous + 1)
    }

    /// Next nonce for the current time.
    pub fn next(&self) -> u64 {
        self.next_at(Utc::now())
    }
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Commit result. Never includes the server seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// New round.
    pub round_id: RoundId,
    /// Published commitment.
    pub commit_hex: String,
    /// Nonce bound into the commitment.
    pub nonce: String,
    /// Board depth.
    pub rows: u32,
}

/// Start result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartReceipt {
    /// Started round.
    pub round_id: RoundId,
    /// Hash of the peg map.
    pub peg_map_hash: String,
    /// Board depth.
    pub rows: u32,
    /// Final bin.
    pub bin_index: u32,
    /// Decision records.
    pub path: Vec<PathStep>,
    /// Payout multiplier.
    pub payout_multiplier: f64,
}

/// Reveal result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealReceipt {
    /// Revealed round.
    pub round_id: RoundId,
    /// Disclosed server seed.
    pub server_seed: String,
    /// First disclosure time.
    pub revealed_at: DateTime<Utc>,
}

// =============================================================================
// SERVICE
// =============================================================================

/// Round operations over a shared store.
pub struct RoundService {
    store: RoundStore,
    nonces: NonceSequence,
    config: RoundConfig,
}

impl RoundService {
    /// Create a service with an empty store.
    pub fn new(config: RoundConfig) -> Self {
        Self {
            store: RoundStore::new(),
            nonces: NonceSequence::new(),
            config,
        }
    }

    /// Board limits in use.
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &RoundStore {
        &self.store
    }

    /// Generate a secret and publish its commitment.
    #[instrument(skip(self))]
    pub async fn commit(
        &self,
        nonce: Option<String>,
        rows: Option<u32>,
    ) -> Result<CommitReceipt, RoundError> {
        let rows = self.config.resolve_rows(rows)?;

        let receipt = match nonce {
            Some(nonce) => self.insert_new_round(&nonce, rows).await?,
            // Callers may already hold upcoming numeric nonces; keep advancing.
            None => loop {
                let nonce = self.nonces.next().to_string();
                match self.insert_new_round(&nonce, rows).await {
                    Err(RoundError::DuplicateNonce(taken)) => {
                        debug!(nonce = %taken, "Default nonce already bound, advancing");
                    }
                    result => break result?,
                }
            },
        };

        info!(round_id = %receipt.round_id, commit = %receipt.commit_hex, "Round committed");
        Ok(receipt)
    }

    async fn insert_new_round(&self, nonce: &str, rows: u32) -> Result<CommitReceipt, RoundError> {
        let round = create_round(nonce, rows, Utc::now())?;
        let receipt = CommitReceipt {
            round_id: round.id,
            commit_hex: round.commit_hex.clone(),
            nonce: round.nonce.clone(),
            rows,
        };
        self.store.insert(round).await?;
        Ok(receipt)
    }

    /// Compute and record the outcome of a created round.
    #[instrument(skip(self, request), fields(drop_column = ?request.drop_column))]
    pub async fn start(
        &self,
        round_id: RoundId,
        request: StartRequest,
    ) -> Result<StartReceipt, RoundError> {
        let round = self
            .store
            .update_with(&round_id, |current| start_round(current, request))
            .await
            .map_err(|e| {
                warn!(%round_id, error = %e, "Start rejected");
                e
            })?;

        let outcome = round.outcome.ok_or(RoundError::NotStarted(round_id))?;
        info!(%round_id, bin = outcome.bin_index, "Round started");

        Ok(StartReceipt {
            round_id,
            peg_map_hash: outcome.peg_map_hash,
            rows: round.rows,
            bin_index: outcome.bin_index,
            path: outcome.path,
            payout_multiplier: outcome.payout_multiplier,
        })
    }

    /// Disclose the server seed. Repeat calls return the first disclosure.
    #[instrument(skip(self))]
    pub async fn reveal(&self, round_id: RoundId) -> Result<RevealReceipt, RoundError> {
        let now = Utc::now();
        let round = self
            .store
            .update_with(&round_id, |current| Ok(reveal_round(current, now)))
            .await?;

        let revealed_at = round.revealed_at.unwrap_or(now);
        info!(%round_id, %revealed_at, "Round revealed");

        Ok(RevealReceipt {
            round_id,
            server_seed: round.server_seed.into_hex(),
            revealed_at,
        })
    }

    /// Public view of one round.
    pub async fn get(&self, round_id: RoundId) -> Result<RoundView, RoundError> {
        self.store
            .get(&round_id)
            .await
            .map(|round| round.to_view())
            .ok_or(RoundError::NotFound(round_id))
    }

    /// Public views of the most recent rounds.
    pub async fn list(&self, limit: Option<usize>) -> Vec<RoundView> {
        let limit = clamp_list_limit(limit);
        self.store
            .list_recent(limit)
            .await
            .iter()
            .map(|round| round.to_view())
            .collect()
    }

    /// Verify either a stored, revealed round or free-standing inputs.
    ///
    /// With a round id the stored inputs and published values are used and
    /// the given ones ignored. Otherwise `expected`, when present, fills in
    /// the per-field matches.
    pub async fn verify(
        &self,
        round_id: Option<RoundId>,
        input: VerifyInput,
        expected: Option<ExpectedOutcome>,
    ) -> Result<VerificationReport, RoundError> {
        let report = match round_id {
            Some(id) => {
                let round = self.store.get(&id).await.ok_or(RoundError::NotFound(id))?;
                verify_round(&round)?
            }
            None => verify(&input, expected.as_ref(), &self.config)?,
        };

        debug!(bin = report.bin_index, valid = report.is_valid(), "Verification complete");
        Ok(report)
    }
}

impl Default for RoundService {
    fn default() -> Self {
        Self::new(RoundConfig::default())
    }
}
