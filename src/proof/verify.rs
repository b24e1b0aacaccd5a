//! Verification API
//!
//! Recompute a round from its disclosed inputs and compare it with what
//! was published. Verification never reads or writes the round store; it
//! only replays [`play_round`] on the inputs it is given.

use serde::{Serialize, Deserialize};

use crate::proof::commitment::{compute_commit_hex, ServerSeed};
use crate::round::engine::{play_round, resolve_drop_column, RoundConfig};
use crate::round::error::RoundError;
use crate::round::path::PathStep;
use crate::round::state::{Round, RoundStatus};

/// Inputs a verifier supplies. Absent fields take the documented defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyInput {
    /// Disclosed server seed (required).
    #[serde(default)]
    pub server_seed: Option<String>,
    /// Player seed; empty when omitted.
    #[serde(default)]
    pub client_seed: Option<String>,
    /// Commitment nonce (required).
    #[serde(default)]
    pub nonce: Option<String>,
    /// Drop column; centre of the board when omitted.
    #[serde(default)]
    pub drop_column: Option<u32>,
    /// Board depth; configured default when omitted.
    #[serde(default)]
    pub rows: Option<u32>,
}

/// Published values to compare against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    /// Commitment published at commit time.
    pub commit_hex: String,
    /// Peg map hash published at start.
    pub peg_map_hash: String,
    /// Bin published at start.
    pub bin_index: u32,
}

/// Per-field comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatches {
    /// Recomputed commitment equals the published one.
    pub commit_hex: bool,
    /// Recomputed peg map hash equals the published one.
    pub peg_map_hash: bool,
    /// Recomputed bin equals the published one.
    pub bin_index: bool,
}

impl FieldMatches {
    /// Did every field match?
    pub fn all(&self) -> bool {
        self.commit_hex && self.peg_map_hash && self.bin_index
    }
}

/// Verification result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// SHA256(server_seed:nonce).
    pub commit_hex: String,
    /// SHA256(server_seed:client_seed:nonce).
    pub combined_seed: String,
    /// Hash of the recomputed peg map.
    pub peg_map_hash: String,
    /// Recomputed bin.
    pub bin_index: u32,
    /// Recomputed decision records.
    pub path: Vec<PathStep>,
    /// Comparison with published values, when any were given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<FieldMatches>,
}

impl VerificationReport {
    /// True when expected values were given and all matched.
    pub fn is_valid(&self) -> bool {
        self.matches.map(|m| m.all()).unwrap_or(false)
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, RoundError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RoundError::MissingField(field)),
    }
}

/// Recompute a round from disclosed inputs.
///
/// Pure and stateless. Errors only on malformed input: a missing or empty
/// seed or nonce, a seed that is not hex, or an out-of-range board.
pub fn verify(
    input: &VerifyInput,
    expected: Option<&ExpectedOutcome>,
    config: &RoundConfig,
) -> Result<VerificationReport, RoundError> {
    let server_seed = required(&input.server_seed, "server_seed")?;
    let nonce = required(&input.nonce, "nonce")?;
    ServerSeed::from_hex(server_seed)?;

    let client_seed = input.client_seed.as_deref().unwrap_or("");
    let rows = config.resolve_rows(input.rows)?;
    let drop_column = resolve_drop_column(input.drop_column, rows)?;

    let commit_hex = compute_commit_hex(server_seed, nonce);
    let play = play_round(server_seed, client_seed, nonce, drop_column, rows)?;

    let matches = expected.map(|e| FieldMatches {
        commit_hex: commit_hex == e.commit_hex,
        peg_map_hash: play.peg_map_hash == e.peg_map_hash,
        bin_index: play.path.bin_index == e.bin_index,
    });

    Ok(VerificationReport {
        commit_hex,
        combined_seed: play.combined_seed,
        peg_map_hash: play.peg_map_hash,
        bin_index: play.path.bin_index,
        path: play.path.steps,
        matches,
    })
}

/// Verify a stored round against its own published values.
///
/// Only revealed rounds can be checked this way; before disclosure the
/// report would expose the combined seed.
pub fn verify_round(round: &Round) -> Result<VerificationReport, RoundError> {
    if round.status != RoundStatus::Revealed {
        return Err(RoundError::InvalidTransition {
            id: round.id,
            status: round.status,
            expected: RoundStatus::Revealed,
        });
    }
    let outcome = round.outcome.as_ref().ok_or(RoundError::NotStarted(round.id))?;

    let input = VerifyInput {
        server_seed: Some(round.server_seed.as_hex().to_string()),
        client_seed: Some(outcome.client_seed.clone()),
        nonce: Some(round.nonce.clone()),
        drop_column: Some(outcome.drop_column),
        rows: Some(round.rows),
    };
    let expected = ExpectedOutcome {
        commit_hex: round.commit_hex.clone(),
        peg_map_hash: outcome.peg_map_hash.clone(),
        bin_index: outcome.bin_index,
    };

    // The stored round already passed range checks at start; widen the
    // limit so a later config change cannot make old rounds unverifiable.
    let config = RoundConfig {
        default_rows: round.rows,
        max_rows: round.rows.max(RoundConfig::default().max_rows),
    };
    verify(&input, Some(&expected), &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::core::rng::U32_RANGE;
    use crate::proof::commitment::RoundCommitment;
    use crate::round::engine::{reveal_round, start_round, StartRequest};
    use crate::round::path::Direction;

    fn zero_input(rows: u32, drop_column: u32) -> VerifyInput {
        VerifyInput {
            server_seed: Some("00".repeat(32)),
            client_seed: Some(String::new()),
            nonce: Some("1".into()),
            drop_column: Some(drop_column),
            rows: Some(rows),
        }
    }

    #[test]
    fn test_zero_seed_fixture() {
        let report = verify(&zero_input(1, 0), None, &RoundConfig::default()).unwrap();

        assert_eq!(report.commit_hex, "0014ab94578f46aac267ddc24503efc56ad0d5941c006f8ca0ef7e5a63c8f17f");
        assert_eq!(report.combined_seed, "c2a139a655c31e0c65339b4c4bdd5b99b4c3de568d6b5a42e5f80bb5f13380df");
        assert_eq!(report.peg_map_hash, "f50eb81e6d8b35ca3b79f7e7d387a294451a29f005833ba0c8ae40086eacf993");
        assert_eq!(report.bin_index, 1);
        assert_eq!(report.path.len(), 1);
        assert_eq!(report.path[0].draw, 3034145040.0 / U32_RANGE);
        assert_eq!(report.path[0].decision, Direction::Right);
        assert!(report.matches.is_none());
        assert!(!report.is_valid());
    }

    #[test]
    fn test_defaults_match_twelve_row_center() {
        let input = VerifyInput {
            server_seed: Some("00".repeat(32)),
            nonce: Some("1".into()),
            ..VerifyInput::default()
        };
        let report = verify(&input, None, &RoundConfig::default()).unwrap();

        assert_eq!(report.peg_map_hash, "47c3ee29ae0654273bd03c2c3fe77df9719002039457d44763009974521d5171");
        assert_eq!(report.bin_index, 6);
        assert_eq!(report.path.len(), 12);
    }

    #[test]
    fn test_expected_comparison() {
        let expected = ExpectedOutcome {
            commit_hex: "0014ab94578f46aac267ddc24503efc56ad0d5941c006f8ca0ef7e5a63c8f17f".into(),
            peg_map_hash: "f50eb81e6d8b35ca3b79f7e7d387a294451a29f005833ba0c8ae40086eacf993".into(),
            bin_index: 1,
        };
        let report = verify(&zero_input(1, 0), Some(&expected), &RoundConfig::default()).unwrap();
        assert!(report.is_valid());

        let tampered = ExpectedOutcome { bin_index: 0, ..expected };
        let report = verify(&zero_input(1, 0), Some(&tampered), &RoundConfig::default()).unwrap();
        let matches = report.matches.unwrap();
        assert!(matches.commit_hex);
        assert!(matches.peg_map_hash);
        assert!(!matches.bin_index);
        assert!(!matches.all());
    }

    #[test]
    fn test_input_validation() {
        let config = RoundConfig::default();

        let missing_seed = VerifyInput { server_seed: None, ..zero_input(12, 6) };
        assert_eq!(verify(&missing_seed, None, &config).unwrap_err(), RoundError::MissingField("server_seed"));

        let empty_nonce = VerifyInput { nonce: Some(String::new()), ..zero_input(12, 6) };
        assert_eq!(verify(&empty_nonce, None, &config).unwrap_err(), RoundError::MissingField("nonce"));

        let bad_hex = VerifyInput { server_seed: Some("not-hex".into()), ..zero_input(12, 6) };
        assert!(matches!(verify(&bad_hex, None, &config), Err(RoundError::Commitment(_))));

        let bad_drop = zero_input(12, 25);
        assert!(matches!(
            verify(&bad_drop, None, &config),
            Err(RoundError::DropColumnOutOfRange { .. })
        ));

        let bad_rows = zero_input(0, 0);
        assert!(matches!(verify(&bad_rows, None, &config), Err(RoundError::RowsOutOfRange { .. })));
    }

    #[test]
    fn test_verify_round_requires_reveal() {
        let seed = ServerSeed::from_hex(&"ab".repeat(32)).unwrap();
        let commitment = RoundCommitment::new(&seed, "5");
        let created = Round::new(seed, commitment, 12, Utc::now());

        let request = StartRequest {
            client_seed: "player".into(),
            bet_cents: 100,
            drop_column: Some(9),
        };
        let started = start_round(&created, request).unwrap();
        assert!(matches!(verify_round(&started), Err(RoundError::InvalidTransition { .. })));

        let revealed = reveal_round(&started, Utc::now());
        let report = verify_round(&revealed).unwrap();
        assert!(report.is_valid());

        let outcome = revealed.outcome.as_ref().unwrap();
        assert_eq!(report.path, outcome.path);
        assert_eq!(report.combined_seed, outcome.combined_seed);
    }

    #[test]
    fn test_verify_round_never_started() {
        let seed = ServerSeed::from_hex(&"cd".repeat(32)).unwrap();
        let commitment = RoundCommitment::new(&seed, "6");
        let abandoned = reveal_round(&Round::new(seed, commitment, 12, Utc::now()), Utc::now());

        assert_eq!(verify_round(&abandoned).unwrap_err(), RoundError::NotStarted(abandoned.id));
    }
}
