//! Fairness Proof
//!
//! Makes round outcomes checkable by anyone:
//! - Commitment to the server seed before the player chooses
//! - Seed combination with the player's seed
//! - Verification by deterministic replay
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF                                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs  - Seed generation, commit, seed combiner    │
//! │  verify.rs      - Recompute and compare a round             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod verify;

// Re-export key types
pub use commitment::{
    ServerSeed, RoundCommitment, CommitmentError,
    commit, compute_commit_hex, compute_combined_seed,
};
pub use verify::{
    verify, verify_round, VerifyInput, ExpectedOutcome, FieldMatches, VerificationReport,
};
