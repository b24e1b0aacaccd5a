//! Round Errors
//!
//! Every failure of a round operation carries a stable [`ErrorKind`] so the
//! transport can map it without string matching. Messages never include a
//! server seed or peg map contents.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::SeedFormatError;
use crate::proof::commitment::CommitmentError;
use crate::round::state::{RoundId, RoundStatus};

/// Stable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input. Not retryable.
    Validation,
    /// Unknown round identifier.
    NotFound,
    /// Operation not allowed in the round's current state.
    Conflict,
    /// The environment failed (secure random source).
    Environment,
}

/// Round operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoundError {
    /// A required field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Seed text could not be used.
    #[error("invalid seed: {0}")]
    InvalidSeed(#[from] SeedFormatError),

    /// Commitment step failed.
    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// Drop column outside [0, 2 * rows].
    #[error("drop column {drop_column} is outside [0, {max}]")]
    DropColumnOutOfRange {
        /// Requested drop column.
        drop_column: u32,
        /// Largest allowed drop column.
        max: u32,
    },

    /// Row count outside the configured range.
    #[error("rows {rows} is outside [{min}, {max}]")]
    RowsOutOfRange {
        /// Requested row count.
        rows: u32,
        /// Smallest allowed row count.
        min: u32,
        /// Largest allowed row count.
        max: u32,
    },

    /// No round with this identifier.
    #[error("round {0} not found")]
    NotFound(RoundId),

    /// Nonce already bound to another round's seed.
    #[error("nonce {0:?} is already in use")]
    DuplicateNonce(String),

    /// Round is not in the status the operation requires.
    #[error("round {id} is {status}, expected {expected}")]
    InvalidTransition {
        /// Round identifier.
        id: RoundId,
        /// Current status.
        status: RoundStatus,
        /// Status the operation requires.
        expected: RoundStatus,
    },

    /// Round has no recorded outcome to compare against.
    #[error("round {0} was never started")]
    NotStarted(RoundId),
}

impl RoundError {
    /// Stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::InvalidSeed(_)
            | Self::DropColumnOutOfRange { .. }
            | Self::RowsOutOfRange { .. } => ErrorKind::Validation,
            Self::Commitment(CommitmentError::RandomSource(_)) => ErrorKind::Environment,
            Self::Commitment(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateNonce(_)
            | Self::InvalidTransition { .. }
            | Self::NotStarted(_) => ErrorKind::Conflict,
        }
    }
}
