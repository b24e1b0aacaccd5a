//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is one JSON object tagged by `"type"`.

use serde::{Serialize, Deserialize};

use crate::network::service::{CommitReceipt, RevealReceipt, StartReceipt};
use crate::proof::verify::{ExpectedOutcome, VerificationReport, VerifyInput};
use crate::round::engine::StartRequest;
use crate::round::error::{ErrorKind, RoundError};
use crate::round::state::{RoundId, RoundView};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a round: the server commits to a fresh seed.
    Commit {
        /// Nonce to bind; the server picks one when absent.
        #[serde(default)]
        nonce: Option<String>,
        /// Board depth; server default when absent.
        #[serde(default)]
        rows: Option<u32>,
    },

    /// Supply the player's choice and compute the outcome.
    Start(StartRoundRequest),

    /// Disclose the server seed.
    Reveal {
        /// Round to reveal.
        round_id: RoundId,
    },

    /// Fetch one round.
    GetRound {
        /// Round to fetch.
        round_id: RoundId,
    },

    /// Fetch the most recent rounds.
    ListRounds {
        /// Maximum number of rounds (default 20, capped at 100).
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Recompute a round.
    Verify(VerifyRequest),

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        #[serde(default)]
        timestamp: u64,
    },
}

/// Start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRoundRequest {
    /// Round to start.
    pub round_id: RoundId,
    /// Player seed.
    #[serde(default)]
    pub client_seed: String,
    /// Stake in cents.
    #[serde(default)]
    pub bet_cents: u64,
    /// Drop column.
    #[serde(default)]
    pub drop_column: Option<u32>,
}

impl StartRoundRequest {
    /// Split into the target round and the engine request.
    pub fn into_parts(self) -> (RoundId, StartRequest) {
        (
            self.round_id,
            StartRequest {
                client_seed: self.client_seed,
                bet_cents: self.bet_cents,
                drop_column: self.drop_column,
            },
        )
    }
}

/// Verify request: either a stored round or explicit inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Stored round to check (inputs below are then ignored).
    #[serde(default)]
    pub round_id: Option<RoundId>,
    /// Disclosed server seed.
    #[serde(default)]
    pub server_seed: Option<String>,
    /// Player seed.
    #[serde(default)]
    pub client_seed: Option<String>,
    /// Commitment nonce.
    #[serde(default)]
    pub nonce: Option<String>,
    /// Drop column.
    #[serde(default)]
    pub drop_column: Option<u32>,
    /// Board depth.
    #[serde(default)]
    pub rows: Option<u32>,
    /// Published values to compare the recomputation against.
    #[serde(default)]
    pub expected: Option<ExpectedOutcome>,
}

impl VerifyRequest {
    /// Split into the optional round id, the verifier inputs and the
    /// published values.
    pub fn into_parts(self) -> (Option<RoundId>, VerifyInput, Option<ExpectedOutcome>) {
        (
            self.round_id,
            VerifyInput {
                server_seed: self.server_seed,
                client_seed: self.client_seed,
                nonce: self.nonce,
                drop_column: self.drop_column,
                rows: self.rows,
            },
            self.expected,
        )
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Round committed.
    Committed(CommitReceipt),

    /// Round started.
    Started(StartReceipt),

    /// Server seed disclosed.
    Revealed(RevealReceipt),

    /// One round.
    Round(RoundView),

    /// Recent rounds, newest first.
    Rounds {
        /// Round views.
        rounds: Vec<RoundView>,
    },

    /// Verification result.
    Verified(VerificationReport),

    /// Pong response.
    Pong {
        /// Echo of client timestamp.
        timestamp: u64,
        /// Server time (ms since epoch).
        server_time: u64,
    },

    /// Request failed.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown {
        /// Reason for shutdown.
        reason: String,
    },
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or out-of-range input.
    InvalidInput,
    /// Round not found.
    NotFound,
    /// Round is in the wrong state for the request.
    Conflict,
    /// Internal error.
    InternalError,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => Self::InvalidInput,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Conflict => Self::Conflict,
            ErrorKind::Environment => Self::InternalError,
        }
    }
}

impl From<&RoundError> for ServerError {
    fn from(err: &RoundError) -> Self {
        Self {
            code: err.kind().into(),
            message: err.to_string(),
        }
    }
}

impl ServerMessage {
    /// Error message for a failed round operation.
    pub fn error(err: &RoundError) -> Self {
        Self::Error(err.into())
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
