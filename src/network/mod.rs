//! Network Layer
//!
//! WebSocket server, round store and the boundary operations.
//! This layer is **non-deterministic** (clock, OS randomness, concurrency);
//! all round math runs through `round/` and `proof/`.

pub mod store;
pub mod service;
pub mod protocol;
pub mod server;

pub use store::RoundStore;
pub use service::{
    RoundService, NonceSequence, CommitReceipt, StartReceipt, RevealReceipt,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
pub use protocol::{
    ClientMessage, ServerMessage, ServerError, ErrorCode, StartRoundRequest, VerifyRequest,
};
pub use server::{RoundServer, ServerConfig, RoundServerError};
