//! # Peg Drop Server
//!
//! Provably-fair peg-drop rounds: the server commits to a secret seed, the
//! player adds their own seed and a drop column, and anyone can replay the
//! round once the secret is revealed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PEG DROP SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                 │
//! │  ├── hash.rs     - SHA256 hex digests of ':'-joined fields  │
//! │  ├── rng.rs      - Deterministic xorshift32 PRNG            │
//! │  └── decimal.rs  - Six-decimal numbers and canonical text   │
//! │                                                             │
//! │  round/          - Round engine (deterministic)             │
//! │  ├── pegmap.rs   - Peg bias table and its hash              │
//! │  ├── path.rs     - Ball path, bin and payout                │
//! │  ├── state.rs    - Round record and public view             │
//! │  ├── engine.rs   - Create / start / reveal transitions      │
//! │  └── error.rs    - Error taxonomy                           │
//! │                                                             │
//! │  proof/          - Fairness proof                           │
//! │  ├── commitment.rs - Server seed commitment                 │
//! │  └── verify.rs   - Independent recomputation                │
//! │                                                             │
//! │  network/        - Networking (non-deterministic)           │
//! │  ├── store.rs    - In-memory round store                    │
//! │  ├── service.rs  - Boundary operations                      │
//! │  ├── protocol.rs - Message types                            │
//! │  └── server.rs   - WebSocket server                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the server seed, client seed, nonce, drop column and row count,
//! `core/`, `round/` and `proof/` produce **identical results** on every
//! platform and in every reimplementation that follows the same rules:
//! - Hashes over UTF-8 text, lowercase hex
//! - Integer PRNG state, one draw per peg then one per row
//! - Peg biases stored as integer micro-units, rendered without float
//!   formatting

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod round;
pub mod proof;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use proof::commitment::{ServerSeed, RoundCommitment};
pub use proof::verify::{verify, verify_round, VerifyInput, VerificationReport};
pub use round::{Round, RoundId, RoundStatus, RoundError, ErrorKind, RoundConfig};
pub use network::{RoundServer, RoundService, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default board depth.
pub const DEFAULT_ROWS: u32 = 12;
