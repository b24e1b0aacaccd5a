//! Round engine.
//!
//! Peg map, path, lifecycle and errors. Everything here is synchronous and
//! deterministic apart from secret generation in [`engine::create_round`].

pub mod error;
pub mod state;
pub mod pegmap;
pub mod path;
pub mod engine;

pub use error::{ErrorKind, RoundError};
pub use state::{Round, RoundId, RoundOutcome, RoundStatus, RoundView};
pub use pegmap::{PegMap, generate_peg_map};
pub use path::{Direction, PathOutcome, PathStep, compute_path, payout_multiplier};
pub use engine::{
    RoundConfig, RoundPlay, StartRequest, create_round, play_round, reveal_round, start_round,
};
