#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

//! Retrosheet play notation: a parser for single play strings and a state machine
//! that folds a game's plays and substitutions into enhanced, per-play records.

pub mod event_file;
mod util;

pub use event_file::enhanced::EnhancedPlay;
pub use event_file::error::{ConsistencyError, GameError, GameErrorKind, ParseError};
pub use event_file::game_state::{GameOptions, GameState, ProcessedGame, ValidationPolicy};
pub use event_file::play::RawEvent;
pub use event_file::schemas::{GameFile, GameRecord};
