use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::event_file::traits::{Base, Player};

/// Grammar failures. These never stop processing; they are collected on the
/// play so a caller can decide whether to use it.
#[derive(Debug, Clone, Eq, PartialEq, Error, Serialize)]
pub enum ParseError {
    #[error("Unrecognized basic play `{0}`")]
    BasicPlay(String),
    #[error("Unrecognized modifier `{0}`")]
    Modifier(String),
    #[error("Unrecognized advance `{0}`")]
    Advance(String),
    #[error("Duplicate trajectory modifiers in `{0}`")]
    DuplicateTrajectory(String),
    #[error("Duplicate location modifiers in `{0}`")]
    DuplicateLocation(String),
}

/// Violations of game invariants. Any of these aborts the game being processed.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("Every play must have a batter")]
    MissingBatter,
    #[error("Runner {0} appears on more than one base")]
    DuplicateRunner(Player),
    #[error("Runners {first} and {second} both end the play on base {base}")]
    BaseCollision {
        base: Base,
        first: Player,
        second: Player,
    },
    #[error("Illegal state, {outs} outs recorded in the half-inning after `{play}`")]
    TooManyOuts { outs: usize, play: String },
    #[error("Team {team} came to bat again after the third out")]
    ThirdOutWithoutSideChange { team: String },
    #[error("Player {0} is not on either roster")]
    UnknownPlayer(Player),
    #[error("Team {0} is not playing in this game")]
    UnknownTeam(String),
    #[error("Batter {batter} is not in the batting order of team {team}")]
    BatterNotInLineup { batter: Player, team: String },
    #[error("Invalid lineup entry for {player}: {reason}")]
    InvalidLineupEntry { player: Player, reason: String },
}

#[derive(Debug, Error)]
pub enum GameErrorKind {
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error("Rejected play `{play}`: {}", .errors.iter().join("; "))]
    InvalidPlay {
        play: String,
        errors: Vec<ParseError>,
    },
}

#[derive(Debug, Error)]
#[error("Game {game_id}, record {record_index}: {kind}")]
pub struct GameError {
    pub game_id: String,
    pub record_index: usize,
    #[source]
    pub kind: GameErrorKind,
}
