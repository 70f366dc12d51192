use serde::{Deserialize, Serialize};

use crate::event_file::traits::{FieldingPosition, Inning, LineupPosition, Player};

/// Players show up either as a bare id or as a roster card carrying one.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerRef {
    Id(Player),
    Card { player_id: Player },
}

impl PlayerRef {
    pub const fn player_id(&self) -> Player {
        match self {
            Self::Id(p) | Self::Card { player_id: p } => *p,
        }
    }
}

impl From<Player> for PlayerRef {
    fn from(player: Player) -> Self {
        Self::Id(player)
    }
}

/// One roster line. Bench players have neither position.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct LineupEntry {
    pub player: PlayerRef,
    #[serde(default)]
    pub lineup_position: Option<LineupPosition>,
    #[serde(default)]
    pub fielder_position: Option<FieldingPosition>,
    #[serde(default)]
    pub starter: bool,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: String,
    #[serde(default)]
    pub lineup: Vec<LineupEntry>,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct PlayRecord {
    pub inning: Inning,
    pub batting_team_id: String,
    pub batting_player_id: Player,
    #[serde(default)]
    pub play: String,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    pub player: PlayerRef,
    pub lineup_position: LineupPosition,
    pub fielder_position: FieldingPosition,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameRecordEntry {
    Play(PlayRecord),
    Substitution { substitution: SubstitutionRecord },
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub game_id: String,
    pub visitor_team: TeamRecord,
    pub home_team: TeamRecord,
    #[serde(default)]
    pub plays: Vec<GameRecordEntry>,
}

/// A game file holds either one game or a `games` collection.
#[derive(Debug, Eq, PartialEq, Clone, Deserialize)]
#[serde(untagged)]
pub enum GameFile {
    Many { games: Vec<GameRecord> },
    Single(GameRecord),
}

impl GameFile {
    pub fn into_games(self) -> Vec<GameRecord> {
        match self {
            Self::Many { games } => games,
            Self::Single(game) => vec![game],
        }
    }
}
