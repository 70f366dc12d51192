use fixed_map::Map;
use serde::Serialize;
use tracing::debug;

use crate::event_file::error::ConsistencyError;
use crate::event_file::pbp::Bases;
use crate::event_file::schemas::{SubstitutionRecord, TeamRecord};
use crate::event_file::traits::{
    Fielder, FieldingPosition, LineupPosition, Matchup, Pitcher, Player, Side,
};

pub type Defense = Map<FieldingPosition, Fielder>;
pub type BattingOrder = Map<LineupPosition, Player>;

/// One team's batting order and alignment as of the current record.
#[derive(Debug, Clone)]
pub struct Lineup {
    pub team_id: String,
    roster: Vec<Player>,
    batting_order: BattingOrder,
    defense: Defense,
    next_batter: LineupPosition,
}

impl Lineup {
    /// Builds the starting lineup. Bench players only join the roster.
    pub fn from_card(team: &TeamRecord) -> Result<Self, ConsistencyError> {
        let mut lineup = Self {
            team_id: team.team_id.clone(),
            roster: Vec::with_capacity(team.lineup.len()),
            batting_order: Map::new(),
            defense: Map::new(),
            next_batter: LineupPosition::First,
        };
        for entry in &team.lineup {
            let player = entry.player.player_id();
            let invalid = |reason: &str| ConsistencyError::InvalidLineupEntry {
                player,
                reason: reason.to_string(),
            };
            if lineup.roster.contains(&player) {
                return Err(invalid("listed twice"));
            }
            lineup.roster.push(player);
            if let Some(lp) = entry.lineup_position {
                if lineup.batting_order.insert(lp, player).is_some() {
                    return Err(invalid("batting slot already taken"));
                }
            }
            if let Some(fp) = entry.fielder_position.filter(|fp| fp.is_true_position()) {
                if lineup.defense.insert(fp, player).is_some() {
                    return Err(invalid("fielding position already taken"));
                }
            }
        }
        Ok(lineup)
    }

    pub fn pitcher(&self) -> Option<Pitcher> {
        self.defense.get(FieldingPosition::Pitcher).copied()
    }

    pub const fn defense(&self) -> &Defense {
        &self.defense
    }

    pub const fn batting_order(&self) -> &BattingOrder {
        &self.batting_order
    }

    pub const fn next_batter(&self) -> LineupPosition {
        self.next_batter
    }

    pub fn set_next_batter(&mut self, position: LineupPosition) {
        self.next_batter = position;
    }

    pub fn lineup_position_of(&self, player: Player) -> Option<LineupPosition> {
        self.batting_order
            .iter()
            .find_map(|(lp, p)| (*p == player).then_some(lp))
    }

    pub fn contains(&self, player: Player) -> bool {
        self.roster.contains(&player)
    }

    fn fielding_position_of(&self, player: Player) -> Option<FieldingPosition> {
        self.defense
            .iter()
            .find_map(|(fp, p)| (*p == player).then_some(fp))
    }

    /// A pitcher moving into a regular batting slot, or the DH taking the field,
    /// ends the DH for this team.
    fn update_on_dh_vacancy(&mut self, sub: &SubstitutionRecord, previous: Option<FieldingPosition>) {
        let pitcher_bats = sub.fielder_position == FieldingPosition::Pitcher
            && sub.lineup_position != LineupPosition::PitcherWithDh
            && self.batting_order.contains_key(LineupPosition::PitcherWithDh);
        let dh_takes_field = previous == Some(FieldingPosition::DesignatedHitter)
            && sub.fielder_position.is_true_position()
            && sub.fielder_position != FieldingPosition::DesignatedHitter;
        if pitcher_bats {
            debug!("Team {} loses the DH, pitcher bats", self.team_id);
            self.batting_order.remove(LineupPosition::PitcherWithDh);
            self.defense.remove(FieldingPosition::DesignatedHitter);
        } else if dh_takes_field {
            debug!("Team {} loses the DH, DH takes the field", self.team_id);
            self.defense.remove(FieldingPosition::DesignatedHitter);
        }
    }

    /// Returns the player who previously held the batting slot.
    fn substitute(&mut self, sub: &SubstitutionRecord) -> Option<Player> {
        let player = sub.player.player_id();
        let previous_position = self.fielding_position_of(player);
        let outgoing = self.batting_order.insert(sub.lineup_position, player);
        // Pinch hitters and runners have no place in the field yet
        if sub.fielder_position.is_true_position() {
            if let Some(fp) = previous_position.filter(|fp| *fp != sub.fielder_position) {
                self.defense.remove(fp);
            }
            self.defense.insert(sub.fielder_position, player);
        }
        self.update_on_dh_vacancy(sub, previous_position);
        outgoing.filter(|p| *p != player)
    }

    pub fn snapshot(&self) -> LineupSnapshot {
        let slots = LineupPosition::batting_slots()
            .into_iter()
            .chain(std::iter::once(LineupPosition::PitcherWithDh));
        LineupSnapshot {
            team_id: self.team_id.clone(),
            batting_order: slots
                .filter_map(|lp| {
                    self.batting_order.get(lp).map(|p| BattingSlot {
                        lineup_position: lp,
                        player: *p,
                    })
                })
                .collect(),
            defense: self
                .defense
                .iter()
                .map(|(fp, p)| DefensiveSlot {
                    fielder_position: fp,
                    player: *p,
                })
                .collect(),
            next_batter: self.next_batter,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub struct BattingSlot {
    pub lineup_position: LineupPosition,
    pub player: Player,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub struct DefensiveSlot {
    pub fielder_position: FieldingPosition,
    pub player: Player,
}

/// Serializable view of a [`Lineup`]. The non-batting pitcher comes last.
#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct LineupSnapshot {
    pub team_id: String,
    pub batting_order: Vec<BattingSlot>,
    pub defense: Vec<DefensiveSlot>,
    pub next_batter: LineupPosition,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct SubstitutionOutcome {
    pub side: Side,
    pub outgoing: Option<Player>,
    pub bases_after: Bases,
}

/// Applies a substitution to whichever team carries the player on its roster.
/// A runner on base who is replaced in the batting order is swapped for the
/// incoming player in the returned bases.
pub fn apply_substitution(
    lineups: &mut Matchup<Lineup>,
    sub: &SubstitutionRecord,
    bases: &Bases,
) -> Result<SubstitutionOutcome, ConsistencyError> {
    let player = sub.player.player_id();
    let side = [Side::Away, Side::Home]
        .into_iter()
        .find(|side| lineups.get(*side).contains(player))
        .ok_or(ConsistencyError::UnknownPlayer(player))?;
    let outgoing = lineups.get_mut(side).substitute(sub);
    let bases_after = outgoing.map_or(*bases, |o| bases.with_runner_replaced(o, player));
    Ok(SubstitutionOutcome {
        side,
        outgoing,
        bases_after,
    })
}
