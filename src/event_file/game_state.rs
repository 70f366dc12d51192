use bounded_integer::BoundedUsize;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event_file::enhanced::EnhancedPlay;
use crate::event_file::error::{ConsistencyError, GameError, GameErrorKind};
use crate::event_file::lineup::{apply_substitution, Lineup, LineupSnapshot};
use crate::event_file::pbp::{BaseState, Bases, RunnerIdentity};
use crate::event_file::schemas::{GameRecord, GameRecordEntry, PlayRecord, SubstitutionRecord};
use crate::event_file::traits::{Inning, LineupPosition, Matchup, Player, Side};

pub type Outs = BoundedUsize<0, 3>;

/// What to do with a play whose notation does not fully parse.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Keep the play, flagged invalid, and resolve what can be resolved.
    #[default]
    Lenient,
    /// Abort the game.
    Strict,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
pub struct GameOptions {
    pub validation: ValidationPolicy,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct ProcessedPlay {
    pub inning: Inning,
    pub batting_side: Side,
    pub batter: Player,
    pub lineup_position: LineupPosition,
    pub outs_before: usize,
    pub base_state_before: BaseState,
    /// `None` when the record carries no play text.
    pub enhanced_play: Option<EnhancedPlay>,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct ProcessedSubstitution {
    pub substitution: SubstitutionRecord,
    pub side: Side,
    pub outgoing: Option<Player>,
    pub lineups: Matchup<LineupSnapshot>,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessedRecord {
    Play(ProcessedPlay),
    Substitution(ProcessedSubstitution),
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct ProcessedGame {
    pub game_id: String,
    pub records: Vec<ProcessedRecord>,
    pub final_lineups: Matchup<LineupSnapshot>,
}

/// Outs, bases and lineups between records. Plays must be folded in order:
/// each one starts from exactly the state its predecessor left.
#[derive(Debug, Clone)]
pub struct GameState {
    game_id: String,
    lineups: Matchup<Lineup>,
    outs: Outs,
    bases: Bases,
    batting_side: Option<Side>,
    inning: Inning,
}

impl GameState {
    pub fn new(game: &GameRecord) -> Result<Self, ConsistencyError> {
        Ok(Self {
            game_id: game.game_id.clone(),
            lineups: Matchup::new(
                Lineup::from_card(&game.visitor_team)?,
                Lineup::from_card(&game.home_team)?,
            ),
            outs: Outs::MIN,
            bases: Bases::default(),
            batting_side: None,
            inning: 1,
        })
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn outs(&self) -> usize {
        self.outs.get()
    }

    pub const fn bases(&self) -> &Bases {
        &self.bases
    }

    pub const fn batting_side(&self) -> Option<Side> {
        self.batting_side
    }

    pub const fn inning(&self) -> Inning {
        self.inning
    }

    pub const fn lineups(&self) -> &Matchup<Lineup> {
        &self.lineups
    }

    /// The side expected to bat on the next play. The visitors open the game.
    pub fn next_batting_side(&self) -> Side {
        match self.batting_side {
            None => Side::Away,
            Some(side) if self.outs.get() == 3 => side.flip(),
            Some(side) => side,
        }
    }

    pub fn lineup_snapshots(&self) -> Matchup<LineupSnapshot> {
        Matchup::new(self.lineups.away.snapshot(), self.lineups.home.snapshot())
    }

    fn side_of_team(&self, team_id: &str) -> Result<Side, ConsistencyError> {
        [Side::Away, Side::Home]
            .into_iter()
            .find(|side| self.lineups.get(*side).team_id == team_id)
            .ok_or_else(|| ConsistencyError::UnknownTeam(team_id.to_string()))
    }

    /// Clears outs and bases when the other team comes up. A team coming back
    /// up after its own third out means records are missing.
    fn update_on_frame(&mut self, side: Side, team_id: &str) -> Result<(), ConsistencyError> {
        match self.batting_side {
            Some(current) if current == side => {
                if self.outs.get() == 3 {
                    return Err(ConsistencyError::ThirdOutWithoutSideChange {
                        team: team_id.to_string(),
                    });
                }
            }
            Some(current) => {
                if self.outs.get() < 3 {
                    warn!(
                        "{}: {} side retired with {} outs",
                        self.game_id,
                        current,
                        self.outs.get()
                    );
                }
                self.outs = Outs::MIN;
                self.bases = Bases::default();
            }
            None => {}
        }
        self.batting_side = Some(side);
        Ok(())
    }

    fn update_on_play(
        &mut self,
        play: &PlayRecord,
        options: GameOptions,
    ) -> Result<ProcessedPlay, GameErrorKind> {
        let side = self.side_of_team(&play.batting_team_id)?;
        self.update_on_frame(side, &play.batting_team_id)?;
        self.inning = play.inning;

        let batting = self.lineups.get(side);
        let batter = play.batting_player_id;
        let lineup_position = batting.lineup_position_of(batter).ok_or_else(|| {
            ConsistencyError::BatterNotInLineup {
                batter,
                team: batting.team_id.clone(),
            }
        })?;
        if lineup_position != batting.next_batter() {
            warn!(
                "{}: {} batting in slot {}, expected slot {}",
                self.game_id,
                batter,
                u8::from(lineup_position),
                u8::from(batting.next_batter())
            );
        }

        let fielding = self.lineups.get(side.flip());
        let identity = RunnerIdentity::new(batter, fielding.pitcher());
        let base_state_before = BaseState::new(identity, self.bases)?;
        let outs_before = self.outs.get();
        let enhanced_play =
            EnhancedPlay::new(&play.play, &base_state_before, outs_before, fielding.defense())?;

        if let Some(enhanced) = &enhanced_play {
            if !enhanced.valid {
                match options.validation {
                    ValidationPolicy::Strict => {
                        return Err(GameErrorKind::InvalidPlay {
                            play: play.play.clone(),
                            errors: enhanced.validation_errors.clone(),
                        })
                    }
                    ValidationPolicy::Lenient => warn!(
                        "{}: invalid play `{}` kept: {:?}",
                        self.game_id, play.play, enhanced.validation_errors
                    ),
                }
            }
            self.outs = Outs::new(enhanced.outs_after_play).ok_or_else(|| {
                ConsistencyError::TooManyOuts {
                    outs: enhanced.outs_after_play,
                    play: play.play.clone(),
                }
            })?;
            self.bases = if self.outs.get() == 3 {
                Bases::default()
            } else {
                enhanced.bases_occupied_after_play
            };
            let next_batter = if enhanced.plate_appearance {
                lineup_position.next().unwrap_or(lineup_position)
            } else {
                lineup_position
            };
            self.lineups.get_mut(side).set_next_batter(next_batter);
        }

        Ok(ProcessedPlay {
            inning: play.inning,
            batting_side: side,
            batter,
            lineup_position,
            outs_before,
            base_state_before,
            enhanced_play,
        })
    }

    fn update_on_substitution(
        &mut self,
        sub: &SubstitutionRecord,
    ) -> Result<ProcessedSubstitution, ConsistencyError> {
        let outcome = apply_substitution(&mut self.lineups, sub, &self.bases)?;
        self.bases = outcome.bases_after;
        Ok(ProcessedSubstitution {
            substitution: *sub,
            side: outcome.side,
            outgoing: outcome.outgoing,
            lineups: self.lineup_snapshots(),
        })
    }

    pub fn update(
        &mut self,
        record: &GameRecordEntry,
        options: GameOptions,
    ) -> Result<ProcessedRecord, GameErrorKind> {
        match record {
            GameRecordEntry::Play(play) => {
                debug!("{}: play {} `{}`", self.game_id, play.batting_player_id, play.play);
                self.update_on_play(play, options).map(ProcessedRecord::Play)
            }
            GameRecordEntry::Substitution { substitution } => {
                debug!(
                    "{}: substitution {}",
                    self.game_id,
                    substitution.player.player_id()
                );
                Ok(ProcessedRecord::Substitution(
                    self.update_on_substitution(substitution)?,
                ))
            }
        }
    }

    fn fold(
        game: &GameRecord,
        options: GameOptions,
        until: Option<usize>,
    ) -> Result<(Self, Vec<ProcessedRecord>), GameError> {
        let wrap = |record_index: usize| {
            move |kind: GameErrorKind| GameError {
                game_id: game.game_id.clone(),
                record_index,
                kind,
            }
        };
        let mut state = Self::new(game).map_err(|e| wrap(0)(e.into()))?;
        let limit = until.unwrap_or(game.plays.len());
        let mut records = Vec::with_capacity(limit.min(game.plays.len()));
        for (i, record) in game.plays.iter().take(limit).enumerate() {
            records.push(state.update(record, options).map_err(wrap(i))?);
        }
        Ok((state, records))
    }

    /// Folds every record of the game. Any consistency error aborts the game.
    pub fn process(game: &GameRecord, options: GameOptions) -> Result<ProcessedGame, GameError> {
        let (state, records) = Self::fold(game, options, None)?;
        Ok(ProcessedGame {
            game_id: state.game_id.clone(),
            records,
            final_lineups: state.lineup_snapshots(),
        })
    }

    /// The state as of the first `until` records, or the end of the game.
    pub fn replay(
        game: &GameRecord,
        options: GameOptions,
        until: Option<usize>,
    ) -> Result<Self, GameError> {
        Self::fold(game, options, until).map(|(state, _)| state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_file::error::ParseError;
    use crate::event_file::lineup::tests::dh_card;
    use crate::event_file::schemas::PlayerRef;
    use crate::event_file::traits::BaseRunner;

    fn player(id: &str) -> Player {
        Player::from(id).unwrap()
    }

    fn play(team: &str, batter: &str, text: &str) -> GameRecordEntry {
        GameRecordEntry::Play(PlayRecord {
            inning: 1,
            batting_team_id: team.to_string(),
            batting_player_id: player(batter),
            play: text.to_string(),
        })
    }

    fn sub(id: &str, lp: u8, fp: u8) -> GameRecordEntry {
        GameRecordEntry::Substitution {
            substitution: SubstitutionRecord {
                player: PlayerRef::Id(player(id)),
                lineup_position: LineupPosition::try_from(lp).unwrap(),
                fielder_position: crate::event_file::traits::FieldingPosition::try_from(fp)
                    .unwrap(),
            },
        }
    }

    fn game(plays: Vec<GameRecordEntry>) -> GameRecord {
        GameRecord {
            game_id: "TST202304010".to_string(),
            visitor_team: dh_card("AWY", "a"),
            home_team: dh_card("HOM", "h"),
            plays,
        }
    }

    #[test]
    fn half_inning_then_side_change() {
        let record = game(vec![
            play("AWY", "a1", "S7"),
            play("AWY", "a2", "K"),
            play("AWY", "a3", "64(1)3/GDP"),
            play("HOM", "h1", "63"),
        ]);

        let state = GameState::replay(&record, GameOptions::default(), Some(1)).unwrap();
        assert_eq!(
            state.bases().get(BaseRunner::First),
            Some(&RunnerIdentity::new(player("a1"), Some(player("hp"))))
        );
        assert_eq!(state.outs(), 0);

        let state = GameState::replay(&record, GameOptions::default(), Some(3)).unwrap();
        assert_eq!(state.outs(), 3);
        assert!(state.bases().is_empty());
        assert_eq!(state.next_batting_side(), Side::Home);
        assert_eq!(state.lineups().away.next_batter(), LineupPosition::Fourth);

        let state = GameState::replay(&record, GameOptions::default(), None).unwrap();
        assert_eq!(state.outs(), 1);
        assert_eq!(state.batting_side(), Some(Side::Home));
        assert_eq!(state.lineups().home.next_batter(), LineupPosition::Second);
    }

    #[test]
    fn processed_records() {
        let record = game(vec![
            play("AWY", "a1", "S7"),
            play("AWY", "a2", ""),
            play("AWY", "a2", "SB2"),
            play("AWY", "a2", "D8.2-H"),
        ]);
        let processed = GameState::process(&record, GameOptions::default()).unwrap();
        assert_eq!(processed.game_id, "TST202304010");
        assert_eq!(processed.records.len(), 4);
        let ProcessedRecord::Play(last) = &processed.records[3] else {
            panic!("expected a play")
        };
        assert_eq!(last.lineup_position, LineupPosition::Second);
        let enhanced = last.enhanced_play.as_ref().unwrap();
        assert_eq!(enhanced.rbi, 1);
        assert_eq!(enhanced.runs_scored_by[0].runner.batter, player("a1"));
        assert_eq!(
            processed.final_lineups.away.next_batter,
            LineupPosition::Third
        );
        let ProcessedRecord::Play(empty) = &processed.records[1] else {
            panic!("expected a play")
        };
        assert_eq!(empty.enhanced_play, None);
    }

    #[test]
    fn too_many_outs_is_fatal() {
        let record = game(vec![
            play("AWY", "a1", "K"),
            play("AWY", "a2", "K"),
            play("AWY", "a3", "S7"),
            play("AWY", "a4", "54(1)3/GDP"),
        ]);
        let err = GameState::process(&record, GameOptions::default()).unwrap_err();
        assert_eq!(err.record_index, 3);
        assert!(matches!(
            err.kind,
            GameErrorKind::Consistency(ConsistencyError::TooManyOuts { outs: 4, .. })
        ));
    }

    #[test]
    fn batting_again_after_third_out_is_fatal() {
        let record = game(vec![
            play("AWY", "a1", "K"),
            play("AWY", "a2", "K"),
            play("AWY", "a3", "K"),
            play("AWY", "a4", "S7"),
        ]);
        let err = GameState::process(&record, GameOptions::default()).unwrap_err();
        assert_eq!(err.record_index, 3);
        assert!(matches!(
            err.kind,
            GameErrorKind::Consistency(ConsistencyError::ThirdOutWithoutSideChange { .. })
        ));
    }

    #[test]
    fn early_side_change_resets_state() {
        let record = game(vec![play("AWY", "a1", "S7"), play("HOM", "h1", "S7")]);
        let state = GameState::replay(&record, GameOptions::default(), None).unwrap();
        assert_eq!(state.outs(), 0);
        assert_eq!(
            state.bases().get(BaseRunner::First).map(|r| r.batter),
            Some(player("h1"))
        );
    }

    #[test]
    fn validation_policy() {
        let record = game(vec![play("AWY", "a1", "bleh")]);
        let processed = GameState::process(&record, GameOptions::default()).unwrap();
        let ProcessedRecord::Play(p) = &processed.records[0] else {
            panic!("expected a play")
        };
        assert!(!p.enhanced_play.as_ref().unwrap().valid);

        let strict = GameOptions {
            validation: ValidationPolicy::Strict,
        };
        let err = GameState::process(&record, strict).unwrap_err();
        match err.kind {
            GameErrorKind::InvalidPlay { play, errors } => {
                assert_eq!(play, "bleh");
                assert_eq!(errors, vec![ParseError::BasicPlay("bleh".into())]);
            }
            GameErrorKind::Consistency(e) => panic!("unexpected {e}"),
        }
    }

    #[test]
    fn unknown_batters_and_teams() {
        let err = GameState::process(&game(vec![play("AWY", "abench", "S7")]), GameOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            GameErrorKind::Consistency(ConsistencyError::BatterNotInLineup { .. })
        ));

        let err = GameState::process(&game(vec![play("XXX", "a1", "S7")]), GameOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            GameErrorKind::Consistency(ConsistencyError::UnknownTeam(_))
        ));

        let err = GameState::process(&game(vec![sub("nobody", 1, 11)]), GameOptions::default())
            .unwrap_err();
        assert_eq!(err.record_index, 0);
        assert!(matches!(
            err.kind,
            GameErrorKind::Consistency(ConsistencyError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn pinch_runner_scores_for_original_pitcher() {
        let record = game(vec![
            play("AWY", "a1", "S7"),
            sub("abench", 1, 12),
            play("AWY", "a2", "S8.1-3"),
            sub("hreliever", 0, 1),
            play("AWY", "a3", "S9.3-H;1-2"),
        ]);
        let processed = GameState::process(&record, GameOptions::default()).unwrap();
        let ProcessedRecord::Play(last) = &processed.records[4] else {
            panic!("expected a play")
        };
        let run = &last.enhanced_play.as_ref().unwrap().runs_scored_by[0];
        assert_eq!(run.runner.batter, player("abench"));
        assert_eq!(run.runner.responsible_pitcher, Some(player("hp")));
        let on_second = last
            .enhanced_play
            .as_ref()
            .unwrap()
            .bases_occupied_after_play
            .get(BaseRunner::Second)
            .copied()
            .unwrap();
        assert_eq!(on_second.responsible_pitcher, Some(player("hp")));
        assert_eq!(
            last.base_state_before.batter().responsible_pitcher,
            Some(player("hreliever"))
        );
        let ProcessedRecord::Substitution(s) = &processed.records[1] else {
            panic!("expected a substitution")
        };
        assert_eq!(s.outgoing, Some(player("a1")));
        assert_eq!(s.side, Side::Away);
    }
}
