use serde::Serialize;
use tracing::warn;

use crate::event_file::advance::{Advance, AdvanceMarker};
use crate::event_file::error::ConsistencyError;
use crate::event_file::pbp::{BaseState, Bases, RunnerIdentity};
use crate::event_file::play::{BaserunningPlay, BaserunningPlayType, BasicPlay, HitType, RawEvent};
use crate::event_file::traits::{Base, BaseRunner};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub struct RunScored {
    pub runner: RunnerIdentity,
    pub scored_from: BaseRunner,
    pub unearned_indicated: bool,
    pub team_unearned_indicated: bool,
    pub no_rbi_indicated: bool,
}

impl RunScored {
    fn new(runner: RunnerIdentity, scored_from: BaseRunner, advance: Option<&Advance>) -> Self {
        let marked = |marker| advance.map_or(false, |a| a.has_marker(marker));
        Self {
            runner,
            scored_from,
            unearned_indicated: marked(AdvanceMarker::UnearnedRun),
            team_unearned_indicated: marked(AdvanceMarker::TeamUnearnedRun),
            no_rbi_indicated: marked(AdvanceMarker::NoRbi),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize)]
pub struct Advancement {
    pub bases_after_play: Bases,
    /// Indexed by destination base starting at second. Kept apart from the
    /// bases because a stealer can be thrown out later on the same play.
    pub base_stealers: Vec<Option<RunnerIdentity>>,
    pub runs_scored_by: Vec<RunScored>,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum Fate {
    Stays,
    Moves(Base),
    Removed,
}

struct AdvancementResolver<'a> {
    event: &'a RawEvent,
    before: &'a BaseState,
    baserunning: &'a [BaserunningPlay],
    bases: [Option<RunnerIdentity>; 3],
    runs: Vec<RunScored>,
}

impl<'a> AdvancementResolver<'a> {
    fn new(event: &'a RawEvent, before: &'a BaseState) -> Self {
        Self {
            event,
            before,
            baserunning: event
                .parsed_basic_play
                .as_ref()
                .map_or(&[][..], BasicPlay::baserunning_plays),
            bases: [None; 3],
            runs: vec![],
        }
    }

    fn forced_out(&self, baserunner: BaseRunner) -> bool {
        matches!(
            &self.event.parsed_basic_play,
            Some(BasicPlay::FieldingOut(groups)) if groups.iter().any(|g| g.runner == Some(baserunner))
        )
    }

    /// Explicit advances govern; steals, caught stealing and pickoffs apply only
    /// to runners without one.
    fn runner_fate(&self, baserunner: BaseRunner) -> Fate {
        if let Some(advance) = self.event.advance_from(baserunner) {
            return if advance.runner_safe() {
                Fate::Moves(advance.ending_base)
            } else {
                Fate::Removed
            };
        }
        let attempt = self
            .baserunning
            .iter()
            .find(|p| p.runner() == Some(baserunner));
        if let Some(BaserunningPlay {
            play_type,
            base: Some(base),
            ..
        }) = attempt
        {
            let error = attempt.map_or(false, BaserunningPlay::has_error);
            return match play_type {
                BaserunningPlayType::StolenBase => Fate::Moves(*base),
                BaserunningPlayType::CaughtStealing | BaserunningPlayType::PickedOffCaughtStealing
                    if error =>
                {
                    if *base == Base::Home {
                        Fate::Stays
                    } else {
                        Fate::Moves(*base)
                    }
                }
                BaserunningPlayType::PickedOff if error => Fate::Stays,
                _ => Fate::Removed,
            };
        }
        if self.forced_out(baserunner) {
            Fate::Removed
        } else {
            Fate::Stays
        }
    }

    fn implicit_batter_destination(&self) -> Option<Base> {
        match self.event.parsed_basic_play.as_ref()? {
            BasicPlay::Hit { hit_type, .. } => Some(match hit_type {
                HitType::Single => Base::First,
                HitType::Double | HitType::GroundRuleDouble => Base::Second,
                HitType::Triple => Base::Third,
                HitType::HomeRun => Base::Home,
            }),
            BasicPlay::ReachedOnError(_)
            | BasicPlay::FieldersChoice(_)
            | BasicPlay::HitByPitch
            | BasicPlay::Interference
            | BasicPlay::Walk { .. } => Some(Base::First),
            BasicPlay::FieldingOut(groups)
                if groups.iter().all(|g| g.baserunner() != BaseRunner::Batter) =>
            {
                Some(Base::First)
            }
            _ => None,
        }
    }

    fn place(&mut self, base: Base, runner: RunnerIdentity) -> Result<(), ConsistencyError> {
        let Some(index) = base.base_index() else {
            return Ok(());
        };
        if let Some(existing) = self.bases[index] {
            return Err(ConsistencyError::BaseCollision {
                base,
                first: existing.batter,
                second: runner.batter,
            });
        }
        self.bases[index] = Some(runner);
        Ok(())
    }

    fn settle(
        &mut self,
        baserunner: BaseRunner,
        runner: RunnerIdentity,
        fate: Fate,
    ) -> Result<(), ConsistencyError> {
        match fate {
            Fate::Removed => Ok(()),
            Fate::Moves(Base::Home) => {
                let advance = self.event.advance_from(baserunner);
                self.runs.push(RunScored::new(runner, baserunner, advance));
                Ok(())
            }
            Fate::Moves(base) => self.place(base, runner),
            Fate::Stays => match baserunner {
                BaseRunner::First => self.place(Base::First, runner),
                BaseRunner::Second => self.place(Base::Second, runner),
                BaseRunner::Third => self.place(Base::Third, runner),
                BaseRunner::Batter => Ok(()),
            },
        }
    }

    fn warn_on_empty_bases(&self) {
        for advance in &self.event.advances {
            if self.before.get_runner(advance.starting_base).is_none() {
                warn!(
                    "Advance from empty base {} in `{}` ignored",
                    advance.starting_base, self.event.raw_text
                );
            }
        }
        for play in self.baserunning {
            if let Some(baserunner) = play.runner() {
                if self.before.get_runner(baserunner).is_none() {
                    warn!(
                        "{}{} with nobody on base {} in `{}` ignored",
                        play.play_type,
                        play.base.map_or(String::new(), |b| b.to_string()),
                        baserunner,
                        self.event.raw_text
                    );
                }
            }
        }
    }

    fn base_stealers(&self) -> Vec<Option<RunnerIdentity>> {
        let mut stealers = vec![];
        for play in self.baserunning {
            let (BaserunningPlayType::StolenBase, Some(base), Some(baserunner)) =
                (play.play_type, play.base, play.runner())
            else {
                continue;
            };
            let Some(runner) = self.before.get_runner(baserunner) else {
                continue;
            };
            let index = base as usize - Base::Second as usize;
            if stealers.len() <= index {
                stealers.resize(index + 1, None);
            }
            stealers[index] = Some(*runner);
        }
        stealers
    }

    fn resolve(mut self) -> Result<Advancement, ConsistencyError> {
        self.warn_on_empty_bases();
        for baserunner in [BaseRunner::Third, BaseRunner::Second, BaseRunner::First] {
            if let Some(runner) = self.before.get_runner(baserunner).copied() {
                let fate = self.runner_fate(baserunner);
                self.settle(baserunner, runner, fate)?;
            }
        }

        let batter = *self.before.batter();
        if self.event.advance_from(BaseRunner::Batter).is_some() {
            let fate = self.runner_fate(BaseRunner::Batter);
            self.settle(BaseRunner::Batter, batter, fate)?;
        } else if let Some(base) = self.implicit_batter_destination() {
            if let Err(e) = self.settle(BaseRunner::Batter, batter, Fate::Moves(base)) {
                warn!(
                    "Batter placed on {} by `{}` without an explicit advance for the runner there",
                    base, self.event.raw_text
                );
                return Err(e);
            }
        }

        Ok(Advancement {
            bases_after_play: Bases::new(self.bases),
            base_stealers: self.base_stealers(),
            runs_scored_by: self.runs,
        })
    }
}

/// Computes where everyone ends up after the play: runners carried forward,
/// explicit advances, implicit batter placement, steals, caught stealing and
/// pickoffs, plus the runs that scored.
pub fn resolve_advancement(
    event: &RawEvent,
    before: &BaseState,
) -> Result<Advancement, ConsistencyError> {
    AdvancementResolver::new(event, before).resolve()
}
