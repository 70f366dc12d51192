use serde::Serialize;

use crate::event_file::error::ConsistencyError;
use crate::event_file::traits::{BaseRunner, Pitcher, Player};

/// A specific batter occupying (or about to occupy) a base, together with the
/// pitcher charged with having put him there.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Serialize)]
pub struct RunnerIdentity {
    pub batter: Player,
    pub responsible_pitcher: Option<Pitcher>,
}

impl RunnerIdentity {
    pub const fn new(batter: Player, responsible_pitcher: Option<Pitcher>) -> Self {
        Self {
            batter,
            responsible_pitcher,
        }
    }
}

/// Occupants of first, second and third. Snapshots are never edited in place;
/// every play and pinch-running substitution produces a new one.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Bases([Option<RunnerIdentity>; 3]);

impl Bases {
    pub const fn new(slots: [Option<RunnerIdentity>; 3]) -> Self {
        Self(slots)
    }

    pub const fn slots(&self) -> &[Option<RunnerIdentity>; 3] {
        &self.0
    }

    pub fn get(&self, baserunner: BaseRunner) -> Option<&RunnerIdentity> {
        baserunner
            .base_index()
            .and_then(|i| self.0[i].as_ref())
    }

    pub fn num_runners_on_base(&self) -> usize {
        self.0.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.num_runners_on_base() == 0
    }

    /// Pinch-running: the incoming player takes over the outgoing player's base,
    /// keeping the pitcher responsible for the original runner.
    pub fn with_runner_replaced(&self, outgoing: Player, incoming: Player) -> Self {
        let mut slots = self.0;
        for runner in slots.iter_mut().flatten() {
            if runner.batter == outgoing {
                runner.batter = incoming;
            }
        }
        Self(slots)
    }
}

/// The four-slot state a play starts from: the batter plus whoever is on base.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub struct BaseState {
    batter: RunnerIdentity,
    runners: Bases,
}

impl BaseState {
    pub fn new(batter: RunnerIdentity, runners: Bases) -> Result<Self, ConsistencyError> {
        let mut seen: Vec<Player> = Vec::with_capacity(4);
        for identity in std::iter::once(&batter).chain(runners.0.iter().flatten()) {
            if seen.contains(&identity.batter) {
                return Err(ConsistencyError::DuplicateRunner(identity.batter));
            }
            seen.push(identity.batter);
        }
        Ok(Self { batter, runners })
    }

    /// Builds from `[batter, first, second, third]`.
    pub fn from_slots(slots: [Option<RunnerIdentity>; 4]) -> Result<Self, ConsistencyError> {
        let [batter, first, second, third] = slots;
        let batter = batter.ok_or(ConsistencyError::MissingBatter)?;
        Self::new(batter, Bases([first, second, third]))
    }

    pub const fn batter(&self) -> &RunnerIdentity {
        &self.batter
    }

    pub const fn runners(&self) -> &Bases {
        &self.runners
    }

    pub fn get_runner(&self, baserunner: BaseRunner) -> Option<&RunnerIdentity> {
        match baserunner {
            BaseRunner::Batter => Some(&self.batter),
            _ => self.runners.get(baserunner),
        }
    }
}
