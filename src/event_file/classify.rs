use serde::Serialize;
use strum_macros::Display;

use crate::event_file::play::{
    BaserunningPlayType, BasicPlay, ContactType, HitType, PlayModifier, RawEvent,
};
use crate::util::first_error_digit;

/// The primary outcome of a play, one variant per basic-play category.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Display, Serialize)]
pub enum PlayOutcome {
    FieldingOut,
    Single,
    Double,
    GroundRuleDouble,
    Triple,
    HomeRun,
    ReachedOnError,
    FieldersChoice,
    ErrorOnFoul,
    Walk,
    IntentionalWalk,
    HitByPitch,
    Interference,
    StrikeOut,
    NoPlay,
    StolenBase,
    CaughtStealing,
    PickedOff,
    PickedOffCaughtStealing,
    Balk,
    DefensiveIndifference,
    OtherAdvance,
    WildPitch,
    PassedBall,
    /// The basic play did not match the grammar.
    Unrecognized,
}

impl From<&BasicPlay> for PlayOutcome {
    fn from(play: &BasicPlay) -> Self {
        match play {
            BasicPlay::FieldingOut(_) => Self::FieldingOut,
            BasicPlay::Hit { hit_type, .. } => match hit_type {
                HitType::Single => Self::Single,
                HitType::Double => Self::Double,
                HitType::GroundRuleDouble => Self::GroundRuleDouble,
                HitType::Triple => Self::Triple,
                HitType::HomeRun => Self::HomeRun,
            },
            BasicPlay::ReachedOnError(_) => Self::ReachedOnError,
            BasicPlay::FieldersChoice(_) => Self::FieldersChoice,
            BasicPlay::ErrorOnFoul(_) => Self::ErrorOnFoul,
            BasicPlay::Walk {
                intentional: true, ..
            } => Self::IntentionalWalk,
            BasicPlay::Walk { .. } => Self::Walk,
            BasicPlay::StrikeOut { .. } => Self::StrikeOut,
            BasicPlay::HitByPitch => Self::HitByPitch,
            BasicPlay::Interference => Self::Interference,
            BasicPlay::NoPlay => Self::NoPlay,
            BasicPlay::Baserunning(plays) => {
                plays
                    .first()
                    .map_or(Self::Unrecognized, |p| match p.play_type {
                        BaserunningPlayType::StolenBase => Self::StolenBase,
                        BaserunningPlayType::CaughtStealing => Self::CaughtStealing,
                        BaserunningPlayType::PickedOff => Self::PickedOff,
                        BaserunningPlayType::PickedOffCaughtStealing => {
                            Self::PickedOffCaughtStealing
                        }
                        BaserunningPlayType::Balk => Self::Balk,
                        BaserunningPlayType::DefensiveIndifference => Self::DefensiveIndifference,
                        BaserunningPlayType::OtherAdvance => Self::OtherAdvance,
                        BaserunningPlayType::WildPitch => Self::WildPitch,
                        BaserunningPlayType::PassedBall => Self::PassedBall,
                    })
            }
        }
    }
}

impl PlayOutcome {
    pub const fn is_hit(self) -> bool {
        matches!(
            self,
            Self::Single | Self::Double | Self::GroundRuleDouble | Self::Triple | Self::HomeRun
        )
    }

    pub const fn is_walk(self) -> bool {
        matches!(self, Self::Walk | Self::IntentionalWalk)
    }

    pub const fn is_strikeout(self) -> bool {
        matches!(self, Self::StrikeOut)
    }

    /// No plate appearance and no at-bat is charged for these.
    pub const fn is_baserunning_event(self) -> bool {
        matches!(
            self,
            Self::Balk
                | Self::CaughtStealing
                | Self::DefensiveIndifference
                | Self::OtherAdvance
                | Self::PassedBall
                | Self::WildPitch
                | Self::PickedOff
                | Self::PickedOffCaughtStealing
                | Self::StolenBase
        )
    }
}

/// Facts read straight off the notation, independent of the outcome.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Serialize)]
pub struct PlayFlags {
    pub sacrifice_fly: bool,
    pub sacrifice_bunt: bool,
    pub double_play: bool,
    pub triple_play: bool,
    pub error_involved: bool,
}

impl PlayFlags {
    fn from_event(event: &RawEvent) -> Self {
        let has_modifier = |prefix: &str| event.modifiers.iter().any(|m| m.starts_with(prefix));
        let contact_types = || event.contact_descriptions().filter_map(|cd| cd.contact_type);
        let double_play = event.parsed_modifiers.iter().any(|m| {
            matches!(
                m,
                PlayModifier::UnspecifiedDoublePlay | PlayModifier::FlyBallDoublePlay
            )
        }) || contact_types().any(|ct| {
            matches!(
                ct,
                ContactType::GroundBallDoublePlay
                    | ContactType::LinedIntoDoublePlay
                    | ContactType::BuntGroundIntoDoublePlay
                    | ContactType::BuntPoppedIntoDoublePlay
            )
        });
        let triple_play = event
            .parsed_modifiers
            .iter()
            .any(|m| matches!(m, PlayModifier::UnspecifiedTriplePlay))
            || contact_types().any(|ct| {
                matches!(
                    ct,
                    ContactType::GroundBallTriplePlay | ContactType::LinedIntoTriplePlay
                )
            });
        let error_involved = std::iter::once(event.basic_play.as_str())
            .chain(event.modifiers.iter().map(String::as_str))
            .chain(event.advances.iter().flat_map(|a| {
                a.parameters
                    .iter()
                    .flat_map(|p| std::iter::once(&p.parameter).chain(&p.modifiers))
                    .map(String::as_str)
            }))
            .any(|s| first_error_digit(s).is_some());
        Self {
            sacrifice_fly: has_modifier("SF"),
            sacrifice_bunt: has_modifier("SH"),
            double_play,
            triple_play,
            error_involved,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct Classification {
    pub play_code: String,
    pub outcome: PlayOutcome,
    pub flags: PlayFlags,
}

impl Classification {
    pub fn new(event: &RawEvent) -> Self {
        Self {
            play_code: play_code(&event.basic_play),
            outcome: event
                .parsed_basic_play
                .as_ref()
                .map_or(PlayOutcome::Unrecognized, PlayOutcome::from),
            flags: PlayFlags::from_event(event),
        }
    }

    /// Codes like `H` and `HR` are kept apart in the play code but share an outcome.
    pub fn is_home_run(&self) -> bool {
        self.outcome == PlayOutcome::HomeRun
    }

    pub fn plate_appearance(&self) -> bool {
        !self.outcome.is_baserunning_event() && self.outcome != PlayOutcome::NoPlay
    }

    pub fn at_bat(&self) -> bool {
        self.plate_appearance()
            && !self.outcome.is_walk()
            && !matches!(
                self.outcome,
                PlayOutcome::HitByPitch | PlayOutcome::Interference
            )
            && !self.flags.sacrifice_fly
            && !self.flags.sacrifice_bunt
    }
}

/// Numeric fielding sequences reduce to their leading digits, everything else
/// to its leading letters. That covers `K+WP` -> `K`, `W+PB` -> `W` and
/// `POCS2(1E3)` -> `POCS` as well.
pub fn play_code(basic_play: &str) -> String {
    let is_digit = basic_play.starts_with(|c: char| c.is_ascii_digit());
    let code: String = basic_play
        .chars()
        .take_while(|c| {
            if is_digit {
                c.is_ascii_digit()
            } else {
                c.is_ascii_uppercase()
            }
        })
        .collect();
    if code.is_empty() {
        basic_play.to_string()
    } else {
        code
    }
}
