use std::convert::TryFrom;

use arrayvec::ArrayString;
use fixed_map::Key;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::{Display, EnumString};

use crate::util::digit_vec;

/// Retrosheet player ids are eight characters, but hand-entered game records
/// occasionally use longer keys.
pub type Player = ArrayString<16>;
pub type Batter = Player;
pub type Pitcher = Player;
pub type Fielder = Player;

pub type Inning = u8;

#[derive(
    Debug,
    Eq,
    PartialEq,
    TryFromPrimitive,
    IntoPrimitive,
    Copy,
    Clone,
    Hash,
    Ord,
    PartialOrd,
    Key,
    Serialize_repr,
    Deserialize_repr,
)]
#[repr(u8)]
pub enum LineupPosition {
    PitcherWithDh = 0,
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
}

impl LineupPosition {
    /// The slot that bats after this one. The non-batting pitcher never comes up.
    pub fn next(self) -> Option<Self> {
        let as_u8: u8 = self.into();
        match self {
            Self::PitcherWithDh => None,
            Self::Ninth => Some(Self::First),
            _ => Self::try_from(as_u8 + 1).ok(),
        }
    }

    pub const fn batting_slots() -> [Self; 9] {
        [
            Self::First,
            Self::Second,
            Self::Third,
            Self::Fourth,
            Self::Fifth,
            Self::Sixth,
            Self::Seventh,
            Self::Eighth,
            Self::Ninth,
        ]
    }
}

#[derive(
    Debug,
    Eq,
    PartialEq,
    TryFromPrimitive,
    IntoPrimitive,
    Copy,
    Clone,
    Hash,
    Ord,
    PartialOrd,
    Key,
    Serialize_repr,
    Deserialize_repr,
)]
#[repr(u8)]
pub enum FieldingPosition {
    Pitcher = 1,
    Catcher,
    FirstBaseman,
    SecondBaseman,
    ThirdBaseman,
    Shortstop,
    LeftFielder,
    CenterFielder,
    RightFielder,
    DesignatedHitter,
    PinchHitter,
    PinchRunner,
    ExtraHitter,
    CourtesyRunner,
}

impl FieldingPosition {
    /// Digits outside 1-9 (unknown fielders are sometimes keyed as 0) are skipped.
    pub fn fielding_vec(int_str: &str) -> Vec<Self> {
        digit_vec(int_str)
            .into_iter()
            .filter_map(Self::from_digit)
            .collect()
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1..=9 => Self::try_from(digit).ok(),
            _ => None,
        }
    }

    /// Positions that occupy a slot in the defensive alignment.
    pub const fn is_true_position(self) -> bool {
        (self as u8) <= (Self::DesignatedHitter as u8)
    }
}

#[derive(
    Debug, Eq, PartialEq, EnumString, Display, Hash, Copy, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[strum(serialize = "away")]
    Away,
    #[strum(serialize = "home")]
    Home,
}

impl Side {
    pub const fn flip(self) -> Self {
        match self {
            Self::Away => Self::Home,
            Self::Home => Self::Away,
        }
    }
}

#[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct Matchup<T> {
    pub away: T,
    pub home: T,
}

impl<T> Matchup<T> {
    pub const fn new(away: T, home: T) -> Self {
        Self { away, home }
    }

    pub const fn get(&self, side: Side) -> &T {
        match side {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Away => &mut self.away,
            Side::Home => &mut self.home,
        }
    }
}

#[derive(
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    EnumString,
    Display,
    Copy,
    Clone,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Base {
    #[strum(serialize = "1")]
    #[serde(rename = "1")]
    First = 1,
    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    Second,
    #[strum(serialize = "3")]
    #[serde(rename = "3")]
    Third,
    #[strum(serialize = "H")]
    #[serde(rename = "H")]
    Home,
}

#[derive(
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    EnumString,
    Display,
    Copy,
    Clone,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum BaseRunner {
    #[strum(serialize = "B")]
    #[serde(rename = "B")]
    Batter,
    #[strum(serialize = "1")]
    #[serde(rename = "1")]
    First,
    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    Second,
    #[strum(serialize = "3")]
    #[serde(rename = "3")]
    Third,
}

impl BaseRunner {
    /// The runner who would be advancing to the given base, i.e. the one a base behind it.
    pub fn from_target_base(base: Base) -> Self {
        match base {
            Base::First => Self::Batter,
            Base::Second => Self::First,
            Base::Third => Self::Second,
            Base::Home => Self::Third,
        }
    }

    /// The runner standing on the given base, if it is a base a runner can stand on.
    pub const fn from_current_base(base: Base) -> Option<Self> {
        match base {
            Base::First => Some(Self::First),
            Base::Second => Some(Self::Second),
            Base::Third => Some(Self::Third),
            Base::Home => None,
        }
    }

    /// Index into the three after-play base slots; the batter has none.
    pub const fn base_index(self) -> Option<usize> {
        match self {
            Self::Batter => None,
            Self::First => Some(0),
            Self::Second => Some(1),
            Self::Third => Some(2),
        }
    }
}

impl Base {
    pub const fn base_index(self) -> Option<usize> {
        match self {
            Self::First => Some(0),
            Self::Second => Some(1),
            Self::Third => Some(2),
            Self::Home => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn lineup_position_wraps_after_ninth() {
        assert_eq!(LineupPosition::Ninth.next(), Some(LineupPosition::First));
        assert_eq!(LineupPosition::Fourth.next(), Some(LineupPosition::Fifth));
        assert_eq!(LineupPosition::PitcherWithDh.next(), None);
    }

    #[test]
    fn fielding_vec_skips_unknown_digits() {
        assert_eq!(
            FieldingPosition::fielding_vec("6043"),
            vec![
                FieldingPosition::Shortstop,
                FieldingPosition::SecondBaseman,
                FieldingPosition::FirstBaseman
            ]
        );
        assert!(FieldingPosition::DesignatedHitter.is_true_position());
        assert!(!FieldingPosition::PinchRunner.is_true_position());
    }

    #[test]
    fn runner_for_target_base() {
        assert_eq!(BaseRunner::from_target_base(Base::Home), BaseRunner::Third);
        assert_eq!(BaseRunner::from_str("B").unwrap(), BaseRunner::Batter);
        assert_eq!(Base::from_str("H").unwrap(), Base::Home);
        assert_eq!(Side::Away.flip(), Side::Home);
    }
}
