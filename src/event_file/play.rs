use std::convert::TryFrom;
use std::str::FromStr;

use const_format::concatcp;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::event_file::advance::{parse_parameter_groups, Advance, AdvanceParameter};
use crate::event_file::error::ParseError;
use crate::event_file::traits::{Base, BaseRunner, FieldingPosition};
use crate::util::{split_once_top_level, split_top_level};

const CONTACT_TYPE: &str = r"(?P<contact>BGDP|BPDP|BP|BG|BL|GDP|GTP|G|LDP|LTP|L|F|P)?";
const HIT_LOCATION: &str = r"(?P<location>[1-9]{1,2}(?:LSF|LDF|DF|LF|XD|LS|LD|MD|MS|F|D|L|S|M)?)?";
const HIT_STRENGTH: &str = r"(?P<strength>[+\-])?";
const BATTED_BALL: &str = concatcp!("^", CONTACT_TYPE, HIT_LOCATION, HIT_STRENGTH, "$");

lazy_static! {
    static ref STRIP_CHARS_REGEX: Regex = Regex::new(r"[#!\t\r\n ]").unwrap();
    static ref BATTED_BALL_REGEX: Regex = Regex::new(BATTED_BALL).unwrap();
}

/// Minimal left-to-right reader used by the basic-play grammar.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    const fn new(value: &'a str) -> Self {
        Self { rest: value }
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if let Some(rest) = self.rest.strip_prefix(prefix) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn peek(&self, prefix: &str) -> bool {
        self.rest.starts_with(prefix)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|c| !predicate(c)).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn fielders(&mut self) -> &'a str {
        self.take_while(|c| matches!(c, '1'..='9'))
    }

    fn fielder(&mut self) -> Option<FieldingPosition> {
        let digit = self.rest.chars().next().and_then(|c| c.to_digit(10))?;
        let position = FieldingPosition::from_digit(u8::try_from(digit).ok()?)?;
        self.rest = &self.rest[1..];
        Some(position)
    }

    fn one_of<T: FromStr>(&mut self, len: usize) -> Option<T> {
        let token = self.rest.get(..len)?;
        let parsed = T::from_str(token).ok()?;
        self.rest = &self.rest[len..];
        Some(parsed)
    }

    /// Everything up to the matching `)` of a run of parentheticals.
    fn parentheticals(&mut self) -> &'a str {
        let mut depth = 0_usize;
        let mut end = 0;
        for (i, c) in self.rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' if depth > 0 => {
                    depth -= 1;
                    end = i + 1;
                }
                _ if depth == 0 => break,
                _ => {}
            }
        }
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    const fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

#[derive(Debug, EnumString, Display, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum HitType {
    #[strum(serialize = "S")]
    Single,
    #[strum(serialize = "DGR")]
    GroundRuleDouble,
    #[strum(serialize = "D")]
    Double,
    #[strum(serialize = "T")]
    Triple,
    #[strum(serialize = "HR", serialize = "H")]
    HomeRun,
}

#[derive(Debug, EnumString, Display, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum BaserunningPlayType {
    #[strum(serialize = "POCS")]
    PickedOffCaughtStealing,
    #[strum(serialize = "PO")]
    PickedOff,
    #[strum(serialize = "SB")]
    StolenBase,
    #[strum(serialize = "CS")]
    CaughtStealing,
    #[strum(serialize = "DI")]
    DefensiveIndifference,
    #[strum(serialize = "BK")]
    Balk,
    #[strum(serialize = "OA")]
    OtherAdvance,
    #[strum(serialize = "WP")]
    WildPitch,
    #[strum(serialize = "PB")]
    PassedBall,
}

impl BaserunningPlayType {
    /// Longest codes first so `POCS` is not read as `PO`.
    const CODES: [&'static str; 9] = ["POCS", "PO", "SB", "CS", "DI", "BK", "OA", "WP", "PB"];

    const fn attempts_base(self) -> bool {
        matches!(
            self,
            Self::PickedOff | Self::PickedOffCaughtStealing | Self::StolenBase | Self::CaughtStealing
        )
    }

    const fn takes_fielding(self) -> bool {
        matches!(
            self,
            Self::PickedOff | Self::PickedOffCaughtStealing | Self::CaughtStealing
        )
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct BaserunningPlay {
    pub play_type: BaserunningPlayType,
    pub base: Option<Base>,
    pub parameters: Vec<AdvanceParameter>,
}

impl BaserunningPlay {
    fn parse(cursor: &mut Cursor) -> Option<Self> {
        let code = BaserunningPlayType::CODES
            .iter()
            .find(|code| cursor.peek(code))?;
        let play_type = BaserunningPlayType::from_str(code).ok()?;
        cursor.eat(code);
        if !play_type.attempts_base() {
            return Some(Self {
                play_type,
                base: None,
                parameters: vec![],
            });
        }
        let base: Base = cursor.one_of(1)?;
        match (play_type, base) {
            (BaserunningPlayType::PickedOff, Base::Home)
            | (BaserunningPlayType::StolenBase
            | BaserunningPlayType::CaughtStealing
            | BaserunningPlayType::PickedOffCaughtStealing, Base::First) => return None,
            _ => {}
        }
        let parameters = if play_type.takes_fielding() {
            parse_parameter_groups(cursor.parentheticals())?
        } else {
            vec![]
        };
        Some(Self {
            play_type,
            base: Some(base),
            parameters,
        })
    }

    /// The runner the play is about. Pickoffs name the occupied base, steals
    /// and caught-stealing name the base being attacked.
    pub fn runner(&self) -> Option<BaseRunner> {
        let base = self.base?;
        match self.play_type {
            BaserunningPlayType::PickedOff => BaseRunner::from_current_base(base),
            _ => Some(BaseRunner::from_target_base(base)),
        }
    }

    pub fn fielding(&self) -> Option<&AdvanceParameter> {
        self.parameters.iter().find(|p| p.is_fielding())
    }

    pub fn has_error(&self) -> bool {
        self.fielding().map_or(false, AdvanceParameter::has_error)
    }

    pub const fn is_out_attempt(&self) -> bool {
        self.play_type.takes_fielding()
    }
}

/// What follows the `+` of a strikeout or walk.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum PlusPlay {
    Baserunning(Vec<BaserunningPlay>),
    Error(FieldingPosition),
}

/// One `<fielders>(<runner>)` group of a fielding out. An untagged group is the batter.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct OutGroup {
    pub fielders: String,
    pub runner: Option<BaseRunner>,
}

impl OutGroup {
    pub fn baserunner(&self) -> BaseRunner {
        self.runner.unwrap_or(BaseRunner::Batter)
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum BasicPlay {
    FieldingOut(Vec<OutGroup>),
    Hit {
        hit_type: HitType,
        fielders: Vec<FieldingPosition>,
    },
    ReachedOnError(FieldingPosition),
    FieldersChoice(Option<FieldingPosition>),
    ErrorOnFoul(FieldingPosition),
    Walk {
        intentional: bool,
        plus: Option<PlusPlay>,
    },
    StrikeOut {
        fielders: Vec<FieldingPosition>,
        plus: Option<PlusPlay>,
    },
    HitByPitch,
    Interference,
    NoPlay,
    Baserunning(Vec<BaserunningPlay>),
}

impl BasicPlay {
    fn parse_out_groups(cursor: &mut Cursor) -> Option<Vec<OutGroup>> {
        let mut groups = vec![];
        while !cursor.is_empty() {
            let fielders = cursor.fielders();
            if fielders.is_empty() {
                return None;
            }
            let runner = if cursor.eat("(") {
                let runner: BaseRunner = cursor.one_of(1)?;
                if !cursor.eat(")") {
                    return None;
                }
                Some(runner)
            } else {
                cursor.eat("-");
                None
            };
            groups.push(OutGroup {
                fielders: fielders.to_string(),
                runner,
            });
        }
        Some(groups)
    }

    fn parse_baserunning_chain(cursor: &mut Cursor) -> Option<Vec<BaserunningPlay>> {
        let mut plays = vec![BaserunningPlay::parse(cursor)?];
        while cursor.eat(";") {
            plays.push(BaserunningPlay::parse(cursor)?);
        }
        Some(plays)
    }

    fn parse_plus(cursor: &mut Cursor) -> Option<Option<PlusPlay>> {
        if !cursor.eat("+") {
            return Some(None);
        }
        if cursor.eat("E") {
            return cursor.fielder().map(|f| Some(PlusPlay::Error(f)));
        }
        Self::parse_baserunning_chain(cursor).map(|plays| Some(PlusPlay::Baserunning(plays)))
    }

    fn parse_cursor(cursor: &mut Cursor) -> Option<Self> {
        let play = if cursor.peek("FLE") {
            cursor.eat("FLE");
            Self::ErrorOnFoul(cursor.fielder()?)
        } else if cursor.eat("FC") {
            Self::FieldersChoice(cursor.fielder())
        } else if cursor.eat("E") {
            Self::ReachedOnError(cursor.fielder()?)
        } else if cursor.eat("HP") {
            Self::HitByPitch
        } else if cursor.eat("NP") {
            Self::NoPlay
        } else if BaserunningPlayType::CODES.iter().any(|code| cursor.peek(code)) {
            // Ahead of walks and hits: `WP`, `SB` and `DI` share their first letter
            Self::Baserunning(Self::parse_baserunning_chain(cursor)?)
        } else if cursor.eat("IW") || cursor.eat("I") {
            Self::Walk {
                intentional: true,
                plus: Self::parse_plus(cursor)?,
            }
        } else if cursor.eat("W") {
            Self::Walk {
                intentional: false,
                plus: Self::parse_plus(cursor)?,
            }
        } else if cursor.eat("K") {
            Self::StrikeOut {
                fielders: FieldingPosition::fielding_vec(cursor.fielders()),
                plus: Self::parse_plus(cursor)?,
            }
        } else if cursor.eat("C") {
            Self::Interference
        } else if cursor.rest.starts_with(|c: char| c.is_ascii_digit()) {
            Self::FieldingOut(Self::parse_out_groups(cursor)?)
        } else {
            let hit_type = ["DGR", "HR", "S", "D", "T", "H"]
                .iter()
                .find(|code| cursor.eat(code))
                .and_then(|code| HitType::from_str(code).ok())?;
            Self::Hit {
                hit_type,
                fielders: FieldingPosition::fielding_vec(cursor.fielders()),
            }
        };
        Some(play)
    }

    pub fn baserunning_plays(&self) -> &[BaserunningPlay] {
        match self {
            Self::Baserunning(plays)
            | Self::StrikeOut {
                plus: Some(PlusPlay::Baserunning(plays)),
                ..
            }
            | Self::Walk {
                plus: Some(PlusPlay::Baserunning(plays)),
                ..
            } => plays,
            _ => &[],
        }
    }
}

impl TryFrom<&str> for BasicPlay {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut cursor = Cursor::new(value);
        match Self::parse_cursor(&mut cursor) {
            Some(play) if cursor.is_empty() => Ok(play),
            _ => Err(ParseError::BasicPlay(value.to_string())),
        }
    }
}

#[derive(Debug, Eq, PartialEq, EnumString, Copy, Clone, Serialize)]
pub enum ContactType {
    #[strum(serialize = "BP")]
    PopUpBunt,
    #[strum(serialize = "BG")]
    GroundBallBunt,
    #[strum(serialize = "BGDP")]
    BuntGroundIntoDoublePlay,
    #[strum(serialize = "BPDP")]
    BuntPoppedIntoDoublePlay,
    #[strum(serialize = "BL")]
    LineDriveBunt,
    #[strum(serialize = "F")]
    Fly,
    #[strum(serialize = "G")]
    GroundBall,
    #[strum(serialize = "GDP")]
    GroundBallDoublePlay,
    #[strum(serialize = "GTP")]
    GroundBallTriplePlay,
    #[strum(serialize = "L")]
    LineDrive,
    #[strum(serialize = "LDP")]
    LinedIntoDoublePlay,
    #[strum(serialize = "LTP")]
    LinedIntoTriplePlay,
    #[strum(serialize = "P")]
    PopFly,
}

#[derive(Debug, Eq, PartialEq, EnumString, Copy, Clone, Serialize)]
pub enum HitStrength {
    #[strum(serialize = "+")]
    Hard,
    #[strum(serialize = "-")]
    Soft,
}

/// Batted-ball trajectory, location and strength from a single modifier such as `G6+` or `P4MS`.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ContactDescription {
    pub contact_type: Option<ContactType>,
    pub location: Option<String>,
    pub strength: Option<HitStrength>,
}

impl TryFrom<&str> for ContactDescription {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let captures = BATTED_BALL_REGEX
            .captures(value)
            .ok_or_else(|| ParseError::Modifier(value.to_string()))?;
        let as_str = |name: &str| captures.name(name).map(|m| m.as_str());
        Ok(Self {
            contact_type: as_str("contact").and_then(|s| ContactType::from_str(s).ok()),
            location: as_str("location").map(ToString::to_string),
            strength: as_str("strength").and_then(|s| HitStrength::from_str(s).ok()),
        })
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum PlayModifier {
    ContactDescription(ContactDescription),
    AppealPlay,
    BatterInterference,
    BattingOutOfTurn,
    RunnerHitByBattedBall,
    CalledThirdStrike,
    CourtesyBatter,
    CourtesyFielder,
    CourtesyRunner,
    UnspecifiedDoublePlay,
    ErrorOn(FieldingPosition),
    FlyBallDoublePlay,
    FanInterference,
    Foul,
    FoulBunt,
    ForceOut,
    InfieldFlyRule,
    Interference,
    InsideTheParkHomeRun,
    ManagerChallengeOfCallOnField,
    NoDoublePlayCredited,
    Obstruction,
    RunnerOutPassingAnotherRunner,
    RelayToFielderWithNoOutMade(Vec<FieldingPosition>),
    RunnerInterference,
    SacrificeFly,
    SacrificeHit,
    ThrowToBase(Option<Base>),
    UnspecifiedTriplePlay,
    UmpireInterference,
    UmpireReviewOfCallOnField,
}

impl TryFrom<&str> for PlayModifier {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let simple_match = match value {
            "AP" => Some(Self::AppealPlay),
            "BINT" => Some(Self::BatterInterference),
            "BOOT" => Some(Self::BattingOutOfTurn),
            "BR" => Some(Self::RunnerHitByBattedBall),
            "BF" => Some(Self::FoulBunt),
            "C" => Some(Self::CalledThirdStrike),
            "COUB" => Some(Self::CourtesyBatter),
            "COUF" => Some(Self::CourtesyFielder),
            "COUR" => Some(Self::CourtesyRunner),
            "DP" => Some(Self::UnspecifiedDoublePlay),
            "FDP" => Some(Self::FlyBallDoublePlay),
            "FINT" => Some(Self::FanInterference),
            "FL" => Some(Self::Foul),
            "FO" => Some(Self::ForceOut),
            "IF" => Some(Self::InfieldFlyRule),
            "INT" => Some(Self::Interference),
            "IPHR" => Some(Self::InsideTheParkHomeRun),
            "MREV" => Some(Self::ManagerChallengeOfCallOnField),
            "NDP" => Some(Self::NoDoublePlayCredited),
            "OBS" => Some(Self::Obstruction),
            "PASS" => Some(Self::RunnerOutPassingAnotherRunner),
            "RINT" => Some(Self::RunnerInterference),
            "SF" => Some(Self::SacrificeFly),
            "SH" => Some(Self::SacrificeHit),
            "TH" => Some(Self::ThrowToBase(None)),
            "TP" => Some(Self::UnspecifiedTriplePlay),
            "UINT" => Some(Self::UmpireInterference),
            "UREV" => Some(Self::UmpireReviewOfCallOnField),
            _ => None,
        };
        if let Some(modifier) = simple_match {
            return Ok(modifier);
        }
        let mut cursor = Cursor::new(value);
        let prefixed = if cursor.eat("E") {
            cursor.fielder().map(Self::ErrorOn)
        } else if cursor.eat("TH") {
            cursor.one_of::<Base>(1).map(|b| Self::ThrowToBase(Some(b)))
        } else if cursor.eat("R") {
            let relay = FieldingPosition::fielding_vec(cursor.fielders());
            (!relay.is_empty()).then_some(Self::RelayToFielderWithNoOutMade(relay))
        } else {
            None
        };
        match prefixed {
            Some(modifier) if cursor.is_empty() => Ok(modifier),
            _ => ContactDescription::try_from(value).map(Self::ContactDescription),
        }
    }
}

/// A play string split into its three parts, with each part checked against its grammar.
/// Grammar failures are kept on the event rather than returned.
#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct RawEvent {
    pub raw_text: String,
    pub basic_play: String,
    pub modifiers: Vec<String>,
    pub advances: Vec<Advance>,
    /// `#` in the original text
    pub uncertain: bool,
    /// `!` in the original text
    pub exceptional: bool,
    #[serde(skip)]
    pub parsed_basic_play: Option<BasicPlay>,
    #[serde(skip)]
    pub parsed_modifiers: Vec<PlayModifier>,
    pub basic_play_error: Option<ParseError>,
    pub modifier_errors: Vec<ParseError>,
    pub advance_errors: Vec<ParseError>,
}

impl RawEvent {
    /// Returns `None` when there is no play text at all.
    pub fn tokenize(text: &str) -> Option<Self> {
        let (uncertain, exceptional) = (text.contains('#'), text.contains('!'));
        let value = STRIP_CHARS_REGEX.replace_all(text, "");
        if value.is_empty() {
            return None;
        }

        let (basic_play_and_modifiers, advances_str) = split_once_top_level(&value, '.');
        let (basic_play, modifiers_str) = split_once_top_level(basic_play_and_modifiers, '/');
        let modifiers: Vec<String> = modifiers_str
            .map(|m| split_top_level(m, '/'))
            .unwrap_or_default()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let (parsed_basic_play, basic_play_error) = match BasicPlay::try_from(basic_play) {
            Ok(bp) => (Some(bp), None),
            Err(e) => (None, Some(e)),
        };

        let mut parsed_modifiers = vec![];
        let mut modifier_errors = vec![];
        for modifier in &modifiers {
            match PlayModifier::try_from(modifier.as_str()) {
                Ok(m) => parsed_modifiers.push(m),
                Err(e) => modifier_errors.push(e),
            }
        }

        let mut advances = vec![];
        let mut advance_errors = vec![];
        for token in advances_str.map(|a| split_top_level(a, ';')).unwrap_or_default() {
            match Advance::try_from(token) {
                Ok(a) => advances.push(a),
                Err(e) => advance_errors.push(e),
            }
        }

        Some(Self {
            raw_text: text.to_string(),
            basic_play: basic_play.to_string(),
            modifiers,
            advances,
            uncertain,
            exceptional,
            parsed_basic_play,
            parsed_modifiers,
            basic_play_error,
            modifier_errors,
            advance_errors,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.basic_play_error.is_none()
            && self.modifier_errors.is_empty()
            && self.advance_errors.is_empty()
    }

    pub fn parse_errors(&self) -> impl Iterator<Item = &ParseError> {
        self.basic_play_error
            .iter()
            .chain(&self.modifier_errors)
            .chain(&self.advance_errors)
    }

    pub fn advance_from(&self, baserunner: BaseRunner) -> Option<&Advance> {
        self.advances
            .iter()
            .find(|a| a.starting_base == baserunner)
    }

    pub fn contact_descriptions(&self) -> impl Iterator<Item = &ContactDescription> {
        self.parsed_modifiers.iter().filter_map(|m| match m {
            PlayModifier::ContactDescription(cd) => Some(cd),
            _ => None,
        })
    }
}
