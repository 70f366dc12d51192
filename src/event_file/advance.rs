use std::convert::TryFrom;
use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::event_file::error::ParseError;
use crate::event_file::traits::{Base, BaseRunner};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvanceType {
    #[strum(serialize = "advance")]
    Advance,
    #[strum(serialize = "out")]
    Out,
    /// Marked `X` but the fielding chain contains an error, so the runner is safe.
    #[strum(serialize = "safe-on-error")]
    SafeOnError,
}

#[derive(Debug, Eq, PartialEq, EnumString, Copy, Clone)]
pub enum AdvanceMarker {
    #[strum(serialize = "UR")]
    UnearnedRun,
    #[strum(serialize = "TUR")]
    TeamUnearnedRun,
    #[strum(serialize = "NR", serialize = "NORBI")]
    NoRbi,
    #[strum(serialize = "RBI")]
    Rbi,
    #[strum(serialize = "WP")]
    WildPitch,
    #[strum(serialize = "PB")]
    PassedBall,
}

/// Notes that may trail a fielding chain inside a parenthetical, e.g. the `TH` in `(E2/TH)`.
const FIELDING_NOTES: [&str; 7] = ["TH", "TH1", "TH2", "TH3", "THH", "INT", "RINT"];

/// One parenthetical group, split on `/` into the parameter and its modifiers.
#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct AdvanceParameter {
    pub parameter: String,
    pub modifiers: Vec<String>,
}

impl AdvanceParameter {
    /// Parses the inside of a parenthetical. Accepts either a single marker
    /// (`UR`, `NR`, ...) or a fielding chain of digits and `E` optionally followed
    /// by a throw/interference note.
    pub fn parse_group(content: &str) -> Option<Self> {
        if AdvanceMarker::from_str(content).is_ok() {
            return Some(Self {
                parameter: content.to_string(),
                modifiers: vec![],
            });
        }
        let chain_end = content
            .find(|c: char| !matches!(c, '1'..='9' | 'E'))
            .unwrap_or(content.len());
        let (chain, rest) = content.split_at(chain_end);
        let note = rest.strip_prefix('/').unwrap_or(rest);
        if !note.is_empty() && !FIELDING_NOTES.contains(&note) {
            return None;
        }
        let parameter = content.split('/').next().unwrap_or_default();
        let modifiers = content
            .split('/')
            .skip(1)
            .map(ToString::to_string)
            .collect();
        // A lone `/` carries nothing
        if chain.is_empty() && note.is_empty() {
            return None;
        }
        Some(Self {
            parameter: parameter.to_string(),
            modifiers,
        })
    }

    pub fn marker(&self) -> Option<AdvanceMarker> {
        AdvanceMarker::from_str(&self.parameter).ok()
    }

    /// True for parameters carrying putout/assist/error credit, like `763` or `1E3`.
    pub fn is_fielding(&self) -> bool {
        let mut chars = self.parameter.chars();
        match chars.next() {
            Some('1'..='9') => true,
            Some('E') => chars.next().map_or(false, |c| c.is_ascii_digit()),
            _ => false,
        }
    }

    pub fn has_error(&self) -> bool {
        self.is_fielding() && self.parameter.contains('E')
    }
}

/// Consumes a run of `(...)` groups. Returns `None` if anything else is left over
/// or a group fails to parse.
pub(crate) fn parse_parameter_groups(value: &str) -> Option<Vec<AdvanceParameter>> {
    let mut rest = value;
    let mut parameters = vec![];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('(')?;
        let close = inner.find(')')?;
        let content = &inner[..close];
        if !content.is_empty() {
            parameters.push(AdvanceParameter::parse_group(content)?);
        }
        rest = &inner[close + 1..];
    }
    Some(parameters)
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct Advance {
    pub starting_base: BaseRunner,
    pub ending_base: Base,
    pub advance_type: AdvanceType,
    pub parameters: Vec<AdvanceParameter>,
}

impl Advance {
    pub fn runner_safe(&self) -> bool {
        self.advance_type != AdvanceType::Out
    }

    pub fn scored(&self) -> bool {
        self.runner_safe() && self.ending_base == Base::Home
    }

    pub fn fielding_parameter(&self) -> Option<&AdvanceParameter> {
        self.parameters.iter().find(|p| p.is_fielding())
    }

    pub fn has_marker(&self, marker: AdvanceMarker) -> bool {
        self.parameters.iter().any(|p| p.marker() == Some(marker))
    }
}

impl TryFrom<&str> for Advance {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let err = || ParseError::Advance(value.to_string());
        if !value.is_ascii() || value.len() < 3 {
            return Err(err());
        }
        let starting_base = BaseRunner::from_str(&value[0..1]).map_err(|_| err())?;
        let is_out = match &value[1..2] {
            "-" => false,
            "X" => true,
            _ => return Err(err()),
        };
        let ending_base = Base::from_str(&value[2..3]).map_err(|_| err())?;
        let parameters = parse_parameter_groups(&value[3..]).ok_or_else(err)?;

        let advance_type = if !is_out {
            AdvanceType::Advance
        } else if parameters.iter().any(AdvanceParameter::has_error) {
            AdvanceType::SafeOnError
        } else {
            AdvanceType::Out
        };
        Ok(Self {
            starting_base,
            ending_base,
            advance_type,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Advance {
        Advance::try_from(s).unwrap()
    }

    #[test]
    fn simple_advance() {
        let advance = parse("1-2");
        assert_eq!(advance.starting_base, BaseRunner::First);
        assert_eq!(advance.ending_base, Base::Second);
        assert_eq!(advance.advance_type, AdvanceType::Advance);
        assert!(advance.runner_safe());
        assert!(advance.parameters.is_empty());
    }

    #[test]
    fn out_with_fielding_and_interference_note() {
        let advance = parse("2X3(5/INT)");
        assert_eq!(advance.advance_type, AdvanceType::Out);
        assert!(!advance.runner_safe());
        assert_eq!(advance.parameters[0].parameter, "5");
        assert_eq!(advance.parameters[0].modifiers, vec!["INT"]);
    }

    #[test]
    fn error_in_chain_makes_runner_safe() {
        let advance = parse("3XH(E7/TH)");
        assert_eq!(advance.advance_type, AdvanceType::SafeOnError);
        assert!(advance.runner_safe());
        assert!(advance.scored());
        assert_eq!(advance.parameters[0].parameter, "E7");
        assert_eq!(advance.parameters[0].modifiers, vec!["TH"]);

        let advance = parse("BX2(7E4)");
        assert_eq!(advance.advance_type, AdvanceType::SafeOnError);
    }

    #[test]
    fn stacked_markers() {
        let advance = parse("2-H(E1/TH)(UR)(NR)");
        assert_eq!(advance.parameters.len(), 3);
        assert!(advance.has_marker(AdvanceMarker::UnearnedRun));
        assert!(advance.has_marker(AdvanceMarker::NoRbi));
        assert!(!advance.has_marker(AdvanceMarker::TeamUnearnedRun));
        assert!(parse("3-H(NORBI)").has_marker(AdvanceMarker::NoRbi));
        assert_eq!(parse("1-3(TH)").parameters[0].parameter, "TH");
    }

    #[test]
    fn rejects_malformed_advances() {
        for bad in ["bleh", "2XH(S7)", "2XH(.)", "2XH(./TH)", "1-5", "4-H", "1-2(E1", "1=2"] {
            assert_eq!(
                Advance::try_from(bad),
                Err(ParseError::Advance(bad.to_string())),
                "{bad}"
            );
        }
    }
}
