use serde::Serialize;

use crate::event_file::error::ParseError;
use crate::event_file::play::{BasicPlay, ContactType, HitStrength, RawEvent};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum Trajectory {
    GroundBall,
    LineDrive,
    FlyBall,
    PopUp,
}

impl ContactType {
    pub const fn trajectory(self) -> Trajectory {
        match self {
            Self::GroundBall
            | Self::GroundBallDoublePlay
            | Self::GroundBallTriplePlay
            | Self::GroundBallBunt
            | Self::BuntGroundIntoDoublePlay => Trajectory::GroundBall,
            Self::LineDrive
            | Self::LinedIntoDoublePlay
            | Self::LinedIntoTriplePlay
            | Self::LineDriveBunt => Trajectory::LineDrive,
            Self::Fly => Trajectory::FlyBall,
            Self::PopFly | Self::PopUpBunt | Self::BuntPoppedIntoDoublePlay => Trajectory::PopUp,
        }
    }

    pub const fn is_bunt(self) -> bool {
        matches!(
            self,
            Self::PopUpBunt
                | Self::GroundBallBunt
                | Self::BuntGroundIntoDoublePlay
                | Self::BuntPoppedIntoDoublePlay
                | Self::LineDriveBunt
        )
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize)]
pub struct BallInPlay {
    pub trajectory: Option<Trajectory>,
    pub bunt: bool,
    /// Fielder zone plus depth/angle suffix, e.g. `78XD` or `4MS`.
    pub location: Option<String>,
    pub strength: Option<HitStrength>,
}

impl BallInPlay {
    pub fn is_ground_ball(&self) -> bool {
        self.trajectory == Some(Trajectory::GroundBall)
    }

    pub fn is_line_drive(&self) -> bool {
        self.trajectory == Some(Trajectory::LineDrive)
    }

    pub fn is_fly_ball(&self) -> bool {
        self.trajectory == Some(Trajectory::FlyBall)
    }

    pub fn is_popup(&self) -> bool {
        self.trajectory == Some(Trajectory::PopUp)
    }

    /// Merges every batted-ball modifier on the play. A trajectory or location may
    /// only be given once. Bare fielding outs without a trajectory are read as a fly
    /// ball when unassisted and a ground ball otherwise.
    pub fn from_event(event: &RawEvent) -> Result<Option<Self>, ParseError> {
        let mut ball_in_play: Option<Self> = None;
        for description in event.contact_descriptions() {
            let bip = ball_in_play.get_or_insert_with(Self::default);
            if let Some(contact_type) = description.contact_type {
                if bip.trajectory.is_some() {
                    return Err(ParseError::DuplicateTrajectory(event.raw_text.clone()));
                }
                bip.trajectory = Some(contact_type.trajectory());
                bip.bunt |= contact_type.is_bunt();
            }
            if let Some(location) = &description.location {
                if bip.location.is_some() {
                    return Err(ParseError::DuplicateLocation(event.raw_text.clone()));
                }
                bip.location = Some(location.clone());
            }
            if description.strength.is_some() {
                bip.strength = description.strength;
            }
        }

        if let Some(BasicPlay::FieldingOut(groups)) = &event.parsed_basic_play {
            let bip = ball_in_play.get_or_insert_with(Self::default);
            if bip.trajectory.is_none() {
                let assisted = groups.len() > 1
                    || groups.first().map_or(false, |g| g.fielders.len() > 1);
                bip.trajectory = Some(if assisted {
                    Trajectory::GroundBall
                } else {
                    Trajectory::FlyBall
                });
            }
        }
        Ok(ball_in_play)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bip(s: &str) -> Option<BallInPlay> {
        BallInPlay::from_event(&RawEvent::tokenize(s).unwrap()).unwrap()
    }

    #[test]
    fn no_modifiers_no_ball_in_play() {
        assert_eq!(bip("S7"), None);
        assert_eq!(bip("K"), None);
    }

    #[test]
    fn merges_trajectory_and_location() {
        let b = bip("HR/8/L.3-H").unwrap();
        assert!(b.is_line_drive());
        assert_eq!(b.location.as_deref(), Some("8"));

        let b = bip("S4/P4MS").unwrap();
        assert!(b.is_popup());
        assert_eq!(b.location.as_deref(), Some("4MS"));

        let b = bip("7/L+/DP").unwrap();
        assert!(b.is_line_drive());
        assert_eq!(b.strength, Some(HitStrength::Hard));
    }

    #[test]
    fn bunts() {
        let b = bip("53/BG-/SH").unwrap();
        assert!(b.bunt);
        assert!(b.is_ground_ball());
        assert_eq!(b.location, None);
        assert_eq!(b.strength, Some(HitStrength::Soft));

        assert!(bip("2/BP").unwrap().is_popup());
    }

    #[test]
    fn double_play_types_map_to_trajectory() {
        assert!(bip("64(1)3/GDP").unwrap().is_ground_ball());
        assert!(bip("8(B)84(2)/LDP").unwrap().is_line_drive());
    }

    #[test]
    fn inferred_from_bare_fielding_out() {
        assert!(bip("63").unwrap().is_ground_ball());
        assert!(bip("3").unwrap().is_fly_ball());
        assert!(bip("7").unwrap().is_fly_ball());
        assert!(bip("3/G").unwrap().is_ground_ball());
        let b = bip("3/BG").unwrap();
        assert!(b.is_ground_ball());
        assert!(b.bunt);
    }

    #[test]
    fn duplicates_are_errors() {
        let event = RawEvent::tokenize("7/F7/G8").unwrap();
        assert_eq!(
            BallInPlay::from_event(&event),
            Err(ParseError::DuplicateTrajectory("7/F7/G8".into()))
        );
        let event = RawEvent::tokenize("S/78/9").unwrap();
        assert_eq!(
            BallInPlay::from_event(&event),
            Err(ParseError::DuplicateLocation("S/78/9".into()))
        );
    }
}
