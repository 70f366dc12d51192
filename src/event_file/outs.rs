use itertools::Itertools;
use serde::Serialize;

use crate::event_file::advance::{Advance, AdvanceType};
use crate::event_file::lineup::Defense;
use crate::event_file::pbp::{BaseState, RunnerIdentity};
use crate::event_file::play::{BaserunningPlay, BasicPlay, RawEvent};
use crate::event_file::traits::{BaseRunner, Fielder, FieldingPosition};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub struct FielderCredit {
    pub fielder_position: FieldingPosition,
    pub fielder_id: Option<Fielder>,
}

impl FielderCredit {
    pub fn new(fielder_position: FieldingPosition, defense: &Defense) -> Self {
        Self {
            fielder_position,
            fielder_id: defense.get(fielder_position).copied(),
        }
    }
}

/// An out made or attempted on the play. Attempts voided by an error stay in
/// the list with `recorded` unset so their assists can still be credited.
#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct Out {
    pub play: String,
    pub runner_starting_base: BaseRunner,
    pub runner: Option<RunnerIdentity>,
    pub putout: Option<FielderCredit>,
    pub assists: Vec<FielderCredit>,
    pub recorded: bool,
}

/// Splits a fielding chain like `5261526` or `7E4` into putout and assists.
/// A chain with an error has no putout; assists stop at the error and a
/// fielder handling the ball more than once gets a single assist.
fn chain_credits(chain: &str, defense: &Defense) -> (Option<FielderCredit>, Vec<FielderCredit>) {
    let (before_error, has_error) = match chain.split_once('E') {
        Some((before, _)) => (before, true),
        None => (chain, false),
    };
    let fielders = FieldingPosition::fielding_vec(before_error);
    let (putout, assisting) = match fielders.split_last() {
        Some((last, rest)) if !has_error => (Some(*last), rest),
        _ => (None, fielders.as_slice()),
    };
    let assists = assisting
        .iter()
        .unique()
        .map(|f| FielderCredit::new(*f, defense))
        .collect();
    (putout.map(|f| FielderCredit::new(f, defense)), assists)
}

struct OutResolver<'a> {
    before: &'a BaseState,
    defense: &'a Defense,
    outs: Vec<Out>,
}

impl<'a> OutResolver<'a> {
    fn push(&mut self, play: &str, runner_starting_base: BaseRunner, chain: &str, recorded: bool) {
        let (putout, assists) = chain_credits(chain, self.defense);
        self.outs.push(Out {
            play: play.to_string(),
            runner_starting_base,
            runner: self.before.get_runner(runner_starting_base).copied(),
            putout,
            assists,
            recorded,
        });
    }

    /// Groups after the first may omit the pivot fielder who made the previous putout,
    /// so `54(1)3` is read as `54(1)` followed by `43`.
    fn force_outs(&mut self, basic_play: &BasicPlay) {
        let BasicPlay::FieldingOut(groups) = basic_play else {
            return;
        };
        let mut previous_putout: Option<char> = None;
        for group in groups {
            let chain = match previous_putout {
                Some(pivot) if !group.fielders.starts_with(pivot) => {
                    format!("{pivot}{}", group.fielders)
                }
                _ => group.fielders.clone(),
            };
            previous_putout = chain.chars().last();
            self.push(&chain, group.baserunner(), &chain, true);
        }
    }

    fn advance_outs(&mut self, advances: &[Advance]) {
        for advance in advances {
            if advance.advance_type == AdvanceType::Advance {
                continue;
            }
            let chain = advance
                .fielding_parameter()
                .map(|p| p.parameter.as_str())
                .unwrap_or_default();
            let play = format!(
                "{}X{}{}",
                advance.starting_base,
                advance.ending_base,
                if chain.is_empty() { String::new() } else { format!("({chain})") }
            );
            self.push(
                &play,
                advance.starting_base,
                chain,
                advance.advance_type == AdvanceType::Out,
            );
        }
    }

    fn baserunning_outs(&mut self, plays: &[BaserunningPlay]) {
        for play in plays.iter().filter(|p| p.is_out_attempt()) {
            let (Some(runner), Some(base)) = (play.runner(), play.base) else {
                continue;
            };
            let chain = play
                .fielding()
                .map(|p| p.parameter.as_str())
                .unwrap_or_default();
            self.push(
                &format!("{}{}", play.play_type, base),
                runner,
                chain,
                !play.has_error(),
            );
        }
    }

    /// A strikeout where the batter is given an advance is not counted here. This
    /// covers more than `B-1`: on `B-2` the batter is standing on second, and a
    /// `BX` advance already records (or voids) the out on its own.
    fn strikeout(&mut self, event: &RawEvent) {
        let Some(BasicPlay::StrikeOut { fielders, .. }) = &event.parsed_basic_play else {
            return;
        };
        if event.advance_from(BaseRunner::Batter).is_some() {
            return;
        }
        let chain: String = if fielders.is_empty() {
            String::from("2")
        } else {
            fielders.iter().map(|f| u8::from(*f).to_string()).collect()
        };
        self.push(&event.basic_play, BaseRunner::Batter, &chain, true);
    }
}

/// Every out made or attempted on the play, in the order force outs, advance outs,
/// caught-stealing and pickoffs, strikeout.
pub fn resolve_outs(event: &RawEvent, before: &BaseState, defense: &Defense) -> Vec<Out> {
    let mut resolver = OutResolver {
        before,
        defense,
        outs: vec![],
    };
    if let Some(basic_play) = &event.parsed_basic_play {
        resolver.force_outs(basic_play);
    }
    resolver.advance_outs(&event.advances);
    if let Some(basic_play) = &event.parsed_basic_play {
        resolver.baserunning_outs(basic_play.baserunning_plays());
    }
    resolver.strikeout(event);
    resolver.outs
}

pub fn determine_outs_recorded(outs: &[Out]) -> usize {
    outs.iter().filter(|o| o.recorded).count()
}

#[cfg(test)]
mod tests {
    use fixed_map::Map;
    use proptest::prelude::*;

    use super::*;
    use crate::event_file::pbp::tests::state;
    use crate::event_file::traits::Player;

    fn defense() -> Defense {
        let mut defense = Map::new();
        for (i, id) in ["pitch", "catch", "first", "second", "third", "short", "left", "center", "right"]
            .into_iter()
            .enumerate()
        {
            let position = FieldingPosition::from_digit(i as u8 + 1).unwrap();
            defense.insert(position, Player::from(id).unwrap());
        }
        defense
    }

    fn outs(play: &str, before: &BaseState) -> Vec<Out> {
        resolve_outs(&RawEvent::tokenize(play).unwrap(), before, &defense())
    }

    fn positions(credits: &[FielderCredit]) -> Vec<u8> {
        credits.iter().map(|c| u8::from(c.fielder_position)).collect()
    }

    fn putout(out: &Out) -> Option<u8> {
        out.putout.map(|c| u8::from(c.fielder_position))
    }

    #[test]
    fn force_groups_share_pivot() {
        let before = state("batter", Some("first"), None, None);
        let result = outs("54(1)3/GDP", &before);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].runner_starting_base, BaseRunner::First);
        assert_eq!(result[0].runner.unwrap().batter.as_str(), "first");
        assert_eq!(putout(&result[0]), Some(4));
        assert_eq!(positions(&result[0].assists), vec![5]);
        assert_eq!(result[1].play, "43");
        assert_eq!(result[1].runner_starting_base, BaseRunner::Batter);
        assert_eq!(putout(&result[1]), Some(3));
        assert_eq!(positions(&result[1].assists), vec![4]);
        assert_eq!(result[1].putout.unwrap().fielder_id.unwrap().as_str(), "first");
        assert_eq!(determine_outs_recorded(&result), 2);
    }

    #[test]
    fn tagged_batter_and_triple_play() {
        let before = state("batter", Some("first"), None, None);
        let result = outs("5(B)53(1)", &before);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].runner_starting_base, BaseRunner::Batter);
        assert_eq!(putout(&result[0]), Some(5));
        assert!(result[0].assists.is_empty());
        assert_eq!(result[1].runner_starting_base, BaseRunner::First);

        let before = state("batter", Some("first"), Some("second"), None);
        let result = outs("1(B)16(2)63(1)/LTP", &before);
        assert_eq!(determine_outs_recorded(&result), 3);
        assert_eq!(
            result.iter().map(|o| o.runner_starting_base).collect::<Vec<_>>(),
            vec![BaseRunner::Batter, BaseRunner::Second, BaseRunner::First]
        );
    }

    #[test]
    fn rundown_assists_are_deduplicated() {
        let before = state("batter", None, None, Some("third"));
        let result = outs("FC1.3XH(5261526);B-2", &before);
        assert_eq!(result.len(), 1);
        assert_eq!(putout(&result[0]), Some(6));
        assert_eq!(positions(&result[0].assists), vec![5, 2, 6, 1]);
        assert_eq!(result[0].runner.unwrap().batter.as_str(), "third");
    }

    #[test]
    fn error_voids_advance_out() {
        let before = state("batter", None, None, None);
        let result = outs("S8.BX2(7E4)", &before);
        assert_eq!(result.len(), 1);
        assert!(!result[0].recorded);
        assert_eq!(result[0].putout, None);
        assert_eq!(positions(&result[0].assists), vec![7]);
        assert_eq!(determine_outs_recorded(&result), 0);
    }

    #[test]
    fn caught_stealing_and_pickoffs() {
        let before = state("batter", Some("first"), None, None);
        let result = outs("CS2(26)", &before);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].play, "CS2");
        assert_eq!(result[0].runner_starting_base, BaseRunner::First);
        assert_eq!(putout(&result[0]), Some(6));
        assert!(result[0].recorded);

        let result = outs("CS2(2E6)", &before);
        assert!(!result[0].recorded);
        assert_eq!(positions(&result[0].assists), vec![2]);

        let result = outs("POCS2(1E3)", &before);
        assert_eq!(result.len(), 1);
        assert!(!result[0].recorded);
        assert_eq!(positions(&result[0].assists), vec![1]);

        let result = outs("PO1(13)", &before);
        assert_eq!(result[0].runner_starting_base, BaseRunner::First);
        assert_eq!(putout(&result[0]), Some(3));

        let before = state("batter", None, None, Some("third"));
        let result = outs("CSH(12)", &before);
        assert_eq!(result[0].runner_starting_base, BaseRunner::Third);
        assert_eq!(putout(&result[0]), Some(2));
    }

    #[test]
    fn caught_stealing_without_credit_is_still_an_out() {
        let before = state("batter", Some("first"), None, None);
        let result = outs("CS2", &before);
        assert_eq!(determine_outs_recorded(&result), 1);
        assert_eq!(result[0].putout, None);
    }

    #[test]
    fn strikeouts() {
        let before = state("batter", Some("first"), None, None);
        let result = outs("K", &before);
        assert_eq!(result.len(), 1);
        assert_eq!(putout(&result[0]), Some(2));
        assert_eq!(result[0].play, "K");

        let result = outs("K23", &before);
        assert_eq!(putout(&result[0]), Some(3));
        assert_eq!(positions(&result[0].assists), vec![2]);

        assert!(outs("K+WP.B-1", &before).is_empty());
        assert!(outs("K+WP.B-2", &before).is_empty());

        let result = outs("K+WP.BX1(23)", &before);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].play, "BX1(23)");
        assert_eq!(determine_outs_recorded(&result), 1);

        let result = outs("K+WP.BX1(2E3)", &before);
        assert_eq!(result.len(), 1);
        assert_eq!(determine_outs_recorded(&result), 0);

        let result = outs("K+CS2(26)", &before);
        assert_eq!(determine_outs_recorded(&result), 2);
        assert_eq!(result[0].runner_starting_base, BaseRunner::First);
        assert_eq!(result[1].runner_starting_base, BaseRunner::Batter);
    }

    #[test]
    fn plays_without_outs() {
        let before = state("batter", Some("first"), Some("second"), None);
        assert!(outs("S5/G.B-2(E5/TH)", &before).is_empty());
        assert!(outs("S7.2-H;1-3", &before).is_empty());
        assert!(outs("W", &before).is_empty());
        assert!(outs("bleh", &before).is_empty());
    }

    #[test]
    fn fly_out_with_runner_doubled_off() {
        let before = state("batter", Some("first"), None, None);
        let result = outs("7/LDP.1X1(763)", &before);
        assert_eq!(determine_outs_recorded(&result), 2);
        assert_eq!(result[0].runner_starting_base, BaseRunner::Batter);
        assert_eq!(putout(&result[0]), Some(7));
        assert_eq!(result[1].runner_starting_base, BaseRunner::First);
        assert_eq!(positions(&result[1].assists), vec![7, 6]);
    }

    proptest! {
        #[test]
        fn one_out_per_force_group(play in "[1-9]{1,3}(\\([123]\\)[1-9]{1,3}){0,2}(\\([123]\\))?") {
            let before = state("batter", Some("first"), Some("second"), Some("third"));
            let result = outs(&play, &before);
            let groups = play.matches('(').count() + usize::from(!play.ends_with(')'));
            prop_assert_eq!(determine_outs_recorded(&result), groups);
            prop_assert_eq!(
                result.iter().any(|o| o.runner_starting_base == BaseRunner::Batter),
                !play.ends_with(')')
            );
            for out in &result {
                prop_assert_eq!(
                    putout(out).map(|p| p.to_string()),
                    out.play.chars().filter(char::is_ascii_digit).last().map(String::from)
                );
            }
        }
    }
}
