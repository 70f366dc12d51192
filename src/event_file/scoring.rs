use crate::event_file::advance::{Advance, AdvanceMarker, AdvanceType};
use crate::event_file::classify::{Classification, PlayOutcome};
use crate::event_file::lineup::Defense;
use crate::event_file::outs::FielderCredit;
use crate::event_file::play::{ContactType, RawEvent};
use crate::event_file::traits::{BaseRunner, FieldingPosition};
use crate::util::first_error_digit;

/// A run that scored on a clean advance with no `NR`/`NORBI` marker.
fn qualifies(advance: &Advance) -> bool {
    advance.scored()
        && advance.advance_type != AdvanceType::SafeOnError
        && !advance.has_marker(AdvanceMarker::NoRbi)
}

fn grounded_into_double_play(event: &RawEvent) -> bool {
    event.contact_descriptions().any(|cd| {
        matches!(
            cd.contact_type,
            Some(ContactType::GroundBallDoublePlay | ContactType::BuntGroundIntoDoublePlay)
        )
    })
}

/// Runs batted in on the play.
///
/// On a fielding error with fewer than two outs, only clean runs from third count.
/// Otherwise strikeouts, errors and grounded-into-double-plays drive in nobody,
/// and everything else credits each clean run plus the batter on a home run.
pub fn resolve_rbi(event: &RawEvent, classification: &Classification, outs_before: usize) -> usize {
    let qualifying = || event.advances.iter().filter(|a| qualifies(a));
    match classification.outcome {
        PlayOutcome::ReachedOnError if outs_before < 2 => qualifying()
            .filter(|a| a.starting_base == BaseRunner::Third)
            .count(),
        PlayOutcome::ReachedOnError | PlayOutcome::StrikeOut => 0,
        _ if grounded_into_double_play(event) => 0,
        _ => {
            let implicit_batter = classification.is_home_run()
                && event.advance_from(BaseRunner::Batter).is_none();
            qualifying().count() + usize::from(implicit_batter)
        }
    }
}

/// One error per `E<digit>` found in the basic play, each advance parameter and
/// its notes, and each modifier. Separate mentions are separate errors.
pub fn resolve_errors(event: &RawEvent, defense: &Defense) -> Vec<FielderCredit> {
    let advance_parts = event.advances.iter().flat_map(|a| {
        a.parameters
            .iter()
            .flat_map(|p| std::iter::once(&p.parameter).chain(&p.modifiers))
    });
    std::iter::once(&event.basic_play)
        .chain(advance_parts)
        .chain(&event.modifiers)
        .filter_map(|s| first_error_digit(s))
        .filter_map(FieldingPosition::from_digit)
        .map(|f| FielderCredit::new(f, defense))
        .collect()
}

#[cfg(test)]
mod tests {
    use fixed_map::Map;

    use super::*;

    fn rbi(play: &str, outs_before: usize) -> usize {
        let event = RawEvent::tokenize(play).unwrap();
        resolve_rbi(&event, &Classification::new(&event), outs_before)
    }

    fn errors(play: &str) -> Vec<u8> {
        resolve_errors(&RawEvent::tokenize(play).unwrap(), &Map::new())
            .into_iter()
            .map(|c| u8::from(c.fielder_position))
            .collect()
    }

    #[test]
    fn hits_and_home_runs() {
        assert_eq!(rbi("S7/G78", 0), 0);
        assert_eq!(rbi("S7/G78.2-3", 0), 0);
        assert_eq!(rbi("HR", 0), 1);
        assert_eq!(rbi("H", 0), 1);
        assert_eq!(rbi("HR7", 0), 1);
        assert_eq!(rbi("HR/7D.3-H;2-H;1-H", 2), 4);
        assert_eq!(rbi("HR.B-H", 0), 1);
        assert_eq!(rbi("S7/G78.2-H", 0), 1);
        assert_eq!(rbi("S7/G78.3-H;2-H", 0), 2);
    }

    #[test]
    fn error_advances_do_not_count() {
        assert_eq!(rbi("S7/G78.3-H;2XH(E7/TH)", 0), 1);
        assert_eq!(rbi("FC5/G5-.3-H;2-2", 0), 1);
        assert_eq!(rbi("SF9/F9D.3-H;2-3", 0), 1);
    }

    #[test]
    fn suppressed_plays() {
        assert_eq!(rbi("64(1)3/GDP.3-H", 0), 0);
        assert_eq!(rbi("54(1)/BGDP.3-H", 0), 0);
        assert_eq!(rbi("K23.3-H(TH)", 0), 0);
        assert_eq!(rbi("S8.3-H(NR)", 0), 0);
        assert_eq!(rbi("S8.3-H(NORBI)", 0), 0);
    }

    #[test]
    fn reached_on_error() {
        assert_eq!(rbi("E7/F7S.2-H", 0), 0);
        assert_eq!(rbi("E6/G6+.3-H", 1), 1);
        assert_eq!(rbi("E6/G6+.3-H", 2), 0);
        assert_eq!(rbi("E6/G6+.3-H(NR)", 1), 0);
    }

    #[test]
    fn markers_do_not_override_the_rule() {
        assert_eq!(rbi("W+WP.3-H", 0), 1);
        assert_eq!(rbi("W+WP.3-H(WP)", 0), 1);
        assert_eq!(rbi("S8.3-H(PB)", 0), 1);
        assert_eq!(rbi("K+WP.3-H(RBI)", 0), 0);
        assert_eq!(rbi("64(1)3/GDP.3-H(RBI)", 0), 0);
        assert_eq!(rbi("E6.3-H(RBI)", 2), 0);
        assert_eq!(rbi("E6.3-H(RBI);2-H", 1), 1);
    }

    #[test]
    fn errors_from_every_part_of_the_play() {
        assert_eq!(errors("E7/G78.2XH(E2)"), vec![7, 2]);
        assert_eq!(errors("C/E2"), vec![2]);
        assert_eq!(errors("PO1(E3)"), vec![3]);
        assert_eq!(errors("FLE5"), vec![5]);
        assert_eq!(errors("S8.2-H(E8/TH);1-3(E8)"), vec![8, 8]);
        assert!(errors("S7/G78.3-H").is_empty());
    }
}
