use serde::Serialize;

use crate::event_file::advancement::{resolve_advancement, RunScored};
use crate::event_file::batted_ball::BallInPlay;
use crate::event_file::classify::{Classification, PlayFlags, PlayOutcome};
use crate::event_file::error::{ConsistencyError, ParseError};
use crate::event_file::lineup::Defense;
use crate::event_file::outs::{determine_outs_recorded, resolve_outs, FielderCredit, Out};
use crate::event_file::pbp::{BaseState, Bases, RunnerIdentity};
use crate::event_file::play::RawEvent;
use crate::event_file::scoring::{resolve_errors, resolve_rbi};

/// Everything known about one play once it has been resolved against the state before it.
#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct EnhancedPlay {
    pub raw_event: RawEvent,
    pub play_code: String,
    pub outcome: PlayOutcome,
    pub flags: PlayFlags,
    pub plate_appearance: bool,
    pub at_bat: bool,
    pub ball_in_play: Option<BallInPlay>,
    pub outs: Vec<Out>,
    pub outs_recorded: usize,
    pub outs_after_play: usize,
    pub bases_occupied_after_play: Bases,
    pub base_stealers: Vec<Option<RunnerIdentity>>,
    pub runs_scored_by: Vec<RunScored>,
    pub runs: usize,
    pub rbi: usize,
    pub errors: Vec<FielderCredit>,
    pub valid: bool,
    pub validation_errors: Vec<ParseError>,
}

impl EnhancedPlay {
    /// Returns `Ok(None)` for empty play text. Grammar problems are reported on the
    /// play itself; only violations of the base state are errors.
    pub fn new(
        text: &str,
        before: &BaseState,
        outs_before: usize,
        defense: &Defense,
    ) -> Result<Option<Self>, ConsistencyError> {
        let Some(raw_event) = RawEvent::tokenize(text) else {
            return Ok(None);
        };
        let mut validation_errors: Vec<ParseError> = raw_event.parse_errors().cloned().collect();

        let classification = Classification::new(&raw_event);
        let ball_in_play = BallInPlay::from_event(&raw_event).unwrap_or_else(|e| {
            validation_errors.push(e);
            None
        });
        let outs = resolve_outs(&raw_event, before, defense);
        let outs_recorded = determine_outs_recorded(&outs);
        let advancement = resolve_advancement(&raw_event, before)?;
        let rbi = resolve_rbi(&raw_event, &classification, outs_before);
        let errors = resolve_errors(&raw_event, defense);

        Ok(Some(Self {
            play_code: classification.play_code.clone(),
            outcome: classification.outcome,
            flags: classification.flags,
            plate_appearance: classification.plate_appearance(),
            at_bat: classification.at_bat(),
            ball_in_play,
            outs,
            outs_recorded,
            outs_after_play: outs_before + outs_recorded,
            bases_occupied_after_play: advancement.bases_after_play,
            base_stealers: advancement.base_stealers,
            runs: advancement.runs_scored_by.len(),
            runs_scored_by: advancement.runs_scored_by,
            rbi,
            errors,
            valid: validation_errors.is_empty(),
            validation_errors,
            raw_event,
        }))
    }
}
