//! Pattern expansion
//!
//! Turns an [`EchoParams`] into nested "echoes of echoes": a flat,
//! offset-sorted event list for the scheduler, and the lane tree of the same
//! events for visualization. Everything here is pure; regenerating twice from
//! the same parameters gives bit-identical output.

mod expand;
mod taps;

#[cfg(test)]
mod tests;

use crate::types::{EchoParams, Lane, NoteEvent, PatternSummary};
use expand::Expansion;

pub use taps::tap_pattern;

/// Expand `params` into `(flat_events, lanes)`.
///
/// The flat list is sorted ascending by `offset_ms`; lanes stay in
/// depth-first generation order.
pub fn regenerate(params: &EchoParams) -> (Vec<NoteEvent>, Vec<Lane>) {
    let taps = tap_pattern(params);
    expand_with_taps(params, &taps)
}

fn expand_with_taps(params: &EchoParams, taps: &[i64]) -> (Vec<NoteEvent>, Vec<Lane>) {
    let (mut events, lanes) = Expansion::new(params, taps).run();
    events.sort_by_key(|e| e.offset_ms);
    (events, lanes)
}

/// One complete regeneration, as published to readers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EchoPattern {
    /// Increments on every regeneration of the owning engine
    pub generation: u64,
    pub taps: Vec<i64>,
    pub events: Vec<NoteEvent>,
    pub lanes: Vec<Lane>,
    pub summary: PatternSummary,
}

impl EchoPattern {
    pub fn generate(params: &EchoParams, generation: u64) -> Self {
        let taps = tap_pattern(params);
        let (events, lanes) = expand_with_taps(params, &taps);
        let summary = PatternSummary::from_events(&events);

        log::debug!(
            "regenerated pattern #{}: taps={:?} lanes={} notes={} span={}ms",
            generation,
            taps,
            lanes.len(),
            summary.total_notes,
            summary.total_duration_ms
        );

        Self {
            generation,
            taps,
            events,
            lanes,
            summary,
        }
    }
}
