//! Depth-first echo expansion.
//!
//! Each step of [`Expansion::expand`] opens one lane, emits that lane's notes,
//! appends the lane, and only then queues the children. Pending lanes live on
//! an explicit stack rather than the call stack, so depth is bounded by memory
//! alone. Children link back to their parent by index into the append-only
//! lane sequence, so every lane's own notes precede all of its descendants.

use crate::types::{EchoParams, Lane, LaneLink, NoteEvent};

/// Floor to whole milliseconds. Non-finite input collapses to 0.
#[inline]
pub(crate) fn floor_ms(ms: f64) -> i64 {
    ms.floor() as i64
}

/// Tap `idx` staggers the per-level exponent by a quarter step
#[inline]
fn staggered_exponent(level: u32, idx: usize) -> f64 {
    f64::from(level) + idx as f64 / 4.0
}

/// A lane waiting to be expanded
struct Frame {
    remaining: u32,
    time_offset: i64,
    parent: Option<usize>,
}

pub(crate) struct Expansion<'a> {
    params: &'a EchoParams,
    taps: &'a [i64],
    pub(crate) events: Vec<NoteEvent>,
    pub(crate) lanes: Vec<Lane>,
}

impl<'a> Expansion<'a> {
    pub(crate) fn new(params: &'a EchoParams, taps: &'a [i64]) -> Self {
        Self {
            params,
            taps,
            events: Vec::new(),
            lanes: Vec::new(),
        }
    }

    /// Grow the tree from the root lane
    pub(crate) fn run(mut self) -> (Vec<NoteEvent>, Vec<Lane>) {
        let mut pending = vec![Frame {
            remaining: self.params.iterations,
            time_offset: 0,
            parent: None,
        }];
        while let Some(frame) = pending.pop() {
            self.expand(frame, &mut pending);
        }
        (self.events, self.lanes)
    }

    fn scaled_ms(&self, tap: i64, level: u32) -> f64 {
        tap as f64 * self.params.stretch.powf(f64::from(level))
    }

    /// Emit one lane, then queue its children on `pending`
    fn expand(&mut self, frame: Frame, pending: &mut Vec<Frame>) {
        let Frame {
            remaining,
            time_offset,
            parent,
        } = frame;
        let level = self.params.iterations - remaining;
        let taps = self.taps;

        let mut lane = Lane {
            link: parent.map(|parent_lane_index| LaneLink {
                offset_ms: time_offset,
                parent_lane_index,
            }),
            notes: Vec::with_capacity(taps.len()),
        };

        for (idx, &tap) in taps.iter().enumerate() {
            // The self-tap below the root only seeds recursion, it is never played
            if level > 0 && tap == 0 {
                continue;
            }
            let scaled = self.scaled_ms(tap, level);
            let exponent = staggered_exponent(level, idx);

            let note = NoteEvent {
                offset_ms: floor_ms(scaled + time_offset as f64),
                level,
                velocity_coeff: self.params.decay.powf(exponent),
                pitch_delta: self.params.note_incr.wrapping_mul(level as i32),
                duration: floor_ms(self.params.dur_base * self.params.dur_decay.powf(exponent)),
                id: self.events.len(),
            };
            self.events.push(note.clone());
            lane.notes.push(note);
        }

        self.lanes.push(lane);
        let this_lane = self.lanes.len() - 1;

        if remaining <= 1 {
            return;
        }
        // Reversed so the first tap's subtree is popped, and fully grown, first
        for &tap in taps.iter().rev() {
            let scaled = self.scaled_ms(tap, level);
            // A zero offset would reproduce this very lane forever
            if scaled > 0.0 {
                pending.push(Frame {
                    remaining: remaining - 1,
                    time_offset: floor_ms(scaled + time_offset as f64),
                    parent: Some(this_lane),
                });
            }
        }
    }
}
