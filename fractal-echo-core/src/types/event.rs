//! Generated note events and the lane tree built around them.

/// One echo produced by pattern expansion
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    /// Milliseconds after the triggering note at which this echo fires
    pub offset_ms: i64,
    /// Recursion depth (0 = original hit)
    pub level: u32,
    /// Multiplier applied to the trigger velocity
    pub velocity_coeff: f64,
    /// Semitones added to the trigger note
    pub pitch_delta: i32,
    /// Note length in milliseconds
    pub duration: i64,
    /// Generation order within one expansion, shared by the flat list and the lanes
    pub id: usize,
}

impl NoteEvent {
    /// Milliseconds after the trigger at which this echo stops sounding
    pub fn end_ms(&self) -> i64 {
        self.offset_ms.saturating_add(self.duration)
    }
}

/// Back-reference from a lane to the lane that spawned it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneLink {
    /// Local origin of the child lane
    pub offset_ms: i64,
    /// Index of the parent in the lane sequence
    pub parent_lane_index: usize,
}

/// Notes sharing one recursion branch and therefore one local origin
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lane {
    /// `None` only for the root lane
    pub link: Option<LaneLink>,
    pub notes: Vec<NoteEvent>,
}

impl Lane {
    pub fn is_root(&self) -> bool {
        self.link.is_none()
    }

    /// Where the lane starts: its link offset, or 0 for the root
    pub fn origin_ms(&self) -> i64 {
        self.link.map(|l| l.offset_ms).unwrap_or(0)
    }

    /// Offset of the last note, or the origin when the lane has no notes
    pub fn end_ms(&self) -> i64 {
        self.notes
            .last()
            .map(|n| n.offset_ms)
            .unwrap_or_else(|| self.origin_ms())
    }
}

/// Scalar summaries recomputed on every regeneration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternSummary {
    /// Number of generated events
    pub total_notes: usize,
    /// Largest `offset_ms + duration` across events (0 when empty)
    pub total_duration_ms: i64,
}

impl PatternSummary {
    pub fn from_events(events: &[NoteEvent]) -> Self {
        let total_duration_ms = events
            .iter()
            .map(NoteEvent::end_ms)
            .fold(0, i64::max);

        Self {
            total_notes: events.len(),
            total_duration_ms,
        }
    }
}

/// One fired emission: what a scheduled echo hands to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FiredNote {
    pub duration: i64,
    pub velocity: i32,
    pub note: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(offset_ms: i64, duration: i64) -> NoteEvent {
        NoteEvent {
            offset_ms,
            level: 0,
            velocity_coeff: 1.0,
            pitch_delta: 0,
            duration,
            id: 0,
        }
    }

    #[test]
    fn test_summary_uses_latest_note_end() {
        // The last-starting note is not necessarily the last to end
        let events = vec![event(0, 100), event(500, 900), event(1000, 50)];
        let summary = PatternSummary::from_events(&events);
        assert_eq!(summary.total_notes, 3);
        assert_eq!(summary.total_duration_ms, 1400);
    }

    #[test]
    fn test_summary_of_empty_list() {
        assert_eq!(
            PatternSummary::from_events(&[]),
            PatternSummary {
                total_notes: 0,
                total_duration_ms: 0
            }
        );
    }

    #[test]
    fn test_lane_origin_and_end() {
        let root = Lane {
            link: None,
            notes: vec![event(0, 10), event(500, 10)],
        };
        assert!(root.is_root());
        assert_eq!(root.origin_ms(), 0);
        assert_eq!(root.end_ms(), 500);

        let child = Lane {
            link: Some(LaneLink {
                offset_ms: 375,
                parent_lane_index: 0,
            }),
            notes: vec![],
        };
        assert!(!child.is_root());
        assert_eq!(child.end_ms(), 375);
    }
}
