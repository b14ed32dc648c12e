//! Echo scheduling
//!
//! [`EchoScheduler`] turns a flat event list plus one triggering note into a
//! batch of delayed emissions. It never keeps time itself: the host supplies a
//! [`DelayScheduler`] ("run this callback after N ms") and a [`NoteSink`] that
//! receives each fired triple. Nothing is ever cancelled, so overlapping
//! triggers simply stack.

mod manual_clock;

pub use manual_clock::ManualClock;

use crate::expander::EchoPattern;
use crate::types::scheduled_event::Task;
use crate::types::{FiredNote, NoteEvent};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Host capability: run `task` once, no earlier than `delay_ms` from now
pub trait DelayScheduler: Send + Sync {
    fn schedule(&self, delay_ms: u64, task: Task);
}

/// Receives one emission per fired echo
pub trait NoteSink: Send + Sync {
    fn emit(&self, note: FiredNote);
}

/// Collects emissions in firing order, mostly useful in tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    fired: Mutex<Vec<FiredNote>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far
    pub fn fired(&self) -> Vec<FiredNote> {
        self.fired.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl NoteSink for RecordingSink {
    fn emit(&self, note: FiredNote) {
        if let Ok(mut fired) = self.fired.lock() {
            fired.push(note);
        }
    }
}

/// Transient "currently sounding" flags for the visualization highlight.
///
/// Keys are `(generation, event id)` so that flags raised by a trigger on an
/// older pattern never light up notes of a newer one. Each key counts its
/// sounding copies, so overlapping triggers keep a note lit until the last
/// copy is released.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    active: Arc<Mutex<HashMap<(u64, usize), usize>>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, generation: u64, id: usize, on: bool) {
        if let Ok(mut active) = self.active.lock() {
            let key = (generation, id);
            if on {
                *active.entry(key).or_insert(0) += 1;
            } else if let Some(count) = active.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    active.remove(&key);
                }
            }
        }
    }

    pub fn is_active(&self, generation: u64, id: usize) -> bool {
        self.active
            .lock()
            .map(|active| active.contains_key(&(generation, id)))
            .unwrap_or(false)
    }

    /// Ids of the notes of `generation` that are currently sounding
    pub fn active_ids(&self, generation: u64) -> HashSet<usize> {
        self.active
            .lock()
            .map(|active| {
                active
                    .keys()
                    .filter(|(g, _)| *g == generation)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every flag (used after a panic/stop in the shell)
    pub fn clear(&self) {
        if let Ok(mut active) = self.active.lock() {
            active.clear();
        }
    }
}

/// Pitch and velocity an event fires with for a given trigger
pub fn fire(event: &NoteEvent, note: i32, velocity: i32) -> FiredNote {
    FiredNote {
        duration: event.duration,
        velocity: (f64::from(velocity) * event.velocity_coeff).floor() as i32,
        note: note.wrapping_add(event.pitch_delta),
    }
}

/// Schedules one delayed emission per generated event
pub struct EchoScheduler {
    delay: Arc<dyn DelayScheduler>,
    sink: Arc<dyn NoteSink>,
    activity: Option<ActivityTracker>,
}

impl EchoScheduler {
    pub fn new(delay: Arc<dyn DelayScheduler>, sink: Arc<dyn NoteSink>) -> Self {
        Self {
            delay,
            sink,
            activity: None,
        }
    }

    /// Also raise and drop highlight flags around each emission
    pub fn with_activity(mut self, tracker: ActivityTracker) -> Self {
        self.activity = Some(tracker);
        self
    }

    pub fn activity(&self) -> Option<&ActivityTracker> {
        self.activity.as_ref()
    }

    /// Schedule every event of `events` for the trigger `(note, velocity)`.
    ///
    /// A velocity of 0 is a note-off and schedules nothing. Returns the number
    /// of emissions scheduled.
    pub fn trigger(&self, events: &[NoteEvent], note: i32, velocity: i32) -> usize {
        self.schedule_all(events, None, note, velocity)
    }

    /// Like [`trigger`](Self::trigger), with highlight flags keyed to the
    /// pattern's generation when a tracker is attached
    pub fn trigger_pattern(&self, pattern: &EchoPattern, note: i32, velocity: i32) -> usize {
        self.schedule_all(&pattern.events, Some(pattern.generation), note, velocity)
    }

    fn schedule_all(
        &self,
        events: &[NoteEvent],
        generation: Option<u64>,
        note: i32,
        velocity: i32,
    ) -> usize {
        if velocity <= 0 {
            return 0;
        }

        let highlight = self.activity.clone().zip(generation);

        for event in events {
            let fired = fire(event, note, velocity);
            let delay_ms = event.offset_ms.max(0) as u64;
            log::trace!(
                "scheduling echo #{} in {}ms: note={} velocity={} duration={}",
                event.id,
                delay_ms,
                fired.note,
                fired.velocity,
                fired.duration
            );

            let sink = self.sink.clone();
            let on_flag = highlight.clone();
            let id = event.id;
            self.delay.schedule(
                delay_ms,
                Box::new(move || {
                    sink.emit(fired);
                    if let Some((tracker, generation)) = on_flag {
                        tracker.set(generation, id, true);
                    }
                }),
            );

            if let Some((tracker, generation)) = highlight.clone() {
                let off_ms = event.end_ms().max(0) as u64;
                self.delay.schedule(
                    off_ms,
                    Box::new(move || tracker.set(generation, id, false)),
                );
            }
        }

        events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::regenerate;
    use crate::types::EchoParams;

    fn setup() -> (Arc<ManualClock>, Arc<RecordingSink>, EchoScheduler) {
        let clock = Arc::new(ManualClock::new());
        let sink = Arc::new(RecordingSink::new());
        let scheduler = EchoScheduler::new(clock.clone(), sink.clone());
        (clock, sink, scheduler)
    }

    #[test]
    fn test_zero_velocity_schedules_nothing() {
        let (clock, sink, scheduler) = setup();
        let (events, _) = regenerate(&EchoParams::default());

        assert_eq!(scheduler.trigger(&events, 60, 0), 0);
        assert_eq!(clock.pending(), 0);
        clock.advance(10_000);
        assert!(sink.fired().is_empty());
    }

    #[test]
    fn test_trigger_schedules_one_emission_per_event() {
        let (clock, sink, scheduler) = setup();
        let (events, _) = regenerate(&EchoParams::default());

        assert_eq!(scheduler.trigger(&events, 60, 100), 7);
        assert_eq!(clock.pending(), 7);

        clock.advance(1750);
        let fired = sink.fired();
        assert_eq!(
            fired,
            vec![
                FiredNote { duration: 100, velocity: 100, note: 60 },
                FiredNote { duration: 84, velocity: 90, note: 60 },
                FiredNote { duration: 42, velocity: 59, note: 60 },
                FiredNote { duration: 70, velocity: 81, note: 60 },
                FiredNote { duration: 35, velocity: 53, note: 60 },
                FiredNote { duration: 42, velocity: 59, note: 60 },
                FiredNote { duration: 35, velocity: 53, note: 60 },
            ]
        );
    }

    #[test]
    fn test_emissions_wait_for_their_offset() {
        let (clock, sink, scheduler) = setup();
        let (events, _) = regenerate(&EchoParams::default());
        scheduler.trigger(&events, 60, 100);

        clock.advance(499);
        assert_eq!(sink.fired().len(), 1);
        clock.advance(1);
        assert_eq!(sink.fired().len(), 2);
    }

    #[test]
    fn test_overlapping_triggers_stack() {
        let (clock, sink, scheduler) = setup();
        let (events, _) = regenerate(&EchoParams::default());

        scheduler.trigger(&events, 60, 100);
        clock.advance(600);
        scheduler.trigger(&events, 72, 50);
        clock.advance(5_000);

        let fired = sink.fired();
        assert_eq!(fired.len(), 14);
        assert_eq!(fired.iter().filter(|f| f.note == 72).count(), 7);
    }

    #[test]
    fn test_note_increment_and_negative_offsets() {
        let (clock, sink, scheduler) = setup();
        let params = EchoParams {
            iterations: 2,
            note_incr: -12,
            bases: [-200, 400, 0, 0],
            ..EchoParams::default()
        };
        let (events, _) = regenerate(&params);
        scheduler.trigger(&events, 64, 127);

        // Events before the trigger fire immediately
        clock.advance(0);
        assert!(sink.fired().iter().any(|f| f.note == 64));
        clock.advance(10_000);
        assert!(sink.fired().iter().any(|f| f.note == 52));
        assert_eq!(sink.fired().len(), events.len());
    }

    #[test]
    fn test_activity_flags_follow_note_lifetime() {
        let clock = Arc::new(ManualClock::new());
        let sink = Arc::new(RecordingSink::new());
        let tracker = ActivityTracker::new();
        let scheduler =
            EchoScheduler::new(clock.clone(), sink.clone()).with_activity(tracker.clone());
        let pattern = EchoPattern::generate(&EchoParams::default(), 3);

        assert_eq!(scheduler.trigger_pattern(&pattern, 60, 100), 7);
        // One emission and one release per event
        assert_eq!(clock.pending(), 14);

        clock.advance(500);
        assert!(tracker.is_active(3, 1));
        assert!(!tracker.is_active(3, 0)); // hit released at 100ms
        assert!(!tracker.is_active(2, 1));

        clock.advance(84);
        assert!(!tracker.is_active(3, 1));
        clock.advance(10_000);
        assert!(tracker.active_ids(3).is_empty());
    }

    #[test]
    fn test_overlapping_triggers_keep_the_flag_lit() {
        let clock = Arc::new(ManualClock::new());
        let sink = Arc::new(RecordingSink::new());
        let tracker = ActivityTracker::new();
        let scheduler =
            EchoScheduler::new(clock.clone(), sink.clone()).with_activity(tracker.clone());
        let pattern = EchoPattern::generate(&EchoParams::default(), 0);

        // The hit (id 0) sounds 0..100ms for the first trigger, 50..150ms for the second
        scheduler.trigger_pattern(&pattern, 60, 100);
        clock.advance(50);
        scheduler.trigger_pattern(&pattern, 60, 100);
        assert!(tracker.is_active(0, 0));

        clock.advance(70);
        assert!(tracker.is_active(0, 0));

        clock.advance(30);
        assert!(!tracker.is_active(0, 0));
    }

    #[test]
    fn test_plain_trigger_skips_highlight() {
        let clock = Arc::new(ManualClock::new());
        let sink = Arc::new(RecordingSink::new());
        let scheduler = EchoScheduler::new(clock.clone(), sink.clone())
            .with_activity(ActivityTracker::new());
        let (events, _) = regenerate(&EchoParams::default());

        scheduler.trigger(&events, 60, 100);
        assert_eq!(clock.pending(), 7);
    }
}
