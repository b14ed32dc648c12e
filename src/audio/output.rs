//! Where fired echoes go
//!
//! [`EchoOutput`] is the shell's [`NoteSink`]. While a MIDI port is connected
//! each emission becomes a Note On followed, `duration` ms later, by a Note
//! Off scheduled on the timer thread. Otherwise the triple is printed.

use crate::audio::clock::TimerThread;
use crate::audio::midi::{clamp_midi, MidiOutputHandle};
use colored::*;
use fractal_echo_core::{FiredNote, NoteSink};
use std::sync::Arc;
use std::time::Duration;

/// One-line console rendering of an emission
pub fn format_emission(note: &FiredNote) -> String {
    format!(
        "{} note {} vel {} dur {}ms",
        "♪".bright_magenta(),
        note.note.to_string().cyan(),
        note.velocity.to_string().green(),
        note.duration
    )
}

pub struct EchoOutput {
    midi: Arc<MidiOutputHandle>,
    timer: Arc<TimerThread>,
}

impl EchoOutput {
    pub fn new(midi: Arc<MidiOutputHandle>, timer: Arc<TimerThread>) -> Self {
        Self { midi, timer }
    }

    fn play_midi(&self, note: FiredNote) {
        let key = clamp_midi(note.note);
        let velocity = clamp_midi(note.velocity);
        // Velocity 0 is a Note Off on the wire
        if velocity == 0 {
            return;
        }

        let channel = self.midi.channel();
        if let Err(e) = self.midi.note_on(key, velocity) {
            log::warn!("note on {} failed: {}", key, e);
            return;
        }

        let midi = self.midi.clone();
        let hold = Duration::from_millis(note.duration.max(0) as u64);
        self.timer.schedule_after(
            hold,
            Box::new(move || {
                if let Err(e) = midi.note_off(channel, key) {
                    log::warn!("note off {} failed: {}", key, e);
                }
            }),
        );
    }
}

impl NoteSink for EchoOutput {
    fn emit(&self, note: FiredNote) {
        if self.midi.is_connected() {
            self.play_midi(note);
        } else {
            println!("{}", format_emission(&note));
        }
    }
}
