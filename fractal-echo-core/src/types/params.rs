//! The echo parameter set
//!
//! Twelve named fields addressed either by name or by their inlet position.
//! Integer slots floor whatever numeric value they receive; the float slots
//! store it verbatim. Nothing here validates musical sanity: a zero stretch or
//! a negative decay is passed straight through to the pattern formulas.

use crate::error::ParamError;
use std::fmt;

/// Number of addressable parameter slots.
pub const PARAM_COUNT: usize = 12;

/// One addressable field of [`EchoParams`], in inlet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamSlot {
    Note,
    Velocity,
    Iterations,
    Stretch,
    Decay,
    NoteIncr,
    Base1,
    Base2,
    Base3,
    Base4,
    DurBase,
    DurDecay,
}

impl ParamSlot {
    pub const ALL: [ParamSlot; PARAM_COUNT] = [
        ParamSlot::Note,
        ParamSlot::Velocity,
        ParamSlot::Iterations,
        ParamSlot::Stretch,
        ParamSlot::Decay,
        ParamSlot::NoteIncr,
        ParamSlot::Base1,
        ParamSlot::Base2,
        ParamSlot::Base3,
        ParamSlot::Base4,
        ParamSlot::DurBase,
        ParamSlot::DurDecay,
    ];

    /// Look up a slot by inlet position
    pub fn from_index(index: usize) -> Result<ParamSlot, ParamError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ParamError::UnknownSlot(index))
    }

    /// Inlet position of this slot
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a slot name (case-insensitive, a few aliases accepted)
    pub fn from_name(s: &str) -> Option<ParamSlot> {
        match s.to_lowercase().as_str() {
            "note" => Some(ParamSlot::Note),
            "velocity" | "vel" => Some(ParamSlot::Velocity),
            "iterations" | "iter" | "depth" => Some(ParamSlot::Iterations),
            "stretch" => Some(ParamSlot::Stretch),
            "decay" => Some(ParamSlot::Decay),
            "note_incr" | "noteincr" | "incr" => Some(ParamSlot::NoteIncr),
            "base1" | "tap1" => Some(ParamSlot::Base1),
            "base2" | "tap2" => Some(ParamSlot::Base2),
            "base3" | "tap3" => Some(ParamSlot::Base3),
            "base4" | "tap4" => Some(ParamSlot::Base4),
            "dur_base" | "durbase" => Some(ParamSlot::DurBase),
            "dur_decay" | "durdecay" => Some(ParamSlot::DurDecay),
            _ => None,
        }
    }

    /// Resolve either a numeric inlet position or a slot name
    pub fn parse(s: &str) -> Result<ParamSlot, ParamError> {
        if let Ok(index) = s.parse::<usize>() {
            return Self::from_index(index);
        }
        Self::from_name(s).ok_or_else(|| ParamError::UnknownName(s.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamSlot::Note => "note",
            ParamSlot::Velocity => "velocity",
            ParamSlot::Iterations => "iterations",
            ParamSlot::Stretch => "stretch",
            ParamSlot::Decay => "decay",
            ParamSlot::NoteIncr => "note_incr",
            ParamSlot::Base1 => "base1",
            ParamSlot::Base2 => "base2",
            ParamSlot::Base3 => "base3",
            ParamSlot::Base4 => "base4",
            ParamSlot::DurBase => "dur_base",
            ParamSlot::DurDecay => "dur_decay",
        }
    }

    /// Short description shown by the shell's `params` listing
    pub fn description(self) -> &'static str {
        match self {
            ParamSlot::Note => "Note number (int)",
            ParamSlot::Velocity => "Note velocity (int)",
            ParamSlot::Iterations => "Iterations (int)",
            ParamSlot::Stretch => "Time stretch per level (float)",
            ParamSlot::Decay => "Velocity decay per level (float)",
            ParamSlot::NoteIncr => "Note increment per level (int)",
            ParamSlot::Base1 => "Tap 1 (ms)",
            ParamSlot::Base2 => "Tap 2 (ms)",
            ParamSlot::Base3 => "Tap 3 (ms)",
            ParamSlot::Base4 => "Tap 4 (ms)",
            ParamSlot::DurBase => "Duration base (ms)",
            ParamSlot::DurDecay => "Duration decay per level (float)",
        }
    }

    /// Whether changing this slot invalidates the generated pattern.
    ///
    /// Note and velocity only feed triggers; every other slot shapes the tree.
    pub fn regenerates(self) -> bool {
        self.index() > ParamSlot::Velocity.index()
    }
}

impl fmt::Display for ParamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The process-wide echo configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EchoParams {
    pub note: i32,
    pub velocity: i32,
    pub iterations: u32,
    pub stretch: f64,
    pub decay: f64,
    pub note_incr: i32,
    /// Raw tap offsets in milliseconds; 0 marks an unused slot
    pub bases: [i64; 4],
    pub dur_base: f64,
    pub dur_decay: f64,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            note: 0,
            velocity: 0,
            iterations: 2,
            stretch: 0.75,
            decay: 0.66,
            note_incr: 0,
            bases: [500, 1000, 0, 0],
            dur_base: 100.0,
            dur_decay: 0.5,
        }
    }
}

impl EchoParams {
    /// Store a raw numeric value into a slot.
    ///
    /// Integer slots are floored (saturating at the type bounds); a negative
    /// iteration count becomes 0, which expands identically.
    pub fn set(&mut self, slot: ParamSlot, value: f64) -> Result<(), ParamError> {
        if !value.is_finite() {
            return Err(ParamError::NonFinite {
                slot: slot.name(),
                value,
            });
        }

        match slot {
            ParamSlot::Note => self.note = value.floor() as i32,
            ParamSlot::Velocity => self.velocity = value.floor() as i32,
            ParamSlot::Iterations => self.iterations = value.floor().max(0.0) as u32,
            ParamSlot::Stretch => self.stretch = value,
            ParamSlot::Decay => self.decay = value,
            ParamSlot::NoteIncr => self.note_incr = value.floor() as i32,
            ParamSlot::Base1 => self.bases[0] = value.floor() as i64,
            ParamSlot::Base2 => self.bases[1] = value.floor() as i64,
            ParamSlot::Base3 => self.bases[2] = value.floor() as i64,
            ParamSlot::Base4 => self.bases[3] = value.floor() as i64,
            ParamSlot::DurBase => self.dur_base = value,
            ParamSlot::DurDecay => self.dur_decay = value,
        }
        Ok(())
    }

    /// Read a slot back as a number
    pub fn get(&self, slot: ParamSlot) -> f64 {
        match slot {
            ParamSlot::Note => f64::from(self.note),
            ParamSlot::Velocity => f64::from(self.velocity),
            ParamSlot::Iterations => f64::from(self.iterations),
            ParamSlot::Stretch => self.stretch,
            ParamSlot::Decay => self.decay,
            ParamSlot::NoteIncr => f64::from(self.note_incr),
            ParamSlot::Base1 => self.bases[0] as f64,
            ParamSlot::Base2 => self.bases[1] as f64,
            ParamSlot::Base3 => self.bases[2] as f64,
            ParamSlot::Base4 => self.bases[3] as f64,
            ParamSlot::DurBase => self.dur_base,
            ParamSlot::DurDecay => self.dur_decay,
        }
    }
}
