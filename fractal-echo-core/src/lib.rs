//! # Fractal Echo Core
//!
//! Deterministic, self-similar echo patterns and their delayed playback.
//! Provides the expansion algorithm, the scheduling contract and the
//! parameter engine without any audio, MIDI or real-time dependencies.
//!
//! ## Features
//!
//! - **serde**: Enable (de)serialization of params, events, lanes and layouts
//!
//! ## Example
//!
//! ```
//! use fractal_echo_core::{regenerate, EchoParams};
//!
//! let (events, lanes) = regenerate(&EchoParams::default());
//! assert_eq!(events.len(), 7);
//! assert_eq!(lanes.len(), 3);
//! ```

pub mod engine;
pub mod error;
pub mod expander;
pub mod scheduler;
pub mod types;
pub mod viz;

// Re-export commonly used types
pub use engine::{FractalEcho, ParamChange};
pub use error::ParamError;
pub use expander::{regenerate, tap_pattern, EchoPattern};
pub use scheduler::{
    ActivityTracker, DelayScheduler, EchoScheduler, ManualClock, NoteSink, RecordingSink,
};
pub use types::scheduled_event::Task;
pub use types::{
    EchoParams, FiredNote, Lane, LaneLink, NoteEvent, ParamSlot, PatternSummary, PARAM_COUNT,
};
