// fractal-echo-core/src/types/mod.rs

pub mod event;
pub mod params;
pub mod scheduled_event;

pub use event::{FiredNote, Lane, LaneLink, NoteEvent, PatternSummary};
pub use params::{EchoParams, ParamSlot, PARAM_COUNT};
pub use scheduled_event::ScheduledTask;
