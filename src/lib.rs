//! # Fractal Echo
//!
//! Interactive shell around [`fractal_echo_core`]: a wall-clock timer thread
//! that fires scheduled echoes, MIDI output through midir (or console output
//! when no port is connected), and a small command REPL for setting the
//! parameter slots and inspecting the generated pattern.
//!
//! ## Modules
//!
//! - `audio`: the real-time `DelayScheduler` and the `NoteSink` the echoes land on.
//! - `commands`: the REPL command registry and handlers.
//! - `config`: startup configuration read from the environment.
//! - `repl`: the Read-Eval-Print Loop itself.

pub mod audio;
pub mod commands;
pub mod config;
pub mod repl;

pub use crate::config::Config;
pub use fractal_echo_core::{EchoParams, FractalEcho, ParamSlot};
