//! Command registry for REPL commands
//!
//! Every line typed at the prompt is matched against registered prefixes,
//! longest first, and handed to the matching handler with the rest of the
//! line as its arguments.

pub mod general;
pub mod midi;
pub mod params;
pub mod pattern;

use crate::audio::clock::TimerThread;
use crate::audio::midi::MidiOutputHandle;
use fractal_echo_core::FractalEcho;
use std::sync::Arc;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// No registered command matches
    NotACommand,
    /// Error occurred
    Error(String),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub echo: Arc<FractalEcho>,
    pub timer: Arc<TimerThread>,
    pub midi_handle: Option<Arc<MidiOutputHandle>>,
}

impl CommandContext {
    pub fn new(echo: Arc<FractalEcho>, timer: Arc<TimerThread>) -> Self {
        Self {
            echo,
            timer,
            midi_handle: None,
        }
    }

    /// Create a new context with MIDI support
    pub fn new_with_midi(
        echo: Arc<FractalEcho>,
        timer: Arc<TimerThread>,
        midi_handle: Arc<MidiOutputHandle>,
    ) -> Self {
        Self {
            echo,
            timer,
            midi_handle: Some(midi_handle),
        }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command with its prefix
    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Parameters and triggering
    registry.register("set", params::cmd_set);
    registry.register("note", params::cmd_note);
    registry.register("velocity", params::cmd_velocity);
    registry.register("play", params::cmd_play);
    registry.register("params", params::cmd_params);

    // Pattern inspection
    registry.register("taps", pattern::cmd_taps);
    registry.register("events", pattern::cmd_events);
    registry.register("lanes", pattern::cmd_lanes);
    registry.register("layout", pattern::cmd_layout);
    registry.register("json", pattern::cmd_json);

    // MIDI commands
    registry.register("midi devices", midi::cmd_midi_devices);
    registry.register("midi connect", midi::cmd_midi_connect);
    registry.register("midi disconnect", midi::cmd_midi_disconnect);
    registry.register("midi channel", midi::cmd_midi_channel);
    registry.register("midi status", midi::cmd_midi_status);
    registry.register("midi panic", midi::cmd_midi_panic);

    // General commands
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}
