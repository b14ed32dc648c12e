//! MIDI REPL commands

use crate::audio::midi::MidiOutputHandle;
use crate::commands::{CommandContext, CommandResult};
use colored::*;

const NOT_INITIALIZED: &str = "MIDI output not initialized";

/// Handle `midi devices` command - list available MIDI output ports
pub fn cmd_midi_devices(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match MidiOutputHandle::list_ports() {
        Ok(ports) if ports.is_empty() => CommandResult::Message(
            "No MIDI output ports found. Make sure a MIDI device or virtual port is connected."
                .yellow()
                .to_string(),
        ),
        Ok(ports) => {
            let mut output = format!("{}\n", "🎹 Available MIDI Output Ports:".bold());
            for (i, port) in ports.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, port.cyan()));
            }
            output.push_str(&format!(
                "\n{} {}",
                "Use".dimmed(),
                "midi connect <port name>".green()
            ));
            CommandResult::Message(output)
        }
        Err(e) => CommandResult::Error(format!("Failed to list MIDI ports: {}", e)),
    }
}

/// Handle `midi connect <port>` command - connect to a MIDI output port
pub fn cmd_midi_connect(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error(
            "Usage: midi connect <port name>\nUse 'midi devices' to see available ports"
                .to_string(),
        );
    }

    match &ctx.midi_handle {
        Some(handle) => match handle.connect(args) {
            Ok(name) => {
                CommandResult::Message(format!("🎹 Connected to MIDI port: {}", name.green()))
            }
            Err(e) => CommandResult::Error(format!("Failed to connect to '{}': {}", args, e)),
        },
        None => CommandResult::Error(NOT_INITIALIZED.to_string()),
    }
}

/// Handle `midi disconnect` command
pub fn cmd_midi_disconnect(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match &ctx.midi_handle {
        Some(handle) => match handle.disconnect() {
            Ok(()) => CommandResult::Message("🎹 Disconnected from MIDI".to_string()),
            Err(e) => CommandResult::Error(format!("Failed to disconnect: {}", e)),
        },
        None => CommandResult::Error(NOT_INITIALIZED.to_string()),
    }
}

/// Handle `midi channel [1-16]` command - show or set the output channel
pub fn cmd_midi_channel(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(handle) = &ctx.midi_handle else {
        return CommandResult::Error(NOT_INITIALIZED.to_string());
    };

    if args.is_empty() {
        return CommandResult::Message(format!(
            "🎹 MIDI channel: {}",
            (handle.channel() + 1).to_string().cyan()
        ));
    }

    match args.parse::<u8>() {
        Ok(ch) if (1..=16).contains(&ch) => {
            handle.set_channel(ch - 1);
            CommandResult::Message(format!("🎹 MIDI channel set to {}", ch).green().to_string())
        }
        _ => CommandResult::Error("Usage: midi channel <1-16>".to_string()),
    }
}

/// Handle `midi status` command - show MIDI connection status
pub fn cmd_midi_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(handle) = &ctx.midi_handle else {
        return CommandResult::Error(NOT_INITIALIZED.to_string());
    };

    let mut output = format!("{}\n", "🎹 MIDI Status:".bold());
    match handle.connected_port() {
        Some(name) => {
            output.push_str(&format!("  Status: {}\n", "Connected".green().bold()));
            output.push_str(&format!("  Port: {}\n", name.cyan()));
        }
        None => {
            output.push_str(&format!(
                "  Status: {} (echoes print to the console)\n",
                "Not connected".yellow()
            ));
        }
    }
    output.push_str(&format!("  Channel: {}\n", handle.channel() + 1));
    output.push_str(&format!("  Held notes: {}\n", handle.held_notes()));
    output.push_str(&format!("  Pending callbacks: {}", ctx.timer.pending()));

    CommandResult::Message(output)
}

/// Handle `midi panic` command - drop pending echoes and silence every channel
pub fn cmd_midi_panic(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.timer.clear();
    if let Some(tracker) = ctx.echo.scheduler().activity() {
        tracker.clear();
    }

    match &ctx.midi_handle {
        Some(handle) => match handle.panic_all() {
            Ok(()) => CommandResult::Message(
                "🎹 MIDI Panic: pending echoes dropped, All Notes Off sent to all channels"
                    .yellow()
                    .to_string(),
            ),
            Err(e) => CommandResult::Error(format!("Failed to send MIDI panic: {}", e)),
        },
        None => CommandResult::Message("Pending echoes dropped".yellow().to_string()),
    }
}
