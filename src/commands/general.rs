//! General REPL commands (help, quit)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use fractal_echo_core::ParamSlot;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(help_text())
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

fn help_text() -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line(format!("{}", "🎵 Fractal Echo Help".bold()));
    line(format!("{}", "===================".bold()));
    line(String::new());
    line(format!("{}", "Parameters:".green()));
    line(format!(
        "  {}  - Set a slot by name or index",
        "set <slot|index> <value>".cyan()
    ));
    line(format!(
        "  {}                 - Set the note (echoes if velocity > 0)",
        "note <n>".cyan()
    ));
    line(format!(
        "  {}             - Set the velocity (0 = silent)",
        "velocity <v>".cyan()
    ));
    line(format!(
        "  {}    - Trigger now with stored or given values",
        "play [note] [velocity]".cyan()
    ));
    line(format!(
        "  {}                   - Show all slots",
        "params".cyan()
    ));
    line(String::new());
    line(format!("{}", "Slots:".green()));
    for slot in ParamSlot::ALL {
        line(format!(
            "  {:>2} {:<10} {}",
            slot.index(),
            slot.name().cyan(),
            slot.description().dimmed()
        ));
    }
    line(String::new());
    line(format!("{}", "Pattern:".green()));
    line(format!("  {}  - Base tap offsets", "taps".cyan()));
    line(format!("  {}  - Flat event list, by time", "events".cyan()));
    line(format!("  {}  - Lane tree", "lanes".cyan()));
    line(format!("  {}  - Lane geometry for drawing", "layout".cyan()));
    line(format!("  {}  - Current pattern as JSON", "json".cyan()));
    line(String::new());
    line(format!("{}", "MIDI:".green()));
    line(format!(
        "  {}",
        "midi devices | connect <port> | disconnect | channel <1-16> | status | panic".cyan()
    ));
    line(String::new());
    line(format!(
        "Type '{}' or press {} to exit.",
        "quit".bright_red(),
        "Ctrl+C".bright_red()
    ));
    out
}
