//! Parameter and trigger commands

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use fractal_echo_core::{ParamChange, ParamError, ParamSlot};

/// Handle `set <slot|index> <value>`
pub fn cmd_set(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        return CommandResult::Error(
            "Usage: set <slot|index> <value>\nUse 'params' to see the slots".to_string(),
        );
    }

    let slot = match ParamSlot::parse(parts[0]) {
        Ok(slot) => slot,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    set_slot(slot, parts[1], ctx)
}

/// Handle `note <n>`
pub fn cmd_note(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("note = {}", ctx.echo.params().note));
    }
    set_slot(ParamSlot::Note, args, ctx)
}

/// Handle `velocity <v>`
pub fn cmd_velocity(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("velocity = {}", ctx.echo.params().velocity));
    }
    set_slot(ParamSlot::Velocity, args, ctx)
}

/// Handle `play [note] [velocity]` - trigger without touching the stored slots
pub fn cmd_play(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() > 2 {
        return CommandResult::Error("Usage: play [note] [velocity]".to_string());
    }

    let stored = ctx.echo.params();
    let note = match parts.first().map(|s| s.parse::<i32>()) {
        None => stored.note,
        Some(Ok(n)) => n,
        Some(Err(_)) => return CommandResult::Error("Note must be an integer".to_string()),
    };
    let velocity = match parts.get(1).map(|s| s.parse::<i32>()) {
        None => stored.velocity,
        Some(Ok(v)) => v,
        Some(Err(_)) => return CommandResult::Error("Velocity must be an integer".to_string()),
    };

    if velocity <= 0 {
        return CommandResult::Message(
            "Velocity is 0, nothing to play (try 'velocity 100')"
                .yellow()
                .to_string(),
        );
    }

    let scheduled = ctx.echo.trigger(note, velocity);
    CommandResult::Message(format!(
        "▶ note {} vel {}: {} echoes scheduled",
        note.to_string().cyan(),
        velocity.to_string().green(),
        scheduled
    ))
}

/// Handle `params` - show every slot with its current value
pub fn cmd_params(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let params = ctx.echo.params();
    let mut output = format!("{}\n", "🎛️  Parameters:".bold());
    for slot in ParamSlot::ALL {
        output.push_str(&format!(
            "  {:>2} {:<10} {:>8}  {}\n",
            slot.index(),
            slot.name(),
            params.get(slot).to_string().cyan(),
            slot.description().dimmed()
        ));
    }
    CommandResult::Message(output.trim_end().to_string())
}

fn set_slot(slot: ParamSlot, raw: &str, ctx: &mut CommandContext) -> CommandResult {
    let value: f64 = match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            let err = ParamError::InvalidValue {
                slot: slot.name(),
                value: raw.trim().to_string(),
            };
            return CommandResult::Error(err.to_string());
        }
    };

    match ctx.echo.set(slot, value) {
        Ok(change) => {
            let stored = ctx.echo.params().get(slot);
            CommandResult::Message(describe_change(slot, stored, &change))
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn describe_change(slot: ParamSlot, stored: f64, change: &ParamChange) -> String {
    let mut msg = format!("{} = {}", slot.name(), stored.to_string().green());
    if let Some(summary) = change.regenerated {
        msg.push_str(&format!(
            " → {} notes over {}ms",
            summary.total_notes, summary.total_duration_ms
        ));
    }
    if change.scheduled > 0 {
        msg.push_str(&format!(" → {} echoes scheduled", change.scheduled));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::harness;

    fn message(result: CommandResult) -> String {
        match result {
            CommandResult::Message(m) => m,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[test]
    fn test_set_by_name_and_index() {
        colored::control::set_override(false);
        let mut h = harness();

        let msg = message(cmd_set("iterations 0", &mut h.ctx));
        assert_eq!(msg, "iterations = 0 → 3 notes over 1070ms");

        message(cmd_set("7 0", &mut h.ctx));
        assert_eq!(h.ctx.echo.params().bases, [500, 0, 0, 0]);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut h = harness();
        assert!(matches!(cmd_set("stretch", &mut h.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_set("wobble 1", &mut h.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_set("12 1", &mut h.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_set("decay lots", &mut h.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_set("decay NaN", &mut h.ctx), CommandResult::Error(_)));
        assert_eq!(h.ctx.echo.params().decay, 0.66);
    }

    #[test]
    fn test_note_triggers_with_stored_velocity() {
        colored::control::set_override(false);
        let mut h = harness();

        message(cmd_velocity("100", &mut h.ctx));
        let msg = message(cmd_note("60", &mut h.ctx));
        assert!(msg.ends_with("7 echoes scheduled"), "{}", msg);

        h.clock.run_until_idle();
        assert_eq!(h.sink.fired().len(), 7);
    }

    #[test]
    fn test_play_uses_arguments_without_storing_them() {
        let mut h = harness();

        message(cmd_play("48 90", &mut h.ctx));
        h.clock.run_until_idle();
        assert_eq!(h.sink.fired()[0].note, 48);
        assert_eq!(h.sink.fired()[0].velocity, 90);

        let params = h.ctx.echo.params();
        assert_eq!((params.note, params.velocity), (0, 0));
    }

    #[test]
    fn test_play_without_velocity_is_silent() {
        let mut h = harness();
        message(cmd_play("", &mut h.ctx));
        assert_eq!(h.clock.pending(), 0);
        assert!(matches!(cmd_play("C4", &mut h.ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_params_shows_every_slot() {
        let mut h = harness();
        let msg = message(cmd_params("", &mut h.ctx));
        assert_eq!(msg.lines().count(), 1 + ParamSlot::ALL.len());
        assert!(msg.contains("dur_decay"));
    }
}
