//! Pattern inspection commands (taps, events, lanes, layout, json)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use fractal_echo_core::viz::{self, Bounds, Rgb};
use std::collections::HashSet;

/// Handle `taps` - the base tap offsets of the current pattern
pub fn cmd_taps(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let pattern = ctx.echo.pattern();
    let taps: Vec<String> = pattern.taps.iter().map(|t| format!("{}ms", t)).collect();
    CommandResult::Message(format!("Taps: {}", taps.join(", ").cyan()))
}

/// Handle `events` - the flat list, in firing order
pub fn cmd_events(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let pattern = ctx.echo.pattern();
    let mut output = format!(
        "{} ({} notes over {}ms)\n",
        "Events:".bold(),
        pattern.summary.total_notes,
        pattern.summary.total_duration_ms
    );
    output.push_str(&format!(
        "  {:>4} {:>8} {:>5} {:>7} {:>6} {:>6}\n",
        "id", "time", "level", "vel", "pitch", "dur"
    ));
    for event in &pattern.events {
        output.push_str(&format!(
            "  {:>4} {:>6}ms {:>5} {:>7.3} {:>+6} {:>4}ms\n",
            event.id,
            event.offset_ms,
            event.level,
            event.velocity_coeff,
            event.pitch_delta,
            event.duration
        ));
    }
    CommandResult::Message(output.trim_end().to_string())
}

/// Handle `lanes` - the lane tree in generation order
pub fn cmd_lanes(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let pattern = ctx.echo.pattern();
    let mut output = format!("{} ({})\n", "Lanes:".bold(), pattern.lanes.len());

    for (idx, lane) in pattern.lanes.iter().enumerate() {
        let header = match lane.link {
            None => format!("lane {} (root)", idx),
            Some(link) => format!(
                "lane {} ← lane {} @ {}ms",
                idx, link.parent_lane_index, link.offset_ms
            ),
        };
        let notes: Vec<String> = lane
            .notes
            .iter()
            .map(|n| format!("{}ms", n.offset_ms))
            .collect();
        output.push_str(&format!("  {}: {}\n", header.cyan(), notes.join(" ")));
    }
    CommandResult::Message(output.trim_end().to_string())
}

/// Handle `layout` - lane geometry in the default drawing bounds
pub fn cmd_layout(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let pattern = ctx.echo.pattern();
    let active: HashSet<usize> = ctx
        .echo
        .scheduler()
        .activity()
        .map(|tracker| tracker.active_ids(pattern.generation))
        .unwrap_or_default();

    let shapes = viz::layout(&pattern.lanes, &active, &Bounds::default());
    let mut output = format!("{}\n", "Layout:".bold());
    for shape in &shapes {
        output.push_str(&format!(
            "  lane {} {} bar x {:.2}..{:.2} y {:.2}",
            shape.lane_index,
            hex(shape.color),
            shape.bar.x0,
            shape.bar.x1,
            (shape.bar.y0 + shape.bar.y1) / 2.0
        ));
        if let Some(connector) = shape.connector {
            output.push_str(&format!(" ↕ to y {:.2}", connector.y1));
        }
        output.push('\n');
        for circle in &shape.notes {
            let marker = if circle.active { "●" } else { "○" };
            output.push_str(&format!(
                "    {} #{} at {:.2} r {:.3}\n",
                marker, circle.id, circle.x, circle.radius
            ));
        }
    }
    CommandResult::Message(output.trim_end().to_string())
}

/// Handle `json` - the current pattern, for external visualizers
pub fn cmd_json(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let pattern = ctx.echo.pattern();
    match serde_json::to_string_pretty(&*pattern) {
        Ok(json) => CommandResult::Message(json),
        Err(e) => CommandResult::Error(format!("Failed to serialize pattern: {}", e)),
    }
}

fn hex(color: Rgb) -> String {
    let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", byte(color.r), byte(color.g), byte(color.b))
}
