//! REPL (Read-Eval-Print Loop) driving the echo engine

use crate::audio::{EchoOutput, MidiOutputHandle, TimerThread};
use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::config::Config;
use anyhow::{anyhow, Result};
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use fractal_echo_core::{ActivityTracker, EchoScheduler, FractalEcho};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::thread;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// Interactive shell around a single [`FractalEcho`]
pub struct Repl {
    editor: Option<DefaultEditor>,
    echo: Arc<FractalEcho>,
    timer: Arc<TimerThread>,
    midi_handle: Arc<MidiOutputHandle>,

    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
}

impl Repl {
    /// Create a new REPL instance wired to the wall clock and MIDI output
    pub fn new(config: &Config) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        let timer = Arc::new(TimerThread::new());

        let midi_handle = Arc::new(MidiOutputHandle::new()?);
        midi_handle.set_channel(config.midi_channel.saturating_sub(1));
        if let Some(port) = &config.midi_port {
            // A missing port is not fatal; echoes fall back to the console
            if let Err(e) = midi_handle.connect(port) {
                log::warn!("could not connect to MIDI port '{}': {}", port, e);
                println!("{} {}", "MIDI:".yellow(), e);
            }
        }

        let output = Arc::new(EchoOutput::new(midi_handle.clone(), timer.clone()));
        let mut scheduler = EchoScheduler::new(timer.clone(), output);
        if config.highlight {
            scheduler = scheduler.with_activity(ActivityTracker::new());
        }
        let echo = Arc::new(FractalEcho::new(scheduler));

        let (tx_input, rx_input) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            echo,
            timer,
            midi_handle,
            tx_input,
            rx_input,
        })
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "🎵".bright_yellow(),
            "Fractal Echo".bright_cyan().bold()
        );
        println!(
            "Try: {}, {}, {}",
            "velocity 100".cyan(),
            "note 60".cyan(),
            "set stretch 0.5".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        // Move editor to thread
        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "echo>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        let registry = create_registry();
        let mut ctx = CommandContext::new_with_midi(
            self.echo.clone(),
            self.timer.clone(),
            self.midi_handle.clone(),
        );

        while let Ok(ReplEvent::Input(res)) = self.rx_input.recv() {
            match res {
                Ok(line) => {
                    if !handle_line(&registry, &mut ctx, &line) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!("{} 🎵", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    println!(
                        "{} {}",
                        "Error reading input:".bright_red().bold(),
                        err.to_string().red()
                    );
                }
            }
        }

        self.timer.clear();
        Ok(())
    }
}

/// Run one input line; returns false when the REPL should exit
fn handle_line(registry: &CommandRegistry, ctx: &mut CommandContext, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    match registry.execute(line, ctx) {
        CommandResult::Success => {}
        CommandResult::Message(msg) => println!("{}", msg),
        CommandResult::Exit => {
            println!("{} 🎵", "Goodbye!".bright_cyan());
            return false;
        }
        CommandResult::Error(e) => {
            println!("{} {}", "Error:".bright_red().bold(), e.red());
        }
        CommandResult::NotACommand => {
            println!(
                "{} unknown command '{}' (type '{}')",
                "Error:".bright_red().bold(),
                line.red(),
                "help".bright_green()
            );
        }
    }
    true
}

/// Convenience function to start the REPL
pub fn start(config: &Config) -> Result<()> {
    let mut repl = Repl::new(config).map_err(|e| anyhow!("Failed to initialize REPL: {}", e))?;
    repl.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::harness;

    #[test]
    fn test_lines_keep_the_loop_alive_until_quit() {
        let registry = create_registry();
        let mut h = harness();

        assert!(handle_line(&registry, &mut h.ctx, ""));
        assert!(handle_line(&registry, &mut h.ctx, "params"));
        assert!(handle_line(&registry, &mut h.ctx, "wobble"));
        assert!(handle_line(&registry, &mut h.ctx, "set decay lots"));
        assert!(!handle_line(&registry, &mut h.ctx, "exit"));
    }

    #[test]
    fn test_session_drives_the_engine() {
        let registry = create_registry();
        let mut h = harness();

        for line in ["set base2 0", "set iterations 1", "velocity 80", "note 48"] {
            assert!(handle_line(&registry, &mut h.ctx, line));
        }
        h.clock.run_until_idle();

        let fired = h.sink.fired();
        assert_eq!(fired.len(), 2);
        assert_eq!((fired[0].note, fired[0].velocity), (48, 80));
        assert_eq!(fired[1].velocity, 72);
    }
}
