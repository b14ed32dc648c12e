//! MIDI output
//!
//! Thread-safe MIDI output using midir. The connection lives on a dedicated
//! thread; the handle only sends it commands, so note-on/off can be issued
//! from the timer thread without blocking on the port.

use anyhow::{anyhow, Result};
use midir::{MidiOutput, MidiOutputConnection};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, RwLock};
use std::thread::{self, JoinHandle};

const CLIENT_NAME: &str = "Fractal Echo";

/// Clamp an engine value into the 7-bit MIDI data range
pub fn clamp_midi(value: i32) -> u8 {
    value.clamp(0, 127) as u8
}

/// Commands that can be sent to the MIDI output thread
#[derive(Debug, Clone)]
pub enum MidiCommand {
    /// Connect to the first port whose name contains `port_name`; the
    /// matched port name, or the failure, is sent back on `reply`
    Connect {
        port_name: String,
        reply: Sender<Result<String, String>>,
    },
    /// Send Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Send Note Off: channel (0-15), note (0-127)
    NoteOff { channel: u8, note: u8 },
    /// Send All Notes Off on specified channel
    AllNotesOff { channel: u8 },
    Disconnect,
    Shutdown,
}

/// Owns the connection on the MIDI thread
struct MidiOutputInternal {
    connection: Option<MidiOutputConnection>,
    command_rx: Receiver<MidiCommand>,
}

impl MidiOutputInternal {
    fn new(command_rx: Receiver<MidiCommand>) -> Self {
        Self {
            connection: None,
            command_rx,
        }
    }

    fn connect(&mut self, port_name: &str) -> Result<String> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let port = find_port(&midi_out, port_name)?;
        let actual_name = midi_out.port_name(&port)?;
        let connection = midi_out
            .connect(&port, "fractal-echo-out")
            .map_err(|e| anyhow!("{}", e))?;
        self.connection = Some(connection);
        Ok(actual_name)
    }

    fn send(&mut self, message: &[u8]) {
        if let Some(conn) = &mut self.connection {
            if let Err(e) = conn.send(message) {
                log::warn!("MIDI send failed for {:02X?}: {}", message, e);
            }
        }
    }

    fn run(&mut self) {
        while let Ok(cmd) = self.command_rx.recv() {
            match cmd {
                MidiCommand::Connect { port_name, reply } => {
                    let result = self.connect(&port_name).map_err(|e| {
                        log::warn!("MIDI connect to '{}' failed: {}", port_name, e);
                        e.to_string()
                    });
                    let _ = reply.send(result);
                }
                MidiCommand::NoteOn {
                    channel,
                    note,
                    velocity,
                } => {
                    // Note On: 0x90 + channel, note, velocity
                    self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
                }
                MidiCommand::NoteOff { channel, note } => {
                    self.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
                }
                MidiCommand::AllNotesOff { channel } => {
                    // All Notes Off: CC 123, value 0
                    self.send(&[0xB0 | (channel & 0x0F), 123, 0]);
                }
                MidiCommand::Disconnect => {
                    self.connection = None;
                }
                MidiCommand::Shutdown => {
                    for ch in 0..16u8 {
                        self.send(&[0xB0 | ch, 123, 0]);
                    }
                    break;
                }
            }
        }
    }
}

fn find_port(midi_out: &MidiOutput, port_name: &str) -> Result<midir::MidiOutputPort> {
    midi_out
        .ports()
        .into_iter()
        .find(|p| {
            midi_out
                .port_name(p)
                .map(|name| name.contains(port_name))
                .unwrap_or(false)
        })
        .ok_or_else(|| anyhow!("MIDI port '{}' not found", port_name))
}

/// Thread-safe handle to the MIDI output thread
pub struct MidiOutputHandle {
    command_tx: Mutex<Sender<MidiCommand>>,
    _thread: JoinHandle<()>,
    /// Output channel, 0-indexed
    channel: AtomicU8,
    /// Sounding copies per (channel, note); a key is released on the wire
    /// only when its last copy ends
    active_notes: Mutex<HashMap<(u8, u8), usize>>,
    /// Name of the connected port
    port_name: RwLock<Option<String>>,
}

impl MidiOutputHandle {
    /// Create a new MIDI output handle (not connected to any port yet)
    pub fn new() -> Result<Self> {
        let (tx, rx) = channel();

        let thread = thread::Builder::new()
            .name("fractal-echo-midi".to_string())
            .spawn(move || MidiOutputInternal::new(rx).run())?;

        Ok(Self {
            command_tx: Mutex::new(tx),
            _thread: thread,
            channel: AtomicU8::new(0),
            active_notes: Mutex::new(HashMap::new()),
            port_name: RwLock::new(None),
        })
    }

    fn send(&self, cmd: MidiCommand) -> Result<()> {
        let tx = self
            .command_tx
            .lock()
            .map_err(|_| anyhow!("MIDI command channel poisoned"))?;
        tx.send(cmd)
            .map_err(|e| anyhow!("MIDI thread is gone: {}", e))
    }

    /// List available MIDI output ports.
    /// Creating the client occasionally fails on macOS, so retry a few times.
    pub fn list_ports() -> Result<Vec<String>> {
        let mut last_err = None;
        for attempt in 0..3 {
            if attempt > 0 {
                thread::sleep(std::time::Duration::from_millis(100));
            }
            match MidiOutput::new(CLIENT_NAME) {
                Ok(midi_out) => {
                    return Ok(midi_out
                        .ports()
                        .iter()
                        .filter_map(|p| midi_out.port_name(p).ok())
                        .collect());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(anyhow!(
            "MIDI initialization failed after 3 attempts: {:?}",
            last_err
        ))
    }

    /// Connect to a MIDI output port by name (partial match supported).
    /// Returns once the MIDI thread has opened the port.
    pub fn connect(&self, port_name: &str) -> Result<String> {
        let (reply_tx, reply_rx) = channel();
        self.send(MidiCommand::Connect {
            port_name: port_name.to_string(),
            reply: reply_tx,
        })?;
        let actual_name = reply_rx
            .recv()
            .map_err(|_| anyhow!("MIDI thread exited while connecting"))?
            .map_err(|e| anyhow!(e))?;

        let mut stored = self.port_name.write().unwrap_or_else(|e| e.into_inner());
        *stored = Some(actual_name.clone());
        log::info!("connected to MIDI port {}", actual_name);
        Ok(actual_name)
    }

    /// Disconnect from the current MIDI port
    pub fn disconnect(&self) -> Result<()> {
        self.send(MidiCommand::Disconnect)?;

        *self.port_name.write().unwrap_or_else(|e| e.into_inner()) = None;
        if let Ok(mut notes) = self.active_notes.lock() {
            notes.clear();
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected_port().is_some()
    }

    /// Name of the connected port
    pub fn connected_port(&self) -> Option<String> {
        self.port_name
            .read()
            .map(|p| p.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Set the output channel (0-indexed)
    pub fn set_channel(&self, channel: u8) {
        self.channel.store(channel & 0x0F, Ordering::Relaxed);
    }

    /// Output channel (0-indexed)
    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    pub fn note_on(&self, note: u8, velocity: u8) -> Result<()> {
        let channel = self.channel();
        if let Ok(mut notes) = self.active_notes.lock() {
            *notes.entry((channel, note)).or_insert(0) += 1;
        }
        self.send(MidiCommand::NoteOn {
            channel,
            note,
            velocity,
        })
    }

    /// Release one copy of `note` on the channel it was struck on. The Note
    /// Off is sent only when no other copy of that key is still sounding.
    pub fn note_off(&self, channel: u8, note: u8) -> Result<()> {
        if let Ok(mut notes) = self.active_notes.lock() {
            if let Some(count) = notes.get_mut(&(channel, note)) {
                *count -= 1;
                if *count > 0 {
                    return Ok(());
                }
                notes.remove(&(channel, note));
            }
        }
        self.send(MidiCommand::NoteOff { channel, note })
    }

    /// Number of distinct keys currently held
    pub fn held_notes(&self) -> usize {
        self.active_notes.lock().map(|n| n.len()).unwrap_or(0)
    }

    /// Send All Notes Off on all channels (MIDI panic)
    pub fn panic_all(&self) -> Result<()> {
        for ch in 0..16u8 {
            self.send(MidiCommand::AllNotesOff { channel: ch })?;
        }
        if let Ok(mut notes) = self.active_notes.lock() {
            notes.clear();
        }
        Ok(())
    }
}

impl Drop for MidiOutputHandle {
    fn drop(&mut self) {
        let _ = self.send(MidiCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_midi() {
        assert_eq!(clamp_midi(60), 60);
        assert_eq!(clamp_midi(-3), 0);
        assert_eq!(clamp_midi(127), 127);
        assert_eq!(clamp_midi(300), 127);
    }

    #[test]
    fn test_channel_setting() {
        let handle = MidiOutputHandle::new().unwrap();
        assert_eq!(handle.channel(), 0);

        handle.set_channel(9);
        assert_eq!(handle.channel(), 9);

        // Masked into the 4-bit channel range
        handle.set_channel(17);
        assert_eq!(handle.channel(), 1);
    }

    #[test]
    fn test_held_notes_tracking() {
        let handle = MidiOutputHandle::new().unwrap();
        assert!(!handle.is_connected());

        // Unconnected output still tracks what it was asked to hold
        handle.note_on(60, 100).unwrap();
        handle.note_on(67, 90).unwrap();
        assert_eq!(handle.held_notes(), 2);

        handle.note_off(0, 60).unwrap();
        assert_eq!(handle.held_notes(), 1);

        handle.panic_all().unwrap();
        assert_eq!(handle.held_notes(), 0);
    }

    #[test]
    fn test_overlapping_copies_hold_the_key() {
        let handle = MidiOutputHandle::new().unwrap();

        handle.note_on(60, 100).unwrap();
        handle.note_on(60, 80).unwrap();
        assert_eq!(handle.held_notes(), 1);

        // The earlier copy ending must not cut off the later one
        handle.note_off(0, 60).unwrap();
        assert_eq!(handle.held_notes(), 1);

        handle.note_off(0, 60).unwrap();
        assert_eq!(handle.held_notes(), 0);
    }

    #[test]
    fn test_failed_connect_leaves_output_disconnected() {
        let handle = MidiOutputHandle::new().unwrap();

        let result = handle.connect("no-such-port-\u{1F3B9}-fractal-echo");
        assert!(result.is_err());
        assert!(!handle.is_connected());
        assert_eq!(handle.connected_port(), None);
    }
}
