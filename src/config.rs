//! Startup configuration from the environment (and `.env`, loaded in `main`)

use anyhow::{bail, Context, Result};

pub const MIDI_PORT_VAR: &str = "FRACTAL_ECHO_MIDI_PORT";
pub const MIDI_CHANNEL_VAR: &str = "FRACTAL_ECHO_MIDI_CHANNEL";
pub const HIGHLIGHT_VAR: &str = "FRACTAL_ECHO_HIGHLIGHT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port name substring to connect to at startup
    pub midi_port: Option<String>,
    /// Output channel, 1-16
    pub midi_channel: u8,
    /// Track which notes are sounding for the `layout` view
    pub highlight: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            midi_port: None,
            midi_channel: 1,
            highlight: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and empty values take the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Config::default();

        config.midi_port = get(MIDI_PORT_VAR);

        if let Some(raw) = get(MIDI_CHANNEL_VAR) {
            let channel: u8 = raw
                .parse()
                .with_context(|| format!("{} must be a number, got '{}'", MIDI_CHANNEL_VAR, raw))?;
            if !(1..=16).contains(&channel) {
                bail!("{} must be 1-16, got {}", MIDI_CHANNEL_VAR, channel);
            }
            config.midi_channel = channel;
        }

        if let Some(raw) = get(HIGHLIGHT_VAR) {
            config.highlight = match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => bail!("{} must be true or false, got '{}'", HIGHLIGHT_VAR, raw),
            };
        }

        Ok(config)
    }
}
