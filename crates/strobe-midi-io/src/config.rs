//! Persisted per-port MIDI settings.
//!
//! ```toml
//! [[interface]]
//! port = "nanoKONTROL2 28:0"
//! accept_control_change = true
//! mapping = "mappings/nanokontrol2.toml"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::interface::AcceptFlags;

/// Settings of one interface, keyed by its port name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSettings {
    pub port: String,
    #[serde(default)]
    pub accept_clock: bool,
    #[serde(default)]
    pub accept_program_change: bool,
    #[serde(default)]
    pub accept_control_change: bool,
    #[serde(default)]
    pub accept_note: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<PathBuf>,
}

impl InterfaceSettings {
    pub fn new(port: impl Into<String>, accept: AcceptFlags, mapping: Option<PathBuf>) -> Self {
        Self {
            port: port.into(),
            accept_clock: accept.clock,
            accept_program_change: accept.program_change,
            accept_control_change: accept.control_change,
            accept_note: accept.note,
            mapping,
        }
    }

    pub fn accept_flags(&self) -> AcceptFlags {
        AcceptFlags {
            clock: self.accept_clock,
            program_change: self.accept_program_change,
            control_change: self.accept_control_change,
            note: self.accept_note,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiSettings {
    #[serde(default, rename = "interface")]
    pub interfaces: Vec<InterfaceSettings>,
}

impl MidiSettings {
    pub fn get(&self, port: &str) -> Option<&InterfaceSettings> {
        self.interfaces.iter().find(|s| s.port == port)
    }

    /// Insert or replace the entry for `settings.port`.
    pub fn upsert(&mut self, settings: InterfaceSettings) {
        match self.interfaces.iter_mut().find(|s| s.port == settings.port) {
            Some(existing) => *existing = settings,
            None => self.interfaces.push(settings),
        }
    }

    pub fn remove(&mut self, port: &str) -> Option<InterfaceSettings> {
        let index = self.interfaces.iter().position(|s| s.port == port)?;
        Some(self.interfaces.remove(index))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        toml::from_str(&text).map_err(|e| {
            Error::InvalidConfig(format!("{}: {e}", path.as_ref().display()))
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }
}
