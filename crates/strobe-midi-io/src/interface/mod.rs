//! One MIDI controller: an input port, its correlated output port, accept
//! flags and an optional mapping file.
//!
//! ## Connection states
//!
//! ```text
//! Closed -> InputOpening -> InputOpen -> OutputOpening -> OutputOpen
//!    ^__________________________|______________________________|   close()
//! ```
//!
//! Opening the output is best effort: a missing, ambiguous or failing output
//! leaves the interface in `InputOpen`. Entering `OutputOpen` sends an
//! identity request; the reply is handled by the mapper's dispatch loop.
//!
//! ## Auto-connect
//!
//! An interface is *used* when any accept flag is set or the mapper holds
//! bindings for it. Every accept flag change opens a used, closed interface
//! and closes an unused, open one.

mod output;
mod shared;

pub use output::MidiOutputHandle;
pub(crate) use shared::InterfaceShared;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use strobe_midi::{DeviceIdentity, MidiEvent, MidiOutputMessage};
use tracing::{debug, info, warn};

use crate::config::InterfaceSettings;
use crate::error::{Error, PortDirection, Result};
use crate::mapper::{LoadReport, MidiMapper};
use crate::mapping::MidiMapping;
use crate::port_name::{resolve_output_port, OutputPortMatch};
use crate::selector::InterfaceId;
use crate::transport::{InputConnection, MidiTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    InputOpening,
    InputOpen,
    OutputOpening,
    OutputOpen,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::InputOpen | Self::OutputOpening | Self::OutputOpen)
    }
}

/// Which decoded message kinds are forwarded to the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AcceptFlags {
    /// Clock, start, stop and continue.
    pub clock: bool,
    pub program_change: bool,
    pub control_change: bool,
    /// Note on and note off.
    pub note: bool,
}

impl AcceptFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            clock: true,
            program_change: true,
            control_change: true,
            note: true,
        }
    }

    pub fn any(&self) -> bool {
        self.clock || self.program_change || self.control_change || self.note
    }

    pub fn accepts(&self, event: &MidiEvent) -> bool {
        match event {
            MidiEvent::Clock | MidiEvent::Start | MidiEvent::Stop | MidiEvent::Continue => {
                self.clock
            }
            MidiEvent::ProgramChange { .. } => self.program_change,
            MidiEvent::ControlChange { .. } => self.control_change,
            MidiEvent::NoteOn { .. } | MidiEvent::NoteOff { .. } => self.note,
            MidiEvent::SysEx { .. } | MidiEvent::Unknown { .. } => false,
        }
    }
}

/// Notifications delivered to [`MidiInterface::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceEvent {
    Connected {
        input: String,
        output: Option<String>,
    },
    Disconnected,
    /// The device answered the identity request.
    Identified(DeviceIdentity),
    /// An accepted event, before routing.
    Midi(MidiEvent),
}

/// A MIDI controller attached to the mapper.
///
/// Configuration calls on one interface must be serialized by the caller;
/// incoming messages are handled on whichever thread drains the mapper queue.
pub struct MidiInterface {
    port_name: String,
    transport: Arc<dyn MidiTransport>,
    mapper: MidiMapper,
    shared: Arc<InterfaceShared>,
    input: Option<Box<dyn InputConnection>>,
    state: ConnectionState,
    mapping_file: Option<PathBuf>,
    output_match: Option<OutputPortMatch>,
}

impl MidiInterface {
    pub fn new(
        port_name: impl Into<String>,
        transport: Arc<dyn MidiTransport>,
        mapper: &MidiMapper,
    ) -> Self {
        Self {
            port_name: port_name.into(),
            transport,
            mapper: mapper.clone(),
            shared: Arc::new(InterfaceShared::new()),
            input: None,
            state: ConnectionState::Closed,
            mapping_file: None,
            output_match: None,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Assigned on the first successful open, kept across reconnects.
    pub fn id(&self) -> Option<InterfaceId> {
        self.shared.id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.input.is_some()
    }

    pub fn has_output(&self) -> bool {
        self.shared.output.is_open()
    }

    pub fn output(&self) -> MidiOutputHandle {
        self.shared.output.clone()
    }

    /// Outcome of the last output port lookup.
    pub fn output_match(&self) -> Option<&OutputPortMatch> {
        self.output_match.as_ref()
    }

    /// Identity reported by the device since the interface was opened.
    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.shared.identity()
    }

    pub fn mapping_file(&self) -> Option<&Path> {
        self.mapping_file.as_deref()
    }

    pub fn accept_flags(&self) -> AcceptFlags {
        self.shared.accept_flags()
    }

    pub fn subscribe(&self) -> Receiver<InterfaceEvent> {
        self.shared.subscribe()
    }

    // ==================== Connection ====================

    /// Open the input port named like this interface, then its output.
    pub fn open(&mut self) -> Result<()> {
        if self.input.is_some() {
            return Err(Error::AlreadyOpen(PortDirection::Input));
        }

        let index = self.find_input_port()?;

        // Registered and marked connected before the callback goes live so
        // the first bytes from the device are not lost
        let id = match self.shared.id() {
            Some(id) => id,
            None => {
                let id = self.mapper.allocate_interface_id();
                self.shared.assign_id(id);
                id
            }
        };
        self.mapper.register_interface(id, &self.shared);
        self.shared.set_connected(true);

        self.state = ConnectionState::InputOpening;
        let callback = self.shared.input_callback(self.mapper.inbound_sender());
        let input = match self.transport.connect_input(index, callback) {
            Ok(input) => input,
            Err(e) => {
                self.shared.set_connected(false);
                self.state = ConnectionState::Closed;
                return Err(e);
            }
        };
        self.input = Some(input);
        self.state = ConnectionState::InputOpen;
        info!(port = %self.port_name, id, "MIDI input opened");

        self.open_output();

        self.shared.notify(InterfaceEvent::Connected {
            input: self.port_name.clone(),
            output: self.shared.output.port_name(),
        });

        if self.mapping_file.is_some() {
            if let Err(e) = self.reload_mapping() {
                warn!(port = %self.port_name, error = %e, "MIDI mapping not loaded");
            }
        }
        Ok(())
    }

    /// Rename the interface to `port_name` and open it.
    pub fn open_port(&mut self, port_name: impl Into<String>) -> Result<()> {
        if self.input.is_some() {
            return Err(Error::AlreadyOpen(PortDirection::Input));
        }
        self.port_name = port_name.into();
        self.open()
    }

    fn find_input_port(&self) -> Result<usize> {
        self.transport
            .input_port_names()?
            .iter()
            .position(|name| *name == self.port_name)
            .ok_or_else(|| Error::PortNotFound(self.port_name.clone()))
    }

    fn open_output(&mut self) {
        if self.shared.output.is_open() {
            debug!(port = %self.port_name, "{}", Error::AlreadyOpen(PortDirection::Output));
            return;
        }

        let outputs = match self.transport.output_port_names() {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!(port = %self.port_name, error = %e, "MIDI output enumeration failed");
                return;
            }
        };

        let matched = resolve_output_port(&self.port_name, &outputs);
        self.output_match = Some(matched.clone());
        let index = match matched {
            OutputPortMatch::Unique(index) => index,
            OutputPortMatch::Ambiguous(candidates) => {
                let names: Vec<&str> = candidates.iter().map(|&i| outputs[i].as_str()).collect();
                warn!(
                    port = %self.port_name,
                    candidates = ?names,
                    "several MIDI outputs match, none opened"
                );
                return;
            }
            other => {
                debug!(port = %self.port_name, "no MIDI output: {other}");
                return;
            }
        };

        self.state = ConnectionState::OutputOpening;
        match self.transport.connect_output(index) {
            Ok(connection) => {
                self.shared.output.attach(connection);
                self.state = ConnectionState::OutputOpen;
                info!(port = %self.port_name, output = %outputs[index], "MIDI output opened");
                if let Err(e) = self.send_identity_request() {
                    warn!(port = %self.port_name, error = %e, "identity request not sent");
                }
            }
            Err(e) => {
                self.state = ConnectionState::InputOpen;
                warn!(
                    port = %self.port_name,
                    output = %outputs[index],
                    error = %e,
                    "MIDI output not opened"
                );
            }
        }
    }

    /// Release both ports and drop the live bindings.
    ///
    /// Keeps the id, accept flags and mapping file. No-op when closed.
    pub fn close(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };
        drop(input);
        self.shared.output.detach();
        self.shared.set_connected(false);
        self.shared.clear_identity();
        self.state = ConnectionState::Closed;
        info!(port = %self.port_name, "MIDI interface closed");

        self.shared.notify(InterfaceEvent::Disconnected);
        if let Some(id) = self.shared.id() {
            self.mapper.flush_midi_mapping(id);
        }
    }

    /// Any accept flag set, or bindings present.
    pub fn is_used(&self) -> bool {
        self.shared.accept_flags().any()
            || self
                .shared
                .id()
                .is_some_and(|id| self.mapper.has_bindings(id))
    }

    fn auto_connect(&mut self) {
        let used = self.is_used();
        if used && !self.is_connected() {
            if let Err(e) = self.open() {
                warn!(port = %self.port_name, error = %e, "MIDI auto-connect failed");
            }
        } else if !used && self.is_connected() {
            self.close();
        }
    }

    // ==================== Accept flags ====================

    pub fn set_accept_clock(&mut self, accept: bool) {
        self.shared.update_accept(|flags| flags.clock = accept);
        self.auto_connect();
    }

    pub fn set_accept_program_change(&mut self, accept: bool) {
        self.shared.update_accept(|flags| flags.program_change = accept);
        self.auto_connect();
    }

    pub fn set_accept_control_change(&mut self, accept: bool) {
        self.shared.update_accept(|flags| flags.control_change = accept);
        self.auto_connect();
    }

    pub fn set_accept_note(&mut self, accept: bool) {
        self.shared.update_accept(|flags| flags.note = accept);
        self.auto_connect();
    }

    pub fn set_accept_flags(&mut self, flags: AcceptFlags) {
        self.shared.update_accept(|current| *current = flags);
        self.auto_connect();
    }

    // ==================== Mapping ====================

    /// Associate a mapping file, or clear it.
    ///
    /// Clearing also clears every accept flag, which closes the interface.
    /// A file that cannot be loaded is treated the same way, and the load
    /// error is returned.
    pub fn set_mapping_file(&mut self, path: Option<PathBuf>) -> Result<()> {
        if let Some(id) = self.shared.id().filter(|_| self.is_connected()) {
            self.mapper.flush_midi_mapping(id);
        }

        match path {
            None => {
                self.mapping_file = None;
                self.set_accept_flags(AcceptFlags::none());
                Ok(())
            }
            Some(path) => {
                self.mapping_file = Some(path);
                if self.is_connected() {
                    self.reload_mapping().map(|_| ())
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Load the mapping file into the mapper.
    pub fn reload_mapping(&mut self) -> Result<LoadReport> {
        let id = match self.shared.id() {
            Some(id) if self.is_connected() => id,
            _ => return Err(Error::NotConnected(self.port_name.clone())),
        };
        let Some(path) = self.mapping_file.clone() else {
            return Ok(LoadReport::default());
        };

        let mapping = match MidiMapping::load(&path) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(
                    port = %self.port_name,
                    path = %path.display(),
                    error = %e,
                    "invalid MIDI mapping, reverting to no mapping"
                );
                self.set_mapping_file(None)?;
                return Err(e);
            }
        };

        self.mapper.flush_midi_mapping(id);
        let report = self.mapper.load_midi_mapping(id, &mapping);
        info!(
            port = %self.port_name,
            path = %path.display(),
            bound = report.bound.len(),
            failed = report.failed.len(),
            "MIDI mapping loaded"
        );
        Ok(report)
    }

    /// Bindings currently live on this interface, learned ones included.
    pub fn active_mapping(&self) -> MidiMapping {
        self.shared
            .id()
            .and_then(|id| self.mapper.active_mapping(id))
            .unwrap_or_default()
    }

    /// Write the live bindings to `path`.
    pub fn save_mapping(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected(self.port_name.clone()));
        }
        self.active_mapping().save(path)
    }

    // ==================== Settings ====================

    pub fn settings(&self) -> InterfaceSettings {
        InterfaceSettings::new(
            self.port_name.clone(),
            self.accept_flags(),
            self.mapping_file.clone(),
        )
    }

    /// Apply persisted settings: port, accept flags and mapping file.
    pub fn apply_settings(&mut self, settings: &InterfaceSettings) -> Result<()> {
        if settings.port != self.port_name {
            if self.is_connected() {
                return Err(Error::InvalidConfig(format!(
                    "cannot move open interface '{}' to '{}'",
                    self.port_name, settings.port
                )));
            }
            self.port_name = settings.port.clone();
        }

        self.shared.update_accept(|flags| *flags = settings.accept_flags());

        if self.mapping_file != settings.mapping {
            self.mapping_file = settings.mapping.clone();
            if self.is_connected() {
                if self.mapping_file.is_some() {
                    if let Err(e) = self.reload_mapping() {
                        debug!(
                            port = %self.port_name,
                            error = %e,
                            "mapping from settings not loaded"
                        );
                    }
                } else if let Some(id) = self.shared.id() {
                    self.mapper.flush_midi_mapping(id);
                }
            }
        }

        self.auto_connect();
        Ok(())
    }

    // ==================== Output ====================

    /// No-op without an output.
    pub fn send_control_change(&self, channel: u8, control: u8, value: u8) -> Result<()> {
        self.shared.output.send_control_change(channel, control, value)
    }

    /// No-op without an output.
    pub fn send_message(&self, bytes: &[u8]) -> Result<()> {
        self.shared.output.send(bytes)
    }

    /// Probe the device; the reply arrives as [`InterfaceEvent::Identified`].
    pub fn send_identity_request(&self) -> Result<()> {
        self.shared
            .output
            .send_message(&MidiOutputMessage::identity_request())
    }
}

impl Drop for MidiInterface {
    fn drop(&mut self) {
        self.close();
        if let Some(id) = self.shared.id() {
            self.mapper.unregister_interface(id);
        }
    }
}

impl std::fmt::Debug for MidiInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiInterface")
            .field("port_name", &self.port_name)
            .field("id", &self.id())
            .field("state", &self.state)
            .field("accept", &self.accept_flags())
            .field("mapping_file", &self.mapping_file)
            .finish()
    }
}
