//! Shared handle to an interface's output connection.

use std::sync::Arc;

use parking_lot::Mutex;
use strobe_midi::MidiOutputMessage;
use tracing::{trace, warn};

use crate::error::Result;
use crate::transport::OutputConnection;

/// Cloneable handle to the (possibly absent) output of one interface.
///
/// Parameters keep a clone for feedback; the interface attaches and detaches
/// the connection as it opens and closes. Sending without a connection is a
/// silent no-op.
#[derive(Clone, Default)]
pub struct MidiOutputHandle {
    connection: Arc<Mutex<Option<Box<dyn OutputConnection>>>>,
}

impl MidiOutputHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.connection.lock().is_some()
    }

    pub fn port_name(&self) -> Option<String> {
        self.connection
            .lock()
            .as_ref()
            .map(|connection| connection.port_name().to_string())
    }

    pub(crate) fn attach(&self, connection: Box<dyn OutputConnection>) {
        *self.connection.lock() = Some(connection);
    }

    pub(crate) fn detach(&self) -> bool {
        self.connection.lock().take().is_some()
    }

    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.connection.lock();
        let Some(connection) = guard.as_mut() else {
            trace!("no MIDI output open, message discarded");
            return Ok(());
        };
        connection.send(bytes).inspect_err(|e| {
            warn!(port = connection.port_name(), error = %e, "MIDI send failed");
        })
    }

    pub fn send_message(&self, message: &MidiOutputMessage) -> Result<()> {
        self.send(&message.bytes)
    }

    pub fn send_control_change(&self, channel: u8, control: u8, value: u8) -> Result<()> {
        self.send_message(&MidiOutputMessage::control_change(channel, control, value))
    }
}

impl std::fmt::Debug for MidiOutputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiOutputHandle")
            .field("port", &self.port_name())
            .finish()
    }
}
