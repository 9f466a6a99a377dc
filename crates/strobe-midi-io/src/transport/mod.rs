//! Transport boundary.
//!
//! The runtime only talks to MIDI hardware through [`MidiTransport`]: port
//! enumeration, input connections delivering `(timestamp, bytes)` to a
//! callback, and output connections accepting raw bytes. Dropping a
//! connection closes it.

use crate::error::Result;

mod virtual_port;
pub use virtual_port::VirtualTransport;

#[cfg(feature = "midi-io")]
mod midir_backend;
#[cfg(feature = "midi-io")]
pub use midir_backend::MidirTransport;

/// Receives `(timestamp in microseconds, raw message)` from the transport thread.
pub type InputCallback = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// An open input port. Dropping it stops the callback.
pub trait InputConnection: Send {
    fn port_name(&self) -> &str;
}

/// An open output port.
pub trait OutputConnection: Send {
    fn port_name(&self) -> &str;

    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

pub trait MidiTransport: Send + Sync {
    fn input_port_names(&self) -> Result<Vec<String>>;

    fn output_port_names(&self) -> Result<Vec<String>>;

    /// Connect the input port at `index` of the last enumeration.
    fn connect_input(
        &self,
        index: usize,
        callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>>;

    /// Connect the output port at `index` of the last enumeration.
    fn connect_output(&self, index: usize) -> Result<Box<dyn OutputConnection>>;
}
