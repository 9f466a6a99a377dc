//! Keys identifying a physical control.

use std::fmt;

use serde::{Deserialize, Serialize};
use strobe_midi::{MidiChannel, MidiEvent};

/// Identifier handed out to a [`MidiInterface`](crate::MidiInterface) on its
/// first successful open. Never reused while the mapper lives.
pub type InterfaceId = u32;

/// Channel and controller (or note) number, independent of any device.
///
/// Notes and control changes share the same number space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControlAddress {
    pub channel: MidiChannel,
    pub control: u8,
}

impl ControlAddress {
    pub fn new(channel: MidiChannel, control: u8) -> Self {
        Self { channel, control }
    }

    pub fn from_event(event: &MidiEvent) -> Option<Self> {
        Some(Self {
            channel: event.channel()?,
            control: event.control_or_note()?,
        })
    }

    pub fn on(self, interface: InterfaceId) -> ControlSelector {
        ControlSelector {
            interface,
            channel: self.channel,
            control: self.control,
        }
    }
}

impl fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{} #{}", self.channel, self.control)
    }
}

/// Live routing key: a control on a specific interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlSelector {
    pub interface: InterfaceId,
    pub channel: MidiChannel,
    pub control: u8,
}

impl ControlSelector {
    pub fn new(interface: InterfaceId, channel: MidiChannel, control: u8) -> Self {
        Self {
            interface,
            channel,
            control,
        }
    }

    /// Selector addressed by a control change or note event.
    pub fn from_event(interface: InterfaceId, event: &MidiEvent) -> Option<Self> {
        ControlAddress::from_event(event).map(|address| address.on(interface))
    }

    pub fn address(&self) -> ControlAddress {
        ControlAddress {
            channel: self.channel,
            control: self.control,
        }
    }
}

impl fmt::Display for ControlSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if{} {}", self.interface, self.address())
    }
}
