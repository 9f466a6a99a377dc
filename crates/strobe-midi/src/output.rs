//! Outgoing message construction.

use crate::event::MidiEvent;
use crate::status;
use crate::sysex;

/// Raw bytes ready to be written to an output port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiOutputMessage {
    pub bytes: Vec<u8>,
}

impl MidiOutputMessage {
    pub fn control_change(channel: u8, cc_number: u8, value: u8) -> Self {
        let channel = channel.min(15); // MIDI channels are 0-15
        Self {
            bytes: vec![
                status::CONTROL_CHANGE | channel,
                cc_number & 0x7F,
                value & 0x7F,
            ],
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        Self {
            bytes: vec![status::NOTE_ON | channel, note & 0x7F, velocity & 0x7F],
        }
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        Self {
            bytes: vec![status::NOTE_OFF | channel, note & 0x7F, velocity & 0x7F],
        }
    }

    pub fn program_change(channel: u8, program: u8) -> Self {
        let channel = channel.min(15);
        Self {
            bytes: vec![status::PROGRAM_CHANGE | channel, program & 0x7F],
        }
    }

    /// SysEx with the given payload; framing is added.
    pub fn sysex(payload: &[u8]) -> Self {
        Self {
            bytes: sysex::frame(payload),
        }
    }

    /// Universal identity request probe.
    pub fn identity_request() -> Self {
        Self {
            bytes: sysex::identity_request(),
        }
    }

    pub fn from_event(event: &MidiEvent) -> Self {
        Self {
            bytes: event.to_bytes(),
        }
    }
}

impl From<&MidiEvent> for MidiOutputMessage {
    fn from(event: &MidiEvent) -> Self {
        Self::from_event(event)
    }
}

impl From<MidiEvent> for MidiOutputMessage {
    fn from(event: MidiEvent) -> Self {
        Self::from_event(&event)
    }
}

impl AsRef<[u8]> for MidiOutputMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
