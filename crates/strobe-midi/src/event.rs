//! Typed MIDI events produced by the decoder.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::status;

/// MIDI channel (0-15, where 0 = channel 1)
pub type MidiChannel = u8;

/// Bytes of a message the decoder could not classify.
pub type RawBytes = SmallVec<[u8; 3]>;

/// Discriminant of a [`MidiEvent`], handy for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NoteOff,
    NoteOn,
    ControlChange,
    ProgramChange,
    Clock,
    Start,
    Stop,
    Continue,
    SysEx,
    Unknown,
}

/// A decoded MIDI message.
///
/// Channels are 0-15; notes, velocities, controllers and values are 7-bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MidiEvent {
    NoteOff {
        channel: MidiChannel,
        note: u8,
        velocity: u8,
    },
    NoteOn {
        channel: MidiChannel,
        note: u8,
        velocity: u8,
    },
    ControlChange {
        channel: MidiChannel,
        control: u8,
        value: u8,
    },
    ProgramChange {
        channel: MidiChannel,
        program: u8,
    },
    Clock,
    Start,
    Stop,
    Continue,
    /// System exclusive message; `payload` excludes the `F0`/`F7` framing.
    SysEx {
        payload: Vec<u8>,
    },
    /// Anything the decoder does not classify, kept verbatim.
    Unknown {
        status: u8,
        raw: RawBytes,
    },
}

impl MidiEvent {
    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::NoteOn {
            channel: channel.min(15),
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::NoteOff {
            channel: channel.min(15),
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    #[inline]
    pub fn control_change(channel: u8, control: u8, value: u8) -> Self {
        Self::ControlChange {
            channel: channel.min(15),
            control: control & 0x7F,
            value: value & 0x7F,
        }
    }

    #[inline]
    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::ProgramChange {
            channel: channel.min(15),
            program: program & 0x7F,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::NoteOff { .. } => EventKind::NoteOff,
            Self::NoteOn { .. } => EventKind::NoteOn,
            Self::ControlChange { .. } => EventKind::ControlChange,
            Self::ProgramChange { .. } => EventKind::ProgramChange,
            Self::Clock => EventKind::Clock,
            Self::Start => EventKind::Start,
            Self::Stop => EventKind::Stop,
            Self::Continue => EventKind::Continue,
            Self::SysEx { .. } => EventKind::SysEx,
            Self::Unknown { .. } => EventKind::Unknown,
        }
    }

    /// Channel of a channel voice event.
    #[inline]
    pub fn channel(&self) -> Option<MidiChannel> {
        match *self {
            Self::NoteOff { channel, .. }
            | Self::NoteOn { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. } => Some(channel),
            _ => None,
        }
    }

    /// Controller number for control changes, note number for notes.
    ///
    /// Both share one selector space when binding controls to parameters.
    #[inline]
    pub fn control_or_note(&self) -> Option<u8> {
        match *self {
            Self::NoteOff { note, .. } | Self::NoteOn { note, .. } => Some(note),
            Self::ControlChange { control, .. } => Some(control),
            _ => None,
        }
    }

    /// 7-bit value carried by a controllable event. Note off reads as 0.
    #[inline]
    pub fn value(&self) -> Option<u8> {
        match *self {
            Self::NoteOff { .. } => Some(0),
            Self::NoteOn { velocity, .. } => Some(velocity),
            Self::ControlChange { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Events that can be captured by MIDI learn.
    #[inline]
    pub fn is_learnable(&self) -> bool {
        matches!(self, Self::ControlChange { .. } | Self::NoteOn { .. })
    }

    /// Clock and transport messages.
    #[inline]
    pub fn is_realtime(&self) -> bool {
        matches!(self, Self::Clock | Self::Start | Self::Stop | Self::Continue)
    }

    /// Encode back to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::NoteOff {
                channel,
                note,
                velocity,
            } => vec![status::NOTE_OFF | channel, *note, *velocity],
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => vec![status::NOTE_ON | channel, *note, *velocity],
            Self::ControlChange {
                channel,
                control,
                value,
            } => vec![status::CONTROL_CHANGE | channel, *control, *value],
            Self::ProgramChange { channel, program } => {
                vec![status::PROGRAM_CHANGE | channel, *program]
            }
            Self::Clock => vec![status::CLOCK],
            Self::Start => vec![status::START],
            Self::Stop => vec![status::STOP],
            Self::Continue => vec![status::CONTINUE],
            Self::SysEx { payload } => {
                let mut bytes = Vec::with_capacity(payload.len() + 2);
                bytes.push(status::SYSEX_START);
                bytes.extend_from_slice(payload);
                bytes.push(status::SYSEX_END);
                bytes
            }
            Self::Unknown { raw, .. } => raw.to_vec(),
        }
    }
}
