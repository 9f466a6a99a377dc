//! MIDI protocol types for Strobe.
//!
//! Pure, allocation-light building blocks shared by the I/O runtime:
//!
//! - **Decoding**: raw bytes to [`MidiEvent`] (total, never fails)
//! - **SysEx**: framing, universal sub-IDs and [`SysExAssembler`] for split transfers
//! - **Identity**: [`parse_identity_reply`] into [`DeviceIdentity`]
//! - **Quirks**: isolated vendor workarounds ([`quirks::korg_scene_change`])
//! - **Output**: [`MidiOutputMessage`] builders
//!
//! # Example
//!
//! ```
//! use strobe_midi::{decode, MidiEvent};
//!
//! let event = decode(&[0x91, 0x40, 0x7F]);
//! assert_eq!(event, MidiEvent::NoteOn { channel: 1, note: 64, velocity: 127 });
//! ```

pub mod status;

mod event;
pub use event::{EventKind, MidiChannel, MidiEvent, RawBytes};

mod decode;
pub use decode::{decode, sysex_payload};

pub mod sysex;
pub use sysex::SysExAssembler;

pub mod identity;
pub use identity::{is_identity_reply, parse_identity_reply, DeviceIdentity, ManufacturerId};

pub mod quirks;

mod output;
pub use output::MidiOutputMessage;

mod utils;
pub use utils::{index_to_midi, midi_to_index, midi_to_unit, unit_to_midi};
