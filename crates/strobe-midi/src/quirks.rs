//! Vendor-specific workarounds.
//!
//! Everything in here breaks MIDI 1.0 message rules on purpose to stay
//! compatible with shipping hardware. Nothing in this module is generalised
//! into the regular decode path.

use crate::event::MidiEvent;
use crate::identity::MANUFACTURER_KORG;
use crate::status;

/// Total length of a Korg nanoKONTROL scene change message, framing included.
pub const KORG_SCENE_CHANGE_LEN: usize = 11;

/// Function byte announcing a scene change.
const KORG_SCENE_CHANGE_FUNCTION: u8 = 0x4F;

/// Korg nanoKONTROL scene change.
///
/// When the scene button is pressed the device sends an 11-byte SysEx
/// (`F0 42 .. .. .. .. .. .. 4F nn F7`) instead of a program change. It is
/// rewritten as `ProgramChange { channel: raw[0] & 0x0F, program: raw[9] }`.
/// The channel comes from the SysEx start byte, which carries no channel
/// and therefore always yields channel 0.
///
/// Returns `None` for anything that does not have exactly this shape.
pub fn korg_scene_change(raw: &[u8]) -> Option<MidiEvent> {
    if raw.len() != KORG_SCENE_CHANGE_LEN
        || raw[0] != status::SYSEX_START
        || raw[1] != MANUFACTURER_KORG
        || raw[8] != KORG_SCENE_CHANGE_FUNCTION
    {
        return None;
    }

    Some(MidiEvent::ProgramChange {
        channel: raw[0] & status::CHANNEL_MASK,
        program: raw[9] & 0x7F,
    })
}
