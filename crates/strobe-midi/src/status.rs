//! MIDI status bytes.
//!
//! Channel voice statuses carry the channel in the low nibble; compare them
//! against `status & 0xF0`. System statuses are matched exactly.

// Channel voice messages (1sssnnnn)
pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;

// System common
pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

// System real-time
pub const CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;
pub const CONTINUE: u8 = 0xFB;
pub const STOP: u8 = 0xFC;

/// First byte of every system message.
pub const SYSTEM: u8 = 0xF0;

/// Mask selecting the message type of a channel voice status byte.
pub const TYPE_MASK: u8 = 0xF0;

/// Mask selecting the channel of a channel voice status byte.
pub const CHANNEL_MASK: u8 = 0x0F;

#[inline]
pub fn is_status(byte: u8) -> bool {
    byte & 0x80 != 0
}

#[inline]
pub fn is_realtime(byte: u8) -> bool {
    byte >= CLOCK
}
