//! Value scaling between 7-bit MIDI data and the unit interval.

#[inline]
pub fn midi_to_unit(value: u8) -> f32 {
    (value & 0x7F) as f32 / 127.0
}

#[inline]
pub fn unit_to_midi(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// Index into a list of `len` items selected by a 7-bit value.
///
/// The 0-127 range is split into `len` equal buckets. `len == 0` yields 0.
#[inline]
pub fn midi_to_index(value: u8, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((value & 0x7F) as usize * len / 128).min(len - 1)
}

/// 7-bit value representing `index` in a list of `len` items.
///
/// First item is 0, last is 127.
#[inline]
pub fn index_to_midi(index: usize, len: usize) -> u8 {
    if len <= 1 {
        return 0;
    }
    let index = index.min(len - 1);
    ((index * 127) as f32 / (len - 1) as f32).round() as u8
}
