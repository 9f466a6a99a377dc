//! Stateless MIDI message decoding.
//!
//! Channel voice and realtime messages are parsed by `midi-msg`; SysEx
//! framing and the total [`MidiEvent::Unknown`] fallback are handled here.

use midi_msg::{ChannelVoiceMsg, ControlChange, MidiMsg, SystemRealTimeMsg};

use crate::event::{MidiEvent, RawBytes};
use crate::status;

/// Decode one complete raw message into a [`MidiEvent`].
///
/// Never fails: anything that is not one of the supported message kinds, is
/// truncated, or starts with a data byte comes back as [`MidiEvent::Unknown`].
pub fn decode(raw: &[u8]) -> MidiEvent {
    let Some(&first) = raw.first() else {
        return unknown(0, raw);
    };

    if !status::is_status(first) {
        return unknown(first, raw);
    }
    if first == status::SYSEX_START {
        return MidiEvent::SysEx {
            payload: sysex_payload(raw).to_vec(),
        };
    }

    // midi-msg rejects data bytes above 0x7F; controllers get the benefit of
    // the doubt and have the top bit dropped.
    let masked: RawBytes = raw
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, &b)| if i == 0 { b } else { b & 0x7F })
        .collect();

    MidiMsg::from_midi(&masked)
        .ok()
        .and_then(|(msg, _len)| from_midi_msg(msg, &masked))
        .or_else(|| channel_mode_control(&masked))
        .unwrap_or_else(|| unknown(first, raw))
}

fn from_midi_msg(msg: MidiMsg, bytes: &[u8]) -> Option<MidiEvent> {
    match msg {
        MidiMsg::ChannelVoice { channel, msg } => {
            let channel = channel as u8;
            match msg {
                // Keep what the wire said; a zero velocity NoteOn stays NoteOn
                ChannelVoiceMsg::NoteOn { note, velocity }
                | ChannelVoiceMsg::NoteOff { note, velocity } => {
                    if bytes.first().map(|b| b & status::TYPE_MASK) == Some(status::NOTE_ON) {
                        Some(MidiEvent::NoteOn {
                            channel,
                            note,
                            velocity,
                        })
                    } else {
                        Some(MidiEvent::NoteOff {
                            channel,
                            note,
                            velocity,
                        })
                    }
                }
                ChannelVoiceMsg::ControlChange {
                    control: ControlChange::CC { control, value },
                } => Some(MidiEvent::ControlChange {
                    channel,
                    control,
                    value,
                }),
                // Named controllers carry the same two data bytes
                ChannelVoiceMsg::ControlChange { .. } => control_change(bytes),
                ChannelVoiceMsg::ProgramChange { program } => {
                    Some(MidiEvent::ProgramChange { channel, program })
                }
                _ => None,
            }
        }
        MidiMsg::ChannelMode { .. } => control_change(bytes),
        MidiMsg::SystemRealTime { msg } => match msg {
            SystemRealTimeMsg::TimingClock => Some(MidiEvent::Clock),
            SystemRealTimeMsg::Start => Some(MidiEvent::Start),
            SystemRealTimeMsg::Continue => Some(MidiEvent::Continue),
            SystemRealTimeMsg::Stop => Some(MidiEvent::Stop),
            _ => None,
        },
        _ => None,
    }
}

/// Controllers 120-127 are channel mode messages to midi-msg, which refuses
/// values the mode doesn't define. On the wire they are control changes.
fn channel_mode_control(bytes: &[u8]) -> Option<MidiEvent> {
    match bytes.get(1) {
        Some(&control) if control >= 120 => control_change(bytes),
        _ => None,
    }
}

fn control_change(bytes: &[u8]) -> Option<MidiEvent> {
    match *bytes {
        [first, control, value] if first & status::TYPE_MASK == status::CONTROL_CHANGE => {
            Some(MidiEvent::ControlChange {
                channel: first & status::CHANNEL_MASK,
                control,
                value,
            })
        }
        _ => None,
    }
}

/// Strip the SysEx framing: the leading `F0` and everything from the first
/// `F7`. Without a terminator the rest of the message is the payload.
pub fn sysex_payload(raw: &[u8]) -> &[u8] {
    let body = match raw.first() {
        Some(&status::SYSEX_START) => &raw[1..],
        _ => raw,
    };
    match body.iter().position(|&b| b == status::SYSEX_END) {
        Some(end) => &body[..end],
        None => body,
    }
}

#[inline]
fn unknown(status: u8, raw: &[u8]) -> MidiEvent {
    MidiEvent::Unknown {
        status,
        raw: RawBytes::from_slice(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_channel_extracted() {
        assert_eq!(
            decode(&[0x91, 0x40, 0x7F]),
            MidiEvent::NoteOn {
                channel: 1,
                note: 64,
                velocity: 127
            }
        );
    }

    #[test]
    fn test_channel_voice_independent_of_channel() {
        for channel in 0..16u8 {
            assert_eq!(
                decode(&[0x80 | channel, 60, 0]),
                MidiEvent::NoteOff {
                    channel,
                    note: 60,
                    velocity: 0
                }
            );
            assert_eq!(
                decode(&[0xB0 | channel, 7, 100]),
                MidiEvent::ControlChange {
                    channel,
                    control: 7,
                    value: 100
                }
            );
            assert_eq!(
                decode(&[0xC0 | channel, 5]),
                MidiEvent::ProgramChange {
                    channel,
                    program: 5
                }
            );
        }
    }

    #[test]
    fn test_realtime_messages() {
        assert_eq!(decode(&[0xF8]), MidiEvent::Clock);
        assert_eq!(decode(&[0xFA]), MidiEvent::Start);
        assert_eq!(decode(&[0xFB]), MidiEvent::Continue);
        assert_eq!(decode(&[0xFC]), MidiEvent::Stop);
    }

    #[test]
    fn test_sysex_payload_excludes_framing() {
        assert_eq!(
            decode(&[0xF0, 0x7E, 0x00, 0x06, 0x01, 0xF7]),
            MidiEvent::SysEx {
                payload: vec![0x7E, 0x00, 0x06, 0x01]
            }
        );
    }

    #[test]
    fn test_sysex_without_terminator() {
        assert_eq!(
            decode(&[0xF0, 0x42, 0x40]),
            MidiEvent::SysEx {
                payload: vec![0x42, 0x40]
            }
        );
    }

    #[test]
    fn test_unmapped_statuses_are_unknown() {
        // Pitch bend, channel pressure, active sensing, song position
        for raw in [
            &[0xE0, 0x00, 0x40][..],
            &[0xD3, 0x10][..],
            &[0xFE][..],
            &[0xF2, 0x00, 0x00][..],
        ] {
            match decode(raw) {
                MidiEvent::Unknown { status, raw: bytes } => {
                    assert_eq!(status, raw[0]);
                    assert_eq!(bytes.as_slice(), raw);
                }
                other => panic!("expected Unknown, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_truncated_and_empty_messages() {
        assert!(matches!(decode(&[]), MidiEvent::Unknown { status: 0, .. }));
        assert!(matches!(
            decode(&[0x90, 60]),
            MidiEvent::Unknown { status: 0x90, .. }
        ));
        assert!(matches!(
            decode(&[0xC0]),
            MidiEvent::Unknown { status: 0xC0, .. }
        ));
        // Running status (data byte first) is not supported
        assert!(matches!(
            decode(&[0x40, 0x7F]),
            MidiEvent::Unknown { status: 0x40, .. }
        ));
    }

    #[test]
    fn test_channel_mode_controllers_stay_control_changes() {
        assert_eq!(
            decode(&[0xB4, 123, 0]),
            MidiEvent::ControlChange {
                channel: 4,
                control: 123,
                value: 0
            }
        );
        assert_eq!(
            decode(&[0xB0, 122, 64]),
            MidiEvent::ControlChange {
                channel: 0,
                control: 122,
                value: 64
            }
        );
    }

    #[test]
    fn test_note_on_zero_velocity_kept() {
        assert_eq!(
            decode(&[0x90, 60, 0]),
            MidiEvent::NoteOn {
                channel: 0,
                note: 60,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_data_bytes_masked() {
        assert_eq!(
            decode(&[0xB2, 0x8A, 0xFF]),
            MidiEvent::ControlChange {
                channel: 2,
                control: 0x0A,
                value: 0x7F
            }
        );
    }
}
