//! Behavior guaranteed by the MIDI subsystem, exercised through the engine.

use strobe::prelude::*;
use strobe::protocol::{decode, parse_identity_reply};
use strobe::{ControlAddress, ControlSelector, DeviceIdentity, ManufacturerId};

use crate::helpers::*;

#[test]
fn test_decode_channel_independent() {
    for channel in 0..16u8 {
        assert_eq!(
            decode(&[0x80 | channel, 0x40, 0x10]),
            MidiEvent::NoteOff {
                channel,
                note: 0x40,
                velocity: 0x10
            }
        );
        assert_eq!(
            decode(&[0x90 | channel, 0x40, 0x7F]),
            MidiEvent::NoteOn {
                channel,
                note: 0x40,
                velocity: 0x7F
            }
        );
        assert_eq!(
            decode(&[0xB0 | channel, 7, 99]),
            MidiEvent::ControlChange {
                channel,
                control: 7,
                value: 99
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
fn test_decode_realtime() {
    assert_eq!(decode(&[0xF8]), MidiEvent::Clock);
    assert_eq!(decode(&[0xFA]), MidiEvent::Start);
    assert_eq!(decode(&[0xFB]), MidiEvent::Continue);
    assert_eq!(decode(&[0xFC]), MidiEvent::Stop);
}

#[test]
fn test_short_identity_reply_is_unknown() {
    let payload = [0x7E, 0x00, 0x06, 0x02, 0x42, 0x13, 0x01, 0x00, 0x00, 0x03, 0x00, 0x01];
    for len in 0..=payload.len() {
        assert_eq!(parse_identity_reply(&payload[..len]), DeviceIdentity::default());
    }
}

#[test]
fn test_extended_manufacturer_id() {
    let payload = [
        0x7E, 0x00, 0x06, 0x02, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
    ];
    let identity = parse_identity_reply(&payload);
    assert_eq!(identity.manufacturer, Some(ManufacturerId::Extended(0x01, 0x02)));
    assert_eq!(identity.manufacturer.map(|m| m.value()), Some(0x0102));
}

#[test]
fn test_duplicate_bindings_last_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.toml");
    std::fs::write(
        &path,
        r#"
[[binding]]
channel = 0
control = 16
parameter = "layer1.opacity"

[[binding]]
channel = 0
control = 16
parameter = "master.brightness"
"#,
    )
    .unwrap();

    let transport = test_transport();
    let mut engine = test_engine(&transport);
    engine.with_interface(NANO_IN, |nano| {
        nano.set_accept_control_change(true);
        nano.set_mapping_file(Some(path.clone())).unwrap();
    });

    let id = engine.interface(NANO_IN).and_then(|nano| nano.id()).unwrap();
    assert_eq!(
        engine.mapper().bindings(id),
        vec![(ControlSelector::new(id, 0, 16), "master.brightness".to_string())]
    );
}

#[test]
fn test_mapping_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("original.toml");
    let copy = dir.path().join("copy.toml");
    std::fs::write(
        &original,
        r#"
description = "two faders"

[[binding]]
channel = 0
control = 1
parameter = "master.brightness"

[[binding]]
channel = 9
control = 36
parameter = "layer1.blend"
"#,
    )
    .unwrap();

    let loaded = MidiMapping::load(&original).unwrap();
    loaded.save(&copy).unwrap();
    let reloaded = MidiMapping::load(&copy).unwrap();

    let mut before: Vec<_> = loaded.iter().cloned().collect();
    let mut after: Vec<_> = reloaded.iter().cloned().collect();
    before.sort_by_key(|b| (b.channel, b.control));
    after.sort_by_key(|b| (b.channel, b.control));
    assert_eq!(before, after);
    assert_eq!(reloaded.description(), Some("two faders"));
}

#[test]
fn test_learn_then_route() {
    let transport = test_transport();
    let mut engine = test_engine(&transport);
    engine.with_interface(PAD_IN, |pad| pad.set_accept_control_change(true));
    let id = engine.interface(PAD_IN).and_then(|pad| pad.id()).unwrap();

    engine.mapper().begin_learn_path("layer1.opacity").unwrap();
    send_cc(&engine, &transport, PAD_IN, 2, 10, 33);

    assert_eq!(
        engine.mapper().bindings(id),
        vec![(ControlSelector::new(id, 2, 10), "layer1.opacity".to_string())]
    );
    assert!(!engine.mapper().is_learning());

    send_cc(&engine, &transport, PAD_IN, 2, 10, 77);
    assert_eq!(midi_value(&engine, "layer1.opacity"), 77);
    assert_eq!(engine.mapper().bindings(id).len(), 1);
}

#[test]
fn test_auto_connect() {
    let transport = test_transport();
    let mut engine = test_engine(&transport);

    // Last active flag off closes
    engine.with_interface(NANO_IN, |nano| {
        nano.set_accept_note(true);
        assert!(nano.is_connected());
        nano.set_accept_note(false);
        assert!(!nano.is_connected());
    });

    // Any flag on opens an idle interface that has a mapping
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pad.toml");
    let mut mapping = MidiMapping::new();
    mapping.bind(ControlAddress::new(0, 1), "master.brightness");
    mapping.save(&path).unwrap();

    engine.with_interface(PAD_IN, |pad| {
        pad.set_mapping_file(Some(path.clone())).unwrap();
        assert!(!pad.is_connected());
        pad.set_accept_program_change(true);
        assert!(pad.is_connected());
        assert_eq!(pad.active_mapping().len(), 1);
    });
}

#[test]
fn test_feedback_loop_guard() {
    let transport = test_transport();
    let mut engine = test_engine(&transport);
    let flash = Arc::new(MidiControllableReal::new("show.strobe", "Strobe"));
    engine.register_parameter(flash.clone());

    engine.with_interface(NANO_IN, |nano| nano.set_accept_control_change(true));
    let id = engine.interface(NANO_IN).and_then(|nano| nano.id()).unwrap();
    engine
        .mapper()
        .bind(ControlSelector::new(id, 0, 32), "show.strobe")
        .unwrap();
    transport.clear_sent();

    flash.set_value(1.0);
    assert_eq!(transport.sent_to(NANO_OUT), vec![vec![0xB0, 32, 127]]);

    // Same value again: nothing goes out
    flash.set_value(1.0);
    assert_eq!(transport.sent_to(NANO_OUT).len(), 1);

    // Different float, same 7-bit value: nothing goes out either
    flash.set_value(0.999);
    assert_eq!(transport.sent_to(NANO_OUT).len(), 1);
}
