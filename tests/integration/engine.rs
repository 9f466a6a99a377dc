//! Engine integration tests
//!
//! Port discovery, unplug/replug, settings persistence and the dispatcher thread.

use std::time::{Duration, Instant};

use strobe::prelude::*;
use strobe::{ControlSelector, Error, InterfaceSettings};

use crate::helpers::*;

#[test]
fn test_build_discovers_ports_closed() {
    let transport = test_transport();
    let engine = test_engine(&transport);

    assert_eq!(engine.interface_names(), vec![NANO_IN.to_string(), PAD_IN.to_string()]);
    assert!(engine.interfaces().iter().all(|i| !i.is_connected()));
    assert!(!engine.is_dispatching());
}

#[test]
fn test_scan_reports_new_ports_once() {
    let transport = test_transport();
    let mut engine = test_engine(&transport);

    transport.add_input_port("Launch Control 24:0");
    assert_eq!(engine.scan_ports().unwrap(), vec!["Launch Control 24:0".to_string()]);
    assert!(engine.scan_ports().unwrap().is_empty());
    assert!(engine.interface("Launch Control 24:0").is_some());
}

#[test]
fn test_scan_failure_is_an_error() {
    let transport = test_transport();
    let mut engine = test_engine(&transport);
    transport.set_fail_enumeration(true);
    assert!(matches!(engine.scan_ports(), Err(Error::Midi(_))));
}

#[test]
fn test_unplug_and_replug() {
    let transport = test_transport();
    let mut engine = test_engine(&transport);
    engine.with_interface(NANO_IN, |nano| nano.set_accept_control_change(true));
    let id = engine.interface(NANO_IN).and_then(|nano| nano.id());
    assert!(id.is_some());

    transport.remove_input_port(NANO_IN);
    engine.scan_ports().unwrap();
    assert!(!engine.interface(NANO_IN).unwrap().is_connected());

    transport.add_input_port(NANO_IN);
    assert!(engine.scan_ports().unwrap().is_empty());
    let nano = engine.interface(NANO_IN).unwrap();
    assert!(nano.is_connected());
    assert_eq!(nano.id(), id);
}

#[test]
fn test_remembered_settings_apply_on_discovery() {
    init_tracing();
    let transport = VirtualTransport::new();
    let mut settings = MidiSettings::default();
    settings.upsert(InterfaceSettings::new(
        "later 20:0",
        AcceptFlags {
            note: true,
            ..AcceptFlags::none()
        },
        None,
    ));

    let mut engine = StrobeEngine::builder()
        .virtual_transport(transport.clone())
        .settings(settings.clone())
        .build()
        .unwrap();
    assert!(engine.interface_names().is_empty());
    // Not plugged in, still part of the settings
    assert_eq!(engine.settings(), settings);

    transport.add_input_port("later 20:0");
    engine.scan_ports().unwrap();
    let later = engine.interface("later 20:0").unwrap();
    assert!(later.is_connected());
    assert!(later.accept_flags().note);
}

#[test]
fn test_settings_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mapping_path = dir.path().join("nano.toml");
    let settings_path = dir.path().join("midi.toml");

    let mut mapping = MidiMapping::new();
    mapping.bind(strobe::ControlAddress::new(0, 0), "master.brightness");
    mapping.save(&mapping_path).unwrap();

    {
        let transport = test_transport();
        let mut engine = test_engine(&transport);
        engine.with_interface(NANO_IN, |nano| {
            nano.set_accept_control_change(true);
            nano.set_mapping_file(Some(mapping_path.clone())).unwrap();
        });
        engine.save_settings(&settings_path).unwrap();
    }

    let transport = test_transport();
    let mut engine = test_engine(&transport);
    engine.load_settings(&settings_path).unwrap();

    let nano = engine.interface(NANO_IN).unwrap();
    assert!(nano.is_connected());
    assert_eq!(nano.mapping_file(), Some(mapping_path.as_path()));
    assert!(!engine.interface(PAD_IN).unwrap().is_connected());

    send_cc(&engine, &transport, NANO_IN, 0, 0, 127);
    assert_eq!(midi_value(&engine, "master.brightness"), 127);

    let saved = engine.settings();
    assert_eq!(saved.get(NANO_IN).map(|s| s.accept_control_change), Some(true));
}

#[test]
fn test_invalid_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("midi.toml");
    std::fs::write(&path, "interface = 3").unwrap();

    let transport = test_transport();
    let mut engine = test_engine(&transport);
    assert!(matches!(
        engine.load_settings(&path),
        Err(Error::Midi(strobe::midi::Error::InvalidConfig(_)))
    ));
}

#[test]
fn test_dispatcher_thread() {
    init_tracing();
    let transport = test_transport();
    let mut engine = StrobeEngine::builder()
        .virtual_transport(transport.clone())
        .dispatcher_thread(true)
        .build()
        .unwrap();
    let opacity = Arc::new(MidiControllableReal::new("layer1.opacity", "Opacity"));
    engine.register_parameter(opacity.clone());
    assert!(engine.is_dispatching());

    engine.with_interface(PAD_IN, |pad| pad.set_accept_control_change(true));
    let id = engine.interface(PAD_IN).and_then(|pad| pad.id()).unwrap();
    engine
        .mapper()
        .bind(ControlSelector::new(id, 3, 7), "layer1.opacity")
        .unwrap();

    transport.inject(PAD_IN, &[0xB3, 7, 127]);
    let deadline = Instant::now() + Duration::from_secs(2);
    while opacity.value() < 1.0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(opacity.value(), 1.0);
}

#[test]
fn test_drop_releases_ports() {
    let transport = test_transport();
    {
        let mut engine = test_engine(&transport);
        engine.with_interface(NANO_IN, |nano| nano.set_accept_note(true));
        assert!(transport.is_input_connected(NANO_IN));
        assert!(transport.is_output_connected(NANO_OUT));
    }
    assert!(!transport.is_input_connected(NANO_IN));
    assert!(!transport.is_output_connected(NANO_OUT));
}
