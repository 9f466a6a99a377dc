//! Test helpers and fixtures for Strobe integration tests
//!
//! Every engine runs on a [`VirtualTransport`], so no MIDI hardware or
//! system MIDI service is needed.

use strobe::prelude::*;
use strobe::ParameterTree;

pub const NANO_IN: &str = "nanoKONTROL2 28:0";
pub const NANO_OUT: &str = "nanoKONTROL2:0";
pub const PAD_IN: &str = "pad ctl 20:0";
pub const PAD_OUT: &str = "pad:0";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Transport with a nanoKONTROL2 and a pad, both with outputs.
pub fn test_transport() -> VirtualTransport {
    let transport = VirtualTransport::new();
    transport.add_input_port(NANO_IN);
    transport.add_output_port(NANO_OUT);
    transport.add_input_port(PAD_IN);
    transport.add_output_port(PAD_OUT);
    transport
}

/// Engine over `transport` with the parameters of a small show.
pub fn test_engine(transport: &VirtualTransport) -> StrobeEngine {
    init_tracing();
    let engine = StrobeEngine::builder()
        .virtual_transport(transport.clone())
        .build()
        .expect("Failed to create test engine");

    engine.register_parameter(Arc::new(MidiControllableReal::new(
        "master.brightness",
        "Brightness",
    )));
    engine.register_parameter(Arc::new(MidiControllableReal::new("layer1.opacity", "Opacity")));
    engine.register_parameter(Arc::new(MidiControllableList::new(
        "layer1.blend",
        "Blend",
        ["normal", "add", "multiply"],
    )));
    engine
}

/// Send a control change from `port` and route it.
pub fn send_cc(
    engine: &StrobeEngine,
    transport: &VirtualTransport,
    port: &str,
    channel: u8,
    control: u8,
    value: u8,
) {
    assert!(
        transport.inject(port, &[0xB0 | channel, control, value]),
        "nothing listening on {port}"
    );
    engine.pump();
}

/// 7-bit value of the parameter registered under `path`.
pub fn midi_value(engine: &StrobeEngine, path: &str) -> u8 {
    engine
        .registry()
        .resolve(path)
        .expect("parameter not registered")
        .midi_value()
}
