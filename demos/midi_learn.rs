//! MIDI learn against a simulated controller.
//!
//! ```text
//! cargo run --example midi_learn
//! ```

use strobe::prelude::*;

fn main() -> strobe::Result<()> {
    tracing_subscriber::fmt::init();

    let controller = VirtualTransport::new();
    controller.add_input_port("nanoKONTROL2 28:0");
    controller.add_output_port("nanoKONTROL2:0");

    let mut engine = StrobeEngine::builder()
        .virtual_transport(controller.clone())
        .build()?;

    let brightness = Arc::new(MidiControllableReal::new("master.brightness", "Brightness"));
    let blend = Arc::new(MidiControllableList::new(
        "master.blend",
        "Blend",
        ["normal", "add", "multiply", "screen"],
    ));
    engine.register_parameter(brightness.clone());
    engine.register_parameter(blend.clone());

    engine.with_interface("nanoKONTROL2 28:0", |nano| nano.set_accept_control_change(true));

    // Learn fader 1, then knob 1
    engine.mapper().begin_learn_path("master.brightness")?;
    controller.inject("nanoKONTROL2 28:0", &[0xB0, 0, 12]);
    engine.pump();

    engine.mapper().begin_learn_path("master.blend")?;
    controller.inject("nanoKONTROL2 28:0", &[0xB0, 16, 0]);
    engine.pump();

    controller.inject("nanoKONTROL2 28:0", &[0xB0, 0, 100]);
    controller.inject("nanoKONTROL2 28:0", &[0xB0, 16, 90]);
    engine.pump();
    println!(
        "brightness = {:.2}, blend = {}",
        brightness.value(),
        blend.current_item().unwrap_or("-")
    );

    // Application-side changes are echoed to the controller
    brightness.set_value(0.25);
    for message in controller.sent_to("nanoKONTROL2:0") {
        println!("sent {message:02X?}");
    }

    if let Some(nano) = engine.interface("nanoKONTROL2 28:0") {
        print!("{}", nano.active_mapping().to_toml_string().unwrap_or_default());
    }
    Ok(())
}
