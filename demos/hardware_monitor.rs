//! Open every MIDI controller and print what it sends.
//!
//! ```text
//! cargo run --example hardware_monitor
//! ```

use std::time::Duration;

use strobe::prelude::*;

fn main() -> strobe::Result<()> {
    tracing_subscriber::fmt::init();

    let mut engine = StrobeEngine::builder().client_name("strobe-monitor").build()?;

    let mut receivers = Vec::new();
    for port in engine.interface_names() {
        engine.with_interface(&port, |interface| {
            interface.set_accept_flags(AcceptFlags::all());
            receivers.push((port.clone(), interface.subscribe()));
        });
    }
    if receivers.is_empty() {
        println!("No MIDI inputs found");
        return Ok(());
    }

    loop {
        engine.pump();
        for (port, events) in &receivers {
            for event in events.try_iter() {
                match event {
                    InterfaceEvent::Identified(identity) => println!("{port}: {identity}"),
                    InterfaceEvent::Midi(event) => println!("{port}: {event:?}"),
                    other => println!("{port}: {other:?}"),
                }
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
