//! List MIDI ports and the output each input would be paired with.
//!
//! ```text
//! cargo run -p strobe-midi-io --example list_devices
//! ```

use strobe_midi_io::{resolve_output_port, MidiTransport, MidirTransport, OutputPortMatch};

fn main() -> strobe_midi_io::Result<()> {
    tracing_subscriber::fmt::init();

    let transport = MidirTransport::default();
    let inputs = transport.input_port_names()?;
    let outputs = transport.output_port_names()?;

    if inputs.is_empty() {
        println!("No MIDI inputs found");
    }
    for input in &inputs {
        match resolve_output_port(input, &outputs) {
            OutputPortMatch::Unique(index) => println!("{input}  ->  {}", outputs[index]),
            other => println!("{input}  ({other})"),
        }
    }
    Ok(())
}
