//! Hardware transport backed by midir.

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::debug;

use super::{InputCallback, InputConnection, MidiTransport, OutputConnection};
use crate::error::{Error, Result};

/// System MIDI ports (ALSA, CoreMIDI, WinMM).
#[derive(Debug, Clone)]
pub struct MidirTransport {
    client_name: String,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

impl Default for MidirTransport {
    fn default() -> Self {
        Self::new("strobe")
    }
}

struct MidirInput {
    name: String,
    _connection: MidiInputConnection<()>,
}

impl InputConnection for MidirInput {
    fn port_name(&self) -> &str {
        &self.name
    }
}

struct MidirOutput {
    name: String,
    connection: MidiOutputConnection,
}

impl OutputConnection for MidirOutput {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.connection.send(bytes)?;
        Ok(())
    }
}

impl MidiTransport for MidirTransport {
    fn input_port_names(&self) -> Result<Vec<String>> {
        let input = MidiInput::new(&self.client_name)?;
        let mut names = Vec::new();
        for (index, port) in input.ports().iter().enumerate() {
            let name = input
                .port_name(port)
                .unwrap_or_else(|_| format!("Port {index}"));
            names.push(name);
        }
        Ok(names)
    }

    fn output_port_names(&self) -> Result<Vec<String>> {
        let output = MidiOutput::new(&self.client_name)?;
        let mut names = Vec::new();
        for (index, port) in output.ports().iter().enumerate() {
            let name = output
                .port_name(port)
                .unwrap_or_else(|_| format!("Port {index}"));
            names.push(name);
        }
        Ok(names)
    }

    fn connect_input(
        &self,
        index: usize,
        mut callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        let mut input = MidiInput::new(&self.client_name)?;
        // SysEx, clock and active sensing are all wanted
        input.ignore(Ignore::None);

        let ports = input.ports();
        let port = ports
            .get(index)
            .ok_or_else(|| Error::PortNotFound(format!("input port #{index}")))?;
        let name = input.port_name(port)?;

        let connection = input.connect(
            port,
            &format!("{}-in", self.client_name),
            move |timestamp, message, _| callback(timestamp, message),
            (),
        )?;
        debug!(port = %name, "midir input connected");

        Ok(Box::new(MidirInput {
            name,
            _connection: connection,
        }))
    }

    fn connect_output(&self, index: usize) -> Result<Box<dyn OutputConnection>> {
        let output = MidiOutput::new(&self.client_name)?;

        let ports = output.ports();
        let port = ports
            .get(index)
            .ok_or_else(|| Error::PortNotFound(format!("output port #{index}")))?;
        let name = output.port_name(port)?;

        let connection = output.connect(port, &format!("{}-out", self.client_name))?;
        debug!(port = %name, "midir output connected");

        Ok(Box::new(MidirOutput { name, connection }))
    }
}
