//! In-process transport for tests, demos and headless setups.
//!
//! Ports are plain names. Bytes injected into an input port are delivered to
//! its connected callback on the caller's thread; bytes sent to an output
//! port are recorded and can be inspected with [`VirtualTransport::sent_to`].

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::{InputCallback, InputConnection, MidiTransport, OutputConnection};
use crate::error::{Error, Result};

type SharedCallback = Arc<Mutex<InputCallback>>;

struct VirtualInput {
    name: String,
    listener: Option<(u64, SharedCallback)>,
    on_connect: Vec<Vec<u8>>,
}

struct VirtualOutput {
    name: String,
    sent: Vec<Vec<u8>>,
    connections: usize,
}

#[derive(Default)]
struct VirtualState {
    inputs: Vec<VirtualInput>,
    outputs: Vec<VirtualOutput>,
    next_connection: u64,
    fail_enumeration: bool,
    fail_sends: bool,
}

/// Cloneable handle; all clones share the same ports.
#[derive(Clone)]
pub struct VirtualTransport {
    state: Arc<Mutex<VirtualState>>,
    epoch: Instant,
}

impl Default for VirtualTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState::default())),
            epoch: Instant::now(),
        }
    }

    pub fn add_input_port(&self, name: impl Into<String>) {
        self.state.lock().inputs.push(VirtualInput {
            name: name.into(),
            listener: None,
            on_connect: Vec::new(),
        });
    }

    pub fn add_output_port(&self, name: impl Into<String>) {
        self.state.lock().outputs.push(VirtualOutput {
            name: name.into(),
            sent: Vec::new(),
            connections: 0,
        });
    }

    /// Unplug an input port. An open connection stops receiving.
    pub fn remove_input_port(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.inputs.len();
        state.inputs.retain(|port| port.name != name);
        state.inputs.len() != before
    }

    /// Unplug an output port. Sends on an open connection fail afterwards.
    pub fn remove_output_port(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.outputs.len();
        state.outputs.retain(|port| port.name != name);
        state.outputs.len() != before
    }

    /// Deliver `bytes` to whoever is connected to input `port`.
    ///
    /// Returns `false` when the port does not exist or nothing is connected.
    pub fn inject(&self, port: &str, bytes: &[u8]) -> bool {
        let callback = {
            let state = self.state.lock();
            state
                .inputs
                .iter()
                .find(|input| input.name == port)
                .and_then(|input| input.listener.as_ref())
                .map(|(_, callback)| Arc::clone(callback))
        };
        let Some(callback) = callback else {
            return false;
        };
        let timestamp = self.epoch.elapsed().as_micros() as u64;
        (callback.lock())(timestamp, bytes);
        true
    }

    /// Queue `bytes` for input `port` to emit from within the next
    /// `connect_input`, like a controller dumping its state on open.
    pub fn send_on_connect(&self, port: &str, bytes: &[u8]) -> bool {
        let mut state = self.state.lock();
        match state.inputs.iter_mut().find(|input| input.name == port) {
            Some(input) => {
                input.on_connect.push(bytes.to_vec());
                true
            }
            None => false,
        }
    }

    /// Every message sent to output `port` so far.
    pub fn sent_to(&self, port: &str) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .outputs
            .iter()
            .find(|output| output.name == port)
            .map(|output| output.sent.clone())
            .unwrap_or_default()
    }

    pub fn clear_sent(&self) {
        for output in self.state.lock().outputs.iter_mut() {
            output.sent.clear();
        }
    }

    pub fn is_input_connected(&self, port: &str) -> bool {
        self.state
            .lock()
            .inputs
            .iter()
            .any(|input| input.name == port && input.listener.is_some())
    }

    pub fn is_output_connected(&self, port: &str) -> bool {
        self.state
            .lock()
            .outputs
            .iter()
            .any(|output| output.name == port && output.connections > 0)
    }

    /// Make port enumeration fail, as a crashed MIDI service would.
    pub fn set_fail_enumeration(&self, fail: bool) {
        self.state.lock().fail_enumeration = fail;
    }

    /// Make every output send fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.lock().fail_sends = fail;
    }
}

struct VirtualInputConnection {
    state: Arc<Mutex<VirtualState>>,
    name: String,
    id: u64,
}

impl InputConnection for VirtualInputConnection {
    fn port_name(&self) -> &str {
        &self.name
    }
}

impl Drop for VirtualInputConnection {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(input) = state.inputs.iter_mut().find(|input| input.name == self.name) {
            if matches!(input.listener, Some((id, _)) if id == self.id) {
                input.listener = None;
            }
        }
    }
}

struct VirtualOutputConnection {
    state: Arc<Mutex<VirtualState>>,
    name: String,
}

impl OutputConnection for VirtualOutputConnection {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(Error::Transport(format!("send to '{}' failed", self.name)));
        }
        let output = state
            .outputs
            .iter_mut()
            .find(|output| output.name == self.name)
            .ok_or_else(|| Error::Transport(format!("output '{}' disappeared", self.name)))?;
        output.sent.push(bytes.to_vec());
        Ok(())
    }
}

impl Drop for VirtualOutputConnection {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(output) = state.outputs.iter_mut().find(|output| output.name == self.name) {
            output.connections = output.connections.saturating_sub(1);
        }
    }
}

impl MidiTransport for VirtualTransport {
    fn input_port_names(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        if state.fail_enumeration {
            return Err(Error::Transport("virtual port enumeration failed".into()));
        }
        Ok(state.inputs.iter().map(|input| input.name.clone()).collect())
    }

    fn output_port_names(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        if state.fail_enumeration {
            return Err(Error::Transport("virtual port enumeration failed".into()));
        }
        Ok(state.outputs.iter().map(|output| output.name.clone()).collect())
    }

    fn connect_input(
        &self,
        index: usize,
        callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let input = state
            .inputs
            .get_mut(index)
            .ok_or_else(|| Error::PortNotFound(format!("input port #{index}")))?;
        if input.listener.is_some() {
            return Err(Error::Transport(format!(
                "input '{}' is already connected",
                input.name
            )));
        }
        state.next_connection += 1;
        let id = state.next_connection;
        let callback = Arc::new(Mutex::new(callback));
        input.listener = Some((id, Arc::clone(&callback)));
        let name = input.name.clone();
        let on_connect = std::mem::take(&mut input.on_connect);
        drop(guard);

        for bytes in on_connect {
            let timestamp = self.epoch.elapsed().as_micros() as u64;
            (callback.lock())(timestamp, &bytes);
        }

        Ok(Box::new(VirtualInputConnection {
            state: Arc::clone(&self.state),
            name,
            id,
        }))
    }

    fn connect_output(&self, index: usize) -> Result<Box<dyn OutputConnection>> {
        let mut state = self.state.lock();
        let output = state
            .outputs
            .get_mut(index)
            .ok_or_else(|| Error::PortNotFound(format!("output port #{index}")))?;
        output.connections += 1;

        Ok(Box::new(VirtualOutputConnection {
            state: Arc::clone(&self.state),
            name: output.name.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_reaches_connected_callback() {
        let transport = VirtualTransport::new();
        transport.add_input_port("pad");

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let connection = transport
            .connect_input(
                0,
                Box::new(move |_, bytes| sink.lock().push(bytes.to_vec())),
            )
            .unwrap();

        assert!(transport.inject("pad", &[0xB0, 1, 2]));
        assert_eq!(*received.lock(), vec![vec![0xB0, 1, 2]]);

        drop(connection);
        assert!(!transport.is_input_connected("pad"));
        assert!(!transport.inject("pad", &[0xB0, 1, 2]));
        assert_eq!(received.lock().len(), 1);
    }

    #[test]
    fn test_output_records_and_fails_on_demand() {
        let transport = VirtualTransport::new();
        transport.add_output_port("pad out");
        let mut out = transport.connect_output(0).unwrap();
        assert!(transport.is_output_connected("pad out"));

        out.send(&[0xB0, 7, 100]).unwrap();
        assert_eq!(transport.sent_to("pad out"), vec![vec![0xB0, 7, 100]]);

        transport.set_fail_sends(true);
        assert!(matches!(out.send(&[0xF8]), Err(Error::Transport(_))));

        transport.set_fail_sends(false);
        transport.remove_output_port("pad out");
        assert!(out.send(&[0xF8]).is_err());
    }

    #[test]
    fn test_enumeration_failure() {
        let transport = VirtualTransport::new();
        transport.add_input_port("pad");
        transport.set_fail_enumeration(true);
        assert!(transport.input_port_names().is_err());
        assert!(transport.output_port_names().is_err());
    }

    #[test]
    fn test_second_input_connection_rejected() {
        let transport = VirtualTransport::new();
        transport.add_input_port("pad");
        let _first = transport.connect_input(0, Box::new(|_, _| {})).unwrap();
        assert!(transport.connect_input(0, Box::new(|_, _| {})).is_err());
        assert!(transport.connect_input(5, Box::new(|_, _| {})).is_err());
    }
}
