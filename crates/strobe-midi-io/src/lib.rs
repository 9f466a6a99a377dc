//! MIDI controller runtime for Strobe.
//!
//! Connects hardware controllers to application parameters:
//!
//! - **Transport**: [`MidiTransport`] boundary with a midir backend
//!   (feature: `midi-io`) and an in-process [`VirtualTransport`]
//! - **Interfaces**: per-device connection state, accept flags, auto-connect
//!   and identity probing ([`MidiInterface`])
//! - **Mappings**: persisted control-to-parameter tables ([`MidiMapping`])
//! - **Mapper**: live routing, MIDI learn and the serialized inbound queue
//!   ([`MidiMapper`])
//! - **Parameters**: values driven by MIDI with loop-guarded feedback
//!   ([`MidiControllableReal`], [`MidiControllableList`])
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use strobe_midi_io::{
//!     MidiControllableReal, MidiInterface, MidiMapper, ParameterRegistry, VirtualTransport,
//! };
//!
//! let registry = Arc::new(ParameterRegistry::new());
//! registry.register(Arc::new(MidiControllableReal::new("master.brightness", "Brightness")));
//!
//! let transport = VirtualTransport::new();
//! transport.add_input_port("pad 20:0");
//!
//! let mapper = MidiMapper::builder().tree(registry).build()?;
//! let mut pad = MidiInterface::new("pad 20:0", Arc::new(transport.clone()), &mapper);
//! pad.set_accept_control_change(true);
//!
//! mapper.begin_learn_path("master.brightness")?;
//! transport.inject("pad 20:0", &[0xB0, 16, 0]);
//! mapper.process_pending();
//! ```

pub mod error;
pub use error::{Error, PortDirection, Result};

pub mod transport;
pub use transport::{
    InputCallback, InputConnection, MidiTransport, OutputConnection, VirtualTransport,
};

#[cfg(feature = "midi-io")]
pub use transport::MidirTransport;

pub mod port_name;
pub use port_name::{correlated_output_name, resolve_output_port, OutputPortMatch};

mod selector;
pub use selector::{ControlAddress, ControlSelector, InterfaceId};

pub mod mapping;
pub use mapping::{Binding, MidiMapping};

pub mod parameter;
pub use parameter::{
    ChangeSource, FeedbackTarget, MidiControllable, MidiControllableList, MidiControllableReal,
    ParameterBase, ParameterChange, ParameterValue, SharedParameter,
};

pub mod tree;
pub use tree::{ParameterRegistry, ParameterTree};

mod interface;
pub use interface::{AcceptFlags, ConnectionState, InterfaceEvent, MidiInterface, MidiOutputHandle};

mod mapper;
pub use mapper::{
    DispatcherHandle, LoadReport, MapperEvent, MidiMapper, MidiMapperBuilder, RouteOutcome,
    DEFAULT_QUEUE_CAPACITY,
};

pub mod config;
pub use config::{InterfaceSettings, MidiSettings};

pub use strobe_midi::{DeviceIdentity, ManufacturerId, MidiEvent, MidiOutputMessage};
