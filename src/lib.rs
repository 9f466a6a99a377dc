//! # Strobe - MIDI control for live visuals
//!
//! Drive animation parameters from hardware controllers.
//!
//! ## Architecture
//!
//! Strobe is an umbrella crate that coordinates:
//! - **strobe-midi** - Protocol types (decoding, SysEx, device identity, output messages)
//! - **strobe-midi-io** - Runtime (ports, interfaces, mapping files, MIDI learn, feedback)
//!
//! ## Quick Start
//!
//! ```ignore
//! use strobe::prelude::*;
//!
//! let mut engine = StrobeEngine::builder().build()?;
//! let brightness = Arc::new(MidiControllableReal::new("master.brightness", "Brightness"));
//! engine.register_parameter(brightness.clone());
//!
//! // Listen to the first controller and learn a fader
//! engine.with_interface("nanoKONTROL2 28:0", |nano| nano.set_accept_control_change(true));
//! engine.mapper().begin_learn_path("master.brightness")?;
//!
//! loop {
//!     engine.pump();
//!     let level = brightness.value();
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Hardware MIDI
//! - `midi-hardware` - System MIDI ports via midir

/// Re-export of strobe-midi for direct access
pub use strobe_midi as protocol;

/// Re-export of strobe-midi-io for direct access
pub use strobe_midi_io as midi;

pub use strobe_midi::{DeviceIdentity, ManufacturerId, MidiEvent, MidiOutputMessage};

pub use strobe_midi_io::{
    AcceptFlags, ConnectionState, ControlAddress, ControlSelector, InterfaceEvent,
    InterfaceSettings, MapperEvent, MidiControllable, MidiControllableList, MidiControllableReal,
    MidiInterface, MidiMapper, MidiMapping, MidiSettings, MidiTransport, ParameterRegistry,
    ParameterTree, SharedParameter, VirtualTransport,
};

#[cfg(feature = "midi-hardware")]
pub use strobe_midi_io::MidirTransport;

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::StrobeEngineBuilder;
pub use engine::StrobeEngine;

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{StrobeEngine, StrobeEngineBuilder};

    // Parameters
    pub use crate::{
        MidiControllable, MidiControllableList, MidiControllableReal, ParameterRegistry,
        SharedParameter,
    };

    // Interfaces and mappings
    pub use crate::{AcceptFlags, InterfaceEvent, MidiInterface, MidiMapping, MidiSettings};

    pub use crate::{MidiEvent, VirtualTransport};

    pub use std::sync::Arc;
}
