//! MIDI controllable parameters.
//!
//! A parameter is driven by incoming MIDI ([`MidiControllable::set_value_from_midi`])
//! and, when bound to a control on an interface with an output, echoes
//! application-set values back to the device (motor faders, LED rings).
//!
//! Feedback is loop guarded: the last 7-bit value known to be on the device
//! is remembered, and nothing is sent when a new value quantizes to it.

mod list;
mod real;

pub use list::MidiControllableList;
pub use real::MidiControllableReal;

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::interface::MidiOutputHandle;
use crate::selector::ControlSelector;

/// Where a value change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Midi,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// Normalized value in `[0, 1]`.
    Real(f32),
    /// Position in an ordinal list.
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChange {
    pub path: String,
    pub value: ParameterValue,
    pub source: ChangeSource,
}

/// Control a parameter is bound to, and the output feedback goes to.
#[derive(Debug, Clone)]
pub struct FeedbackTarget {
    pub selector: ControlSelector,
    pub output: Option<MidiOutputHandle>,
}

#[derive(Default)]
struct BaseState {
    feedback: Option<FeedbackTarget>,
    /// Last 7-bit value known to be on the device.
    device_value: Option<u8>,
    listeners: Vec<Sender<ParameterChange>>,
}

/// State shared by every controllable parameter: identity, binding and
/// change listeners.
pub struct ParameterBase {
    path: String,
    label: String,
    state: Mutex<BaseState>,
}

impl ParameterBase {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            state: Mutex::new(BaseState::default()),
        }
    }

    /// Dotted path in the parameter tree, e.g. `"color.hue"`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bound_selector(&self) -> Option<ControlSelector> {
        self.state.lock().feedback.as_ref().map(|f| f.selector)
    }

    pub fn is_bound(&self) -> bool {
        self.state.lock().feedback.is_some()
    }

    /// Set by the mapper when the parameter is bound or unbound.
    pub(crate) fn set_feedback(&self, feedback: Option<FeedbackTarget>) {
        let mut state = self.state.lock();
        state.feedback = feedback;
        state.device_value = None;
    }

    /// Receive every value change.
    pub fn subscribe(&self) -> Receiver<ParameterChange> {
        let (tx, rx) = unbounded();
        self.state.lock().listeners.push(tx);
        rx
    }

    pub(crate) fn notify(&self, value: ParameterValue, source: ChangeSource) {
        let change = ParameterChange {
            path: self.path.clone(),
            value,
            source,
        };
        self.state
            .lock()
            .listeners
            .retain(|listener| listener.send(change.clone()).is_ok());
    }

    /// The device reported `value`; it needs no echo.
    pub(crate) fn record_device_value(&self, value: u8) {
        self.state.lock().device_value = Some(value);
    }

    /// Send `value` on the bound control unless the device already shows it.
    ///
    /// Returns whether a message went out.
    pub(crate) fn send_feedback(&self, value: u8) -> bool {
        let mut state = self.state.lock();
        if state.device_value == Some(value) {
            return false;
        }
        let Some(FeedbackTarget {
            selector,
            output: Some(output),
        }) = state.feedback.clone()
        else {
            return false;
        };
        if !output.is_open() {
            return false;
        }
        match output.send_control_change(selector.channel, selector.control, value) {
            Ok(()) => {
                state.device_value = Some(value);
                true
            }
            Err(e) => {
                debug!(path = %self.path, error = %e, "parameter feedback not delivered");
                false
            }
        }
    }
}

impl std::fmt::Debug for ParameterBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterBase")
            .field("path", &self.path)
            .field("label", &self.label)
            .field("bound", &self.bound_selector())
            .finish()
    }
}

/// A parameter the mapper can drive.
pub trait MidiControllable: Send + Sync {
    fn base(&self) -> &ParameterBase;

    /// Apply a 7-bit value received from a controller. Never echoes.
    fn set_value_from_midi(&self, value: u8);

    /// Current value as 7-bit MIDI data.
    fn midi_value(&self) -> u8;

    fn path(&self) -> &str {
        self.base().path()
    }
}

/// Parameters are shared between the application tree and the mapper.
pub type SharedParameter = Arc<dyn MidiControllable>;
