//! Interface state reachable from the transport callback and the mapper's
//! dispatch loop.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use strobe_midi::{DeviceIdentity, MidiEvent, SysExAssembler};
use tracing::debug;

use super::{AcceptFlags, InterfaceEvent, MidiOutputHandle};
use crate::mapper::InboundMessage;
use crate::selector::InterfaceId;
use crate::transport::InputCallback;

/// 0 means "no id yet"; ids start at 1.
const NO_ID: InterfaceId = 0;

pub(crate) struct InterfaceShared {
    id: AtomicU32,
    connected: AtomicBool,
    accept: RwLock<AcceptFlags>,
    identity: Mutex<Option<DeviceIdentity>>,
    listeners: Mutex<Vec<Sender<InterfaceEvent>>>,
    pub(crate) output: MidiOutputHandle,
}

impl InterfaceShared {
    pub(crate) fn new() -> Self {
        Self {
            id: AtomicU32::new(NO_ID),
            connected: AtomicBool::new(false),
            accept: RwLock::new(AcceptFlags::none()),
            identity: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            output: MidiOutputHandle::new(),
        }
    }

    pub(crate) fn id(&self) -> Option<InterfaceId> {
        match self.id.load(Ordering::Acquire) {
            NO_ID => None,
            id => Some(id),
        }
    }

    pub(crate) fn assign_id(&self, id: InterfaceId) {
        self.id.store(id, Ordering::Release);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn accept_flags(&self) -> AcceptFlags {
        *self.accept.read()
    }

    pub(crate) fn update_accept(&self, update: impl FnOnce(&mut AcceptFlags)) {
        update(&mut self.accept.write());
    }

    pub(crate) fn accepts(&self, event: &MidiEvent) -> bool {
        self.accept.read().accepts(event)
    }

    pub(crate) fn identity(&self) -> Option<DeviceIdentity> {
        self.identity.lock().clone()
    }

    pub(crate) fn set_identity(&self, identity: DeviceIdentity) {
        *self.identity.lock() = Some(identity);
    }

    pub(crate) fn clear_identity(&self) {
        *self.identity.lock() = None;
    }

    pub(crate) fn subscribe(&self) -> Receiver<InterfaceEvent> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    pub(crate) fn notify(&self, event: InterfaceEvent) {
        self.listeners
            .lock()
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    /// Transport callback: reassemble SysEx, then enqueue for dispatch.
    ///
    /// Runs on the transport thread and never touches mapper state.
    pub(crate) fn input_callback(
        self: &std::sync::Arc<Self>,
        queue: Sender<InboundMessage>,
    ) -> InputCallback {
        let shared = std::sync::Arc::clone(self);
        let mut assembler = SysExAssembler::new();

        Box::new(move |timestamp, bytes| {
            let Some(bytes) = assembler.push(bytes) else {
                return;
            };
            let Some(interface) = shared.id() else {
                return;
            };
            let message = InboundMessage {
                interface,
                timestamp,
                bytes,
            };
            if let Err(TrySendError::Full(_)) = queue.try_send(message) {
                debug!(interface, "MIDI inbound queue full, message dropped");
            }
        })
    }
}
