//! Serialized handling of inbound messages.
//!
//! Transport callbacks only enqueue. Messages are decoded, filtered and
//! routed here, either on the caller's thread ([`MidiMapper::process_pending`])
//! or on a dedicated thread ([`MidiMapper::spawn_dispatcher`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use strobe_midi::{decode, is_identity_reply, parse_identity_reply, quirks, MidiEvent};
use tracing::{debug, info, trace};

use super::{InboundMessage, MidiMapper};
use crate::error::Result;
use crate::interface::InterfaceEvent;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

impl MidiMapper {
    /// Handle every queued message on the current thread.
    ///
    /// Returns how many messages were taken off the queue.
    pub fn process_pending(&self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inner.inbound_rx.try_recv() {
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    /// Messages waiting in the inbound queue.
    pub fn pending(&self) -> usize {
        self.inner.inbound_rx.len()
    }

    /// Drain the queue on a named background thread until the handle drops.
    pub fn spawn_dispatcher(&self) -> Result<DispatcherHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let mapper = self.clone();
        let keep_running = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name("strobe-midi-dispatch".to_string())
            .spawn(move || {
                while keep_running.load(Ordering::Acquire) {
                    match mapper.inner.inbound_rx.recv_timeout(POLL_INTERVAL) {
                        Ok(message) => mapper.dispatch(message),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(DispatcherHandle {
            running,
            thread: Some(thread),
        })
    }

    /// Decode, filter, notify and route one message under the mapper lock.
    pub(crate) fn dispatch(&self, message: InboundMessage) {
        let mut state = self.inner.state.lock();

        let Some(interface) = state.interface(message.interface) else {
            debug!(interface = message.interface, "message from unregistered interface dropped");
            return;
        };
        if !interface.is_connected() {
            return;
        }

        // Scene changes bypass the program change flag
        let (event, from_quirk) = match quirks::korg_scene_change(&message.bytes) {
            Some(event) => {
                debug!(
                    interface = message.interface,
                    "Korg scene change rewritten as program change"
                );
                (event, true)
            }
            None => (decode(&message.bytes), false),
        };
        trace!(
            interface = message.interface,
            timestamp = message.timestamp,
            ?event,
            "MIDI in"
        );

        match &event {
            MidiEvent::SysEx { payload } if is_identity_reply(payload) => {
                let identity = parse_identity_reply(payload);
                info!(interface = message.interface, %identity, "MIDI device identified");
                interface.set_identity(identity.clone());
                interface.notify(InterfaceEvent::Identified(identity));
                return;
            }
            MidiEvent::SysEx { payload } => {
                debug!(
                    interface = message.interface,
                    len = payload.len(),
                    "unhandled SysEx dropped"
                );
                return;
            }
            MidiEvent::Unknown { status, .. } => {
                debug!(interface = message.interface, status, "unrecognized MIDI message dropped");
                return;
            }
            _ => {}
        }

        if !from_quirk && !interface.accepts(&event) {
            trace!(interface = message.interface, kind = ?event.kind(), "not accepted");
            return;
        }

        interface.notify(InterfaceEvent::Midi(event.clone()));
        state.route(message.interface, &event);
    }
}

/// Stops and joins the dispatcher thread when dropped.
pub struct DispatcherHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("MIDI dispatcher thread panicked");
            }
        }
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
