//! Builder for configuring and constructing a `StrobeEngine`.

use std::sync::Arc;

use strobe_midi_io::{
    MidiMapper, MidiSettings, MidiTransport, ParameterRegistry, VirtualTransport,
    DEFAULT_QUEUE_CAPACITY,
};
use tracing::warn;

use crate::{Result, StrobeEngine};

/// Without an explicit transport the engine uses the system MIDI ports
/// (feature `midi-hardware`), or an empty [`VirtualTransport`] otherwise.
///
/// # Example
///
/// ```ignore
/// use strobe::prelude::*;
///
/// let engine = StrobeEngine::builder()
///     .client_name("my-show")
///     .dispatcher_thread(true)
///     .build()?;
/// ```
pub struct StrobeEngineBuilder {
    transport: Option<Arc<dyn MidiTransport>>,
    client_name: String,
    queue_capacity: usize,
    dispatcher_thread: bool,
    registry: Option<Arc<ParameterRegistry>>,
    settings: MidiSettings,
}

impl Default for StrobeEngineBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            client_name: "strobe".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dispatcher_thread: false,
            registry: None,
            settings: MidiSettings::default(),
        }
    }
}

impl StrobeEngineBuilder {
    pub fn transport(mut self, transport: Arc<dyn MidiTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use in-process ports. Keep a clone to plug ports and inject input.
    pub fn virtual_transport(self, transport: VirtualTransport) -> Self {
        self.transport(Arc::new(transport))
    }

    /// Client name announced to the system MIDI service. Default: "strobe"
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Default: [`DEFAULT_QUEUE_CAPACITY`]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Route MIDI on a background thread instead of in [`StrobeEngine::pump`].
    pub fn dispatcher_thread(mut self, enabled: bool) -> Self {
        self.dispatcher_thread = enabled;
        self
    }

    /// Share an existing parameter registry.
    pub fn registry(mut self, registry: Arc<ParameterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Settings applied to ports as they are discovered.
    pub fn settings(mut self, settings: MidiSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<StrobeEngine> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.client_name),
        };
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ParameterRegistry::new()));

        let mapper = MidiMapper::builder()
            .tree(registry.clone())
            .queue_capacity(self.queue_capacity)
            .build()?;

        let dispatcher = if self.dispatcher_thread {
            Some(mapper.spawn_dispatcher()?)
        } else {
            None
        };

        let mut engine =
            StrobeEngine::from_parts(transport, mapper, registry, self.settings, dispatcher);

        // A missing MIDI service is not fatal; ports can be scanned later
        if let Err(e) = engine.scan_ports() {
            warn!(error = %e, "initial MIDI port scan failed");
        }
        Ok(engine)
    }
}

#[cfg(feature = "midi-hardware")]
fn default_transport(client_name: &str) -> Arc<dyn MidiTransport> {
    Arc::new(strobe_midi_io::MidirTransport::new(client_name))
}

#[cfg(not(feature = "midi-hardware"))]
fn default_transport(_client_name: &str) -> Arc<dyn MidiTransport> {
    Arc::new(VirtualTransport::new())
}
