//! StrobeEngine that owns the MIDI side of the application.

use std::path::Path;
use std::sync::Arc;

use strobe_midi_io::{
    DispatcherHandle, MidiInterface, MidiMapper, MidiSettings, MidiTransport, ParameterRegistry,
    SharedParameter,
};
use tracing::{info, warn};

use crate::Result;

/// Application MIDI manager.
///
/// Keeps one [`MidiInterface`] per input port ever seen, the shared
/// [`MidiMapper`] and the parameter registry mappings resolve against.
/// Settings for ports that are not plugged in are remembered and applied
/// when the port shows up in [`scan_ports`](Self::scan_ports).
///
/// # Example
///
/// ```ignore
/// use strobe::prelude::*;
///
/// let mut engine = StrobeEngine::builder().build()?;
/// let brightness = MidiControllableReal::new("master.brightness", "Brightness");
/// engine.register_parameter(Arc::new(brightness));
/// engine.load_settings("midi.toml")?;
///
/// loop {
///     engine.pump();
///     // render a frame
/// }
/// ```
pub struct StrobeEngine {
    transport: Arc<dyn MidiTransport>,
    mapper: MidiMapper,
    registry: Arc<ParameterRegistry>,
    interfaces: Vec<MidiInterface>,
    /// Settings of ports without an interface yet.
    remembered: MidiSettings,
    dispatcher: Option<DispatcherHandle>,
}

impl StrobeEngine {
    pub fn builder() -> crate::StrobeEngineBuilder {
        crate::StrobeEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn MidiTransport>,
        mapper: MidiMapper,
        registry: Arc<ParameterRegistry>,
        remembered: MidiSettings,
        dispatcher: Option<DispatcherHandle>,
    ) -> Self {
        Self {
            transport,
            mapper,
            registry,
            interfaces: Vec::new(),
            remembered,
            dispatcher,
        }
    }

    pub fn mapper(&self) -> &MidiMapper {
        &self.mapper
    }

    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn MidiTransport> {
        &self.transport
    }

    /// Make a parameter reachable from mapping files and learn.
    pub fn register_parameter(&self, parameter: SharedParameter) -> Option<SharedParameter> {
        self.registry.register(parameter)
    }

    // ==================== Ports ====================

    /// Create interfaces for newly seen input ports and close those whose
    /// port has gone away.
    ///
    /// Returns the names of the ports seen for the first time.
    pub fn scan_ports(&mut self) -> Result<Vec<String>> {
        let names = self.transport.input_port_names()?;

        for interface in &mut self.interfaces {
            if interface.is_connected() && !names.iter().any(|n| n == interface.port_name()) {
                info!(port = %interface.port_name(), "MIDI port unplugged");
                interface.close();
            }
        }

        let mut added = Vec::new();
        for name in names {
            if let Some(interface) = self
                .interfaces
                .iter_mut()
                .find(|interface| interface.port_name() == name)
            {
                // Replugged ports reconnect when their flags ask for it
                if !interface.is_connected() && interface.accept_flags().any() {
                    if let Err(e) = interface.open() {
                        warn!(port = %name, error = %e, "MIDI port not reopened");
                    }
                }
                continue;
            }

            let mut interface =
                MidiInterface::new(name.clone(), Arc::clone(&self.transport), &self.mapper);
            if let Some(settings) = self.remembered.remove(&name) {
                if let Err(e) = interface.apply_settings(&settings) {
                    warn!(port = %name, error = %e, "MIDI settings not applied");
                }
            }
            info!(port = %name, "MIDI port discovered");
            self.interfaces.push(interface);
            added.push(name);
        }
        Ok(added)
    }

    pub fn interface_names(&self) -> Vec<String> {
        self.interfaces
            .iter()
            .map(|interface| interface.port_name().to_string())
            .collect()
    }

    pub fn interfaces(&self) -> &[MidiInterface] {
        &self.interfaces
    }

    pub fn interface(&self, port: &str) -> Option<&MidiInterface> {
        self.interfaces
            .iter()
            .find(|interface| interface.port_name() == port)
    }

    /// Run `f` on the interface of `port`, if it has been discovered.
    pub fn with_interface<F, R>(&mut self, port: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut MidiInterface) -> R,
    {
        self.interfaces
            .iter_mut()
            .find(|interface| interface.port_name() == port)
            .map(f)
    }

    /// Close every interface. Settings are kept.
    pub fn close_all(&mut self) {
        for interface in &mut self.interfaces {
            interface.close();
        }
    }

    // ==================== Settings ====================

    /// Apply settings to discovered ports and remember the rest.
    ///
    /// A port whose settings fail to apply is logged and skipped.
    pub fn apply_settings(&mut self, settings: &MidiSettings) {
        for entry in &settings.interfaces {
            match self.with_interface(&entry.port, |interface| interface.apply_settings(entry)) {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    warn!(port = %entry.port, error = %e, "MIDI settings not applied")
                }
                None => self.remembered.upsert(entry.clone()),
            }
        }
    }

    /// Current settings of every known port, plugged in or not.
    pub fn settings(&self) -> MidiSettings {
        let mut settings = self.remembered.clone();
        for interface in &self.interfaces {
            settings.upsert(interface.settings());
        }
        settings
    }

    pub fn load_settings(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let settings = MidiSettings::load(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            ports = settings.interfaces.len(),
            "MIDI settings loaded"
        );
        self.apply_settings(&settings);
        Ok(())
    }

    pub fn save_settings(&self, path: impl AsRef<Path>) -> Result<()> {
        self.settings().save(path)?;
        Ok(())
    }

    // ==================== Dispatch ====================

    /// Handle queued MIDI input on this thread.
    ///
    /// With a dispatcher thread running the queue is drained there and this
    /// usually returns 0.
    pub fn pump(&self) -> usize {
        self.mapper.process_pending()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatcher
            .as_ref()
            .is_some_and(DispatcherHandle::is_running)
    }
}

impl Drop for StrobeEngine {
    fn drop(&mut self) {
        // Stop routing before the interfaces go away
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.stop();
        }
        self.close_all();
    }
}

impl std::fmt::Debug for StrobeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrobeEngine")
            .field("interfaces", &self.interface_names())
            .field("mapper", &self.mapper)
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}
