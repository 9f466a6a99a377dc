//! Runtime registry routing controller events to parameters.
//!
//! The mapper owns everything shared between interfaces: the interface id
//! counter, the live `ControlSelector -> parameter` associations, the MIDI
//! learn session and the inbound message queue. All of it sits behind one
//! lock, so a decode-and-route step completes before the next one starts.
//!
//! Lock order: mapper state, then parameter state, then output connection.
//!
//! ```ignore
//! let mapper = MidiMapper::builder().tree(registry).build()?;
//! let mut pad = MidiInterface::new("nanoKONTROL2 28:0", transport, &mapper);
//! pad.set_accept_control_change(true);
//!
//! mapper.begin_learn_path("master.brightness")?;
//! // ... move a fader ...
//! mapper.process_pending();
//! ```

mod builder;
mod dispatch;
mod learn;

pub use builder::MidiMapperBuilder;
pub use dispatch::DispatcherHandle;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use strobe_midi::MidiEvent;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::interface::InterfaceShared;
use crate::mapping::{Binding, MidiMapping};
use crate::parameter::{FeedbackTarget, SharedParameter};
use crate::selector::{ControlSelector, InterfaceId};
use crate::tree::ParameterTree;

use learn::LearnSession;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Raw message waiting for dispatch.
#[derive(Debug, Clone)]
pub(crate) struct InboundMessage {
    pub(crate) interface: InterfaceId,
    pub(crate) timestamp: u64,
    pub(crate) bytes: Vec<u8>,
}

/// Result of applying a mapping file to an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub bound: Vec<Binding>,
    /// Bindings whose parameter path did not resolve.
    pub failed: Vec<Binding>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The bound parameter received the value.
    Routed {
        selector: ControlSelector,
        parameter: String,
    },
    /// A learn session captured the control.
    Learned {
        selector: ControlSelector,
        parameter: String,
    },
    Dropped,
}

/// Notifications delivered to [`MidiMapper::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperEvent {
    LearnArmed { parameter: String },
    Learned {
        selector: ControlSelector,
        parameter: String,
    },
    LearnCancelled,
}

struct MapperState {
    next_interface_id: InterfaceId,
    interfaces: HashMap<InterfaceId, Weak<InterfaceShared>>,
    associations: HashMap<ControlSelector, SharedParameter>,
    by_parameter: HashMap<String, ControlSelector>,
    /// Loaded plus learned bindings per interface.
    active: HashMap<InterfaceId, MidiMapping>,
    learn: Option<LearnSession>,
    listeners: Vec<Sender<MapperEvent>>,
}

impl MapperState {
    fn new() -> Self {
        Self {
            next_interface_id: 1,
            interfaces: HashMap::new(),
            associations: HashMap::new(),
            by_parameter: HashMap::new(),
            active: HashMap::new(),
            learn: None,
            listeners: Vec::new(),
        }
    }

    fn interface(&self, id: InterfaceId) -> Option<Arc<InterfaceShared>> {
        self.interfaces.get(&id).and_then(Weak::upgrade)
    }

    fn notify(&mut self, event: MapperEvent) {
        self.listeners
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    /// One parameter per selector, one selector per parameter.
    fn bind(&mut self, selector: ControlSelector, parameter: SharedParameter) {
        let path = parameter.path().to_string();

        if let Some(previous) = self.by_parameter.remove(&path) {
            if previous != selector {
                self.associations.remove(&previous);
                if let Some(mapping) = self.active.get_mut(&previous.interface) {
                    mapping.unbind(previous.address());
                }
            }
        }

        if let Some(displaced) = self.associations.insert(selector, Arc::clone(&parameter)) {
            if displaced.path() != path {
                self.by_parameter.remove(displaced.path());
                displaced.base().set_feedback(None);
            }
        }

        self.by_parameter.insert(path.clone(), selector);
        self.active
            .entry(selector.interface)
            .or_default()
            .bind(selector.address(), path);

        let output = self
            .interface(selector.interface)
            .map(|interface| interface.output.clone());
        parameter
            .base()
            .set_feedback(Some(FeedbackTarget { selector, output }));
    }

    fn unbind(&mut self, selector: ControlSelector) -> Option<String> {
        let parameter = self.associations.remove(&selector)?;
        self.by_parameter.remove(parameter.path());
        parameter.base().set_feedback(None);
        if let Some(mapping) = self.active.get_mut(&selector.interface) {
            mapping.unbind(selector.address());
        }
        Some(parameter.path().to_string())
    }

    fn flush(&mut self, interface: InterfaceId) {
        let selectors: Vec<ControlSelector> = self
            .associations
            .keys()
            .filter(|selector| selector.interface == interface)
            .copied()
            .collect();
        for selector in selectors {
            self.unbind(selector);
        }
        self.active.remove(&interface);
    }

    fn route(&mut self, interface: InterfaceId, event: &MidiEvent) -> RouteOutcome {
        let (Some(selector), Some(value)) =
            (ControlSelector::from_event(interface, event), event.value())
        else {
            return RouteOutcome::Dropped;
        };

        if let Some(parameter) = self.associations.get(&selector) {
            parameter.set_value_from_midi(value);
            return RouteOutcome::Routed {
                selector,
                parameter: parameter.path().to_string(),
            };
        }

        if event.is_learnable() {
            if let Some(parameter) = self.capture_learn(selector) {
                return RouteOutcome::Learned {
                    selector,
                    parameter,
                };
            }
        }

        RouteOutcome::Dropped
    }
}

pub(crate) struct MapperInner {
    state: Mutex<MapperState>,
    tree: Arc<dyn ParameterTree>,
    inbound_tx: Sender<InboundMessage>,
    inbound_rx: Receiver<InboundMessage>,
}

/// Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct MidiMapper {
    inner: Arc<MapperInner>,
}

impl MidiMapper {
    pub fn builder() -> MidiMapperBuilder {
        MidiMapperBuilder::default()
    }

    pub fn new(tree: Arc<dyn ParameterTree>) -> Self {
        Self::with_capacity(tree, DEFAULT_QUEUE_CAPACITY)
    }

    pub(crate) fn with_capacity(tree: Arc<dyn ParameterTree>, queue_capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = crossbeam_channel::bounded(queue_capacity);
        Self {
            inner: Arc::new(MapperInner {
                state: Mutex::new(MapperState::new()),
                tree,
                inbound_tx,
                inbound_rx,
            }),
        }
    }

    pub fn tree(&self) -> Arc<dyn ParameterTree> {
        Arc::clone(&self.inner.tree)
    }

    pub fn subscribe(&self) -> Receiver<MapperEvent> {
        let (tx, rx) = unbounded();
        self.inner.state.lock().listeners.push(tx);
        rx
    }

    // ==================== Interfaces ====================

    pub(crate) fn allocate_interface_id(&self) -> InterfaceId {
        let mut state = self.inner.state.lock();
        let id = state.next_interface_id;
        state.next_interface_id += 1;
        id
    }

    pub(crate) fn register_interface(&self, id: InterfaceId, interface: &Arc<InterfaceShared>) {
        let mut state = self.inner.state.lock();
        state.interfaces.insert(id, Arc::downgrade(interface));
    }

    pub(crate) fn unregister_interface(&self, id: InterfaceId) {
        let mut state = self.inner.state.lock();
        state.flush(id);
        state.interfaces.remove(&id);
    }

    pub(crate) fn inbound_sender(&self) -> Sender<InboundMessage> {
        self.inner.inbound_tx.clone()
    }

    /// Interfaces currently registered.
    pub fn interface_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .interfaces
            .values()
            .filter(|interface| interface.strong_count() > 0)
            .count()
    }

    // ==================== Mappings ====================

    /// Resolve and bind every entry of `mapping` on `interface`.
    ///
    /// Entries whose parameter cannot be resolved are skipped and reported.
    pub fn load_midi_mapping(&self, interface: InterfaceId, mapping: &MidiMapping) -> LoadReport {
        let mut state = self.inner.state.lock();
        let mut report = LoadReport::default();

        for binding in mapping {
            match self.inner.tree.resolve(&binding.parameter) {
                Some(parameter) => {
                    state.bind(binding.selector(interface), parameter);
                    report.bound.push(binding.clone());
                }
                None => {
                    warn!(
                        interface,
                        parameter = %binding.parameter,
                        control = %binding.address(),
                        "mapped parameter not found, binding skipped"
                    );
                    report.failed.push(binding.clone());
                }
            }
        }

        if let Some(description) = mapping.description() {
            state
                .active
                .entry(interface)
                .or_default()
                .set_description(Some(description.to_string()));
        }
        report
    }

    /// Drop every live association of `interface`. Mapping files are untouched.
    pub fn flush_midi_mapping(&self, interface: InterfaceId) {
        let mut state = self.inner.state.lock();
        state.flush(interface);
        debug!(interface, "MIDI mapping flushed");
    }

    /// Bind `selector` to the parameter at `path`.
    pub fn bind(&self, selector: ControlSelector, path: &str) -> Result<()> {
        let parameter = self
            .inner
            .tree
            .resolve(path)
            .ok_or_else(|| Error::ParameterNotFound(path.to_string()))?;
        self.bind_parameter(selector, parameter);
        Ok(())
    }

    pub fn bind_parameter(&self, selector: ControlSelector, parameter: SharedParameter) {
        self.inner.state.lock().bind(selector, parameter);
    }

    /// Returns the path that was bound to `selector`.
    pub fn unbind(&self, selector: ControlSelector) -> Option<String> {
        self.inner.state.lock().unbind(selector)
    }

    pub fn binding(&self, selector: ControlSelector) -> Option<String> {
        self.inner
            .state
            .lock()
            .associations
            .get(&selector)
            .map(|parameter| parameter.path().to_string())
    }

    /// Live bindings of `interface`, ordered by channel and control.
    pub fn bindings(&self, interface: InterfaceId) -> Vec<(ControlSelector, String)> {
        let state = self.inner.state.lock();
        let mut bindings: Vec<_> = state
            .associations
            .iter()
            .filter(|(selector, _)| selector.interface == interface)
            .map(|(selector, parameter)| (*selector, parameter.path().to_string()))
            .collect();
        bindings.sort();
        bindings
    }

    pub fn has_bindings(&self, interface: InterfaceId) -> bool {
        self.inner
            .state
            .lock()
            .associations
            .keys()
            .any(|selector| selector.interface == interface)
    }

    /// Selector driving the parameter at `path`.
    pub fn selector_for(&self, path: &str) -> Option<ControlSelector> {
        self.inner.state.lock().by_parameter.get(path).copied()
    }

    /// Loaded and learned bindings of `interface`, in file form.
    pub fn active_mapping(&self, interface: InterfaceId) -> Option<MidiMapping> {
        self.inner.state.lock().active.get(&interface).cloned()
    }

    // ==================== Routing ====================

    /// Route one decoded event from `interface`.
    ///
    /// Hit: the bound parameter takes the value. Miss with an armed learn
    /// session and a control change or note on: the control is captured.
    /// Anything else is dropped.
    pub fn route(&self, interface: InterfaceId, event: &MidiEvent) -> RouteOutcome {
        self.inner.state.lock().route(interface, event)
    }
}

impl std::fmt::Debug for MidiMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("MidiMapper")
            .field("interfaces", &state.interfaces.len())
            .field("associations", &state.associations.len())
            .field("learning", &state.learn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{MidiControllable, MidiControllableReal};
    use crate::selector::ControlAddress;
    use crate::tree::ParameterRegistry;
    use approx::assert_relative_eq;

    fn setup(paths: &[&str]) -> (MidiMapper, Vec<Arc<MidiControllableReal>>) {
        let registry = Arc::new(ParameterRegistry::new());
        let params: Vec<_> = paths
            .iter()
            .map(|path| {
                let param = Arc::new(MidiControllableReal::new(*path, *path));
                registry.register(param.clone());
                param
            })
            .collect();
        (MidiMapper::new(registry), params)
    }

    #[test]
    fn test_route_hit_scales_value() {
        let (mapper, params) = setup(&["master.brightness"]);
        let selector = ControlSelector::new(1, 0, 16);
        mapper.bind(selector, "master.brightness").unwrap();

        let outcome = mapper.route(1, &MidiEvent::control_change(0, 16, 127));
        assert_eq!(
            outcome,
            RouteOutcome::Routed {
                selector,
                parameter: "master.brightness".into()
            }
        );
        assert_relative_eq!(params[0].value(), 1.0);

        // Same control on another interface is a miss
        assert_eq!(
            mapper.route(2, &MidiEvent::control_change(0, 16, 0)),
            RouteOutcome::Dropped
        );
        assert_relative_eq!(params[0].value(), 1.0);
    }

    #[test]
    fn test_note_off_routes_zero() {
        let (mapper, params) = setup(&["flash"]);
        mapper.bind(ControlSelector::new(1, 9, 36), "flash").unwrap();
        mapper.route(1, &MidiEvent::note_on(9, 36, 127));
        assert_relative_eq!(params[0].value(), 1.0);
        mapper.route(1, &MidiEvent::note_off(9, 36, 64));
        assert_relative_eq!(params[0].value(), 0.0);
    }

    #[test]
    fn test_load_reports_unresolved_bindings() {
        let (mapper, _) = setup(&["a", "b"]);
        let mut mapping = MidiMapping::new();
        mapping.bind(ControlAddress::new(0, 1), "a");
        mapping.bind(ControlAddress::new(0, 2), "missing");
        mapping.bind(ControlAddress::new(0, 3), "b");

        let report = mapper.load_midi_mapping(4, &mapping);
        assert_eq!(report.bound.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].parameter, "missing");
        assert!(!report.is_complete());

        assert_eq!(
            mapper.bindings(4),
            vec![
                (ControlSelector::new(4, 0, 1), "a".to_string()),
                (ControlSelector::new(4, 0, 3), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_selector_holds_one_parameter() {
        let (mapper, params) = setup(&["a", "b"]);
        let selector = ControlSelector::new(1, 0, 1);
        mapper.bind(selector, "a").unwrap();
        mapper.bind(selector, "b").unwrap();

        assert_eq!(mapper.binding(selector), Some("b".to_string()));
        assert_eq!(mapper.selector_for("a"), None);
        assert!(!params[0].base().is_bound());
        assert_eq!(params[1].base().bound_selector(), Some(selector));
    }

    #[test]
    fn test_parameter_holds_one_selector() {
        let (mapper, _) = setup(&["a"]);
        mapper.bind(ControlSelector::new(1, 0, 1), "a").unwrap();
        mapper.bind(ControlSelector::new(1, 0, 2), "a").unwrap();

        assert_eq!(mapper.binding(ControlSelector::new(1, 0, 1)), None);
        assert_eq!(mapper.bindings(1).len(), 1);
        assert_eq!(mapper.active_mapping(1).map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_flush_only_touches_one_interface() {
        let (mapper, params) = setup(&["a", "b"]);
        mapper.bind(ControlSelector::new(1, 0, 1), "a").unwrap();
        mapper.bind(ControlSelector::new(2, 0, 1), "b").unwrap();

        mapper.flush_midi_mapping(1);
        assert!(!mapper.has_bindings(1));
        assert!(mapper.has_bindings(2));
        assert!(mapper.active_mapping(1).is_none());
        assert!(!params[0].base().is_bound());
        assert!(params[1].base().is_bound());
    }

    #[test]
    fn test_bind_unknown_path() {
        let (mapper, _) = setup(&[]);
        assert!(matches!(
            mapper.bind(ControlSelector::new(1, 0, 1), "nope"),
            Err(Error::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_unbind() {
        let (mapper, _) = setup(&["a"]);
        let selector = ControlSelector::new(1, 3, 4);
        mapper.bind(selector, "a").unwrap();
        assert_eq!(mapper.unbind(selector), Some("a".to_string()));
        assert_eq!(mapper.unbind(selector), None);
        assert_eq!(
            mapper.route(1, &MidiEvent::control_change(3, 4, 1)),
            RouteOutcome::Dropped
        );
    }
}
