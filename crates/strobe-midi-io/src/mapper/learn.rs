//! MIDI learn: bind the next unmapped control that moves.
//!
//! One session is armed per mapper. Arming a new one replaces it. A property
//! session queues the children of a property node (e.g. hue then lightness
//! of a color) and binds them to successive controls.

use std::collections::VecDeque;

use tracing::info;

use super::{MapperEvent, MapperState, MidiMapper};
use crate::error::{Error, Result};
use crate::parameter::SharedParameter;
use crate::selector::ControlSelector;

pub(super) struct LearnSession {
    pending: VecDeque<SharedParameter>,
}

impl LearnSession {
    fn target(&self) -> Option<&str> {
        self.pending.front().map(|parameter| parameter.path())
    }
}

impl MapperState {
    /// Bind `selector` to the next parameter of the armed session.
    pub(super) fn capture_learn(&mut self, selector: ControlSelector) -> Option<String> {
        let session = self.learn.as_mut()?;
        let parameter = session.pending.pop_front()?;
        let next = session.target().map(str::to_string);
        if next.is_none() {
            self.learn = None;
        }

        let path = parameter.path().to_string();
        self.bind(selector, parameter);
        info!(%selector, parameter = %path, "MIDI learn captured control");
        self.notify(MapperEvent::Learned {
            selector,
            parameter: path.clone(),
        });
        if let Some(next) = next {
            self.notify(MapperEvent::LearnArmed { parameter: next });
        }
        Some(path)
    }

    fn arm(&mut self, pending: VecDeque<SharedParameter>) {
        let target = pending.front().map(|p| p.path().to_string());
        self.learn = Some(LearnSession { pending });
        if let Some(parameter) = target {
            info!(%parameter, "MIDI learn armed");
            self.notify(MapperEvent::LearnArmed { parameter });
        }
    }
}

impl MidiMapper {
    /// Bind `parameter` to the next unmapped control change or note on.
    pub fn begin_learn(&self, parameter: SharedParameter) {
        self.inner.state.lock().arm(VecDeque::from([parameter]));
    }

    pub fn begin_learn_path(&self, path: &str) -> Result<()> {
        let parameter = self
            .inner
            .tree
            .resolve(path)
            .ok_or_else(|| Error::ParameterNotFound(path.to_string()))?;
        self.begin_learn(parameter);
        Ok(())
    }

    /// Learn every child of the property node at `path`, in tree order.
    ///
    /// A leaf path learns just that parameter. Returns how many controls
    /// the session will capture.
    pub fn begin_learn_property(&self, path: &str) -> Result<usize> {
        let mut children: VecDeque<SharedParameter> = self.inner.tree.children(path).into();
        if children.is_empty() {
            let parameter = self
                .inner
                .tree
                .resolve(path)
                .ok_or_else(|| Error::ParameterNotFound(path.to_string()))?;
            children.push_back(parameter);
        }
        let count = children.len();
        self.inner.state.lock().arm(children);
        Ok(count)
    }

    /// Disarm without binding anything.
    pub fn cancel_learn(&self) {
        let mut state = self.inner.state.lock();
        if state.learn.take().is_some() {
            info!("MIDI learn cancelled");
            state.notify(MapperEvent::LearnCancelled);
        }
    }

    pub fn is_learning(&self) -> bool {
        self.inner.state.lock().learn.is_some()
    }

    /// Path of the parameter the next captured control will drive.
    pub fn learn_target(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .learn
            .as_ref()
            .and_then(|session| session.target().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use strobe_midi::MidiEvent;

    use crate::mapper::RouteOutcome;
    use crate::parameter::MidiControllableReal;
    use crate::tree::ParameterRegistry;

    use super::*;

    fn registry(paths: &[&str]) -> (Arc<ParameterRegistry>, Vec<Arc<MidiControllableReal>>) {
        let registry = Arc::new(ParameterRegistry::new());
        let params = paths
            .iter()
            .map(|path| {
                let param = Arc::new(MidiControllableReal::new(*path, *path));
                registry.register(param.clone());
                param
            })
            .collect();
        (registry, params)
    }

    #[test]
    fn test_learn_binds_then_routes() {
        let (registry, params) = registry(&["strobe.rate"]);
        let mapper = MidiMapper::new(registry);
        let events = mapper.subscribe();

        mapper.begin_learn_path("strobe.rate").unwrap();
        assert!(mapper.is_learning());
        assert_eq!(mapper.learn_target().as_deref(), Some("strobe.rate"));

        let cc = MidiEvent::control_change(2, 10, 100);
        let selector = ControlSelector::new(1, 2, 10);
        assert_eq!(
            mapper.route(1, &cc),
            RouteOutcome::Learned {
                selector,
                parameter: "strobe.rate".into()
            }
        );
        assert!(!mapper.is_learning());
        assert_eq!(mapper.bindings(1), vec![(selector, "strobe.rate".to_string())]);
        // Capturing does not apply the value
        assert_relative_eq!(params[0].value(), 0.0);

        // The next event on the same control drives the parameter
        assert_eq!(
            mapper.route(1, &MidiEvent::control_change(2, 10, 127)),
            RouteOutcome::Routed {
                selector,
                parameter: "strobe.rate".into()
            }
        );
        assert_relative_eq!(params[0].value(), 1.0);

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                MapperEvent::LearnArmed {
                    parameter: "strobe.rate".into()
                },
                MapperEvent::Learned {
                    selector,
                    parameter: "strobe.rate".into()
                },
            ]
        );
    }

    #[test]
    fn test_learn_ignores_unqualified_events() {
        let (registry, _) = registry(&["p"]);
        let mapper = MidiMapper::new(registry);
        mapper.begin_learn_path("p").unwrap();

        for event in [
            MidiEvent::note_off(0, 60, 0),
            MidiEvent::program_change(0, 3),
            MidiEvent::Clock,
        ] {
            assert_eq!(mapper.route(1, &event), RouteOutcome::Dropped);
        }
        assert!(mapper.is_learning());

        assert!(matches!(
            mapper.route(1, &MidiEvent::note_on(0, 60, 100)),
            RouteOutcome::Learned { .. }
        ));
    }

    #[test]
    fn test_learn_does_not_steal_bound_controls() {
        let (registry, _) = registry(&["a", "b"]);
        let mapper = MidiMapper::new(registry);
        mapper.bind(ControlSelector::new(1, 0, 1), "a").unwrap();
        mapper.begin_learn_path("b").unwrap();

        assert!(matches!(
            mapper.route(1, &MidiEvent::control_change(0, 1, 5)),
            RouteOutcome::Routed { .. }
        ));
        assert!(mapper.is_learning());
    }

    #[test]
    fn test_cancel_and_replace() {
        let (registry, _) = registry(&["a", "b"]);
        let mapper = MidiMapper::new(registry);

        mapper.begin_learn_path("a").unwrap();
        mapper.begin_learn_path("b").unwrap();
        assert_eq!(mapper.learn_target().as_deref(), Some("b"));

        mapper.cancel_learn();
        assert!(!mapper.is_learning());
        assert_eq!(
            mapper.route(1, &MidiEvent::control_change(0, 1, 5)),
            RouteOutcome::Dropped
        );
        assert!(!mapper.has_bindings(1));

        assert!(matches!(
            mapper.begin_learn_path("missing"),
            Err(Error::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_property_learn_binds_children_in_order() {
        let (registry, _) = registry(&["layer.color.hue", "layer.color.lightness", "layer.alpha"]);
        let mapper = MidiMapper::new(registry);

        assert_eq!(mapper.begin_learn_property("layer.color").unwrap(), 2);
        assert_eq!(mapper.learn_target().as_deref(), Some("layer.color.hue"));

        mapper.route(1, &MidiEvent::control_change(0, 20, 1));
        assert_eq!(
            mapper.learn_target().as_deref(),
            Some("layer.color.lightness")
        );
        mapper.route(1, &MidiEvent::control_change(0, 21, 1));
        assert!(!mapper.is_learning());

        assert_eq!(
            mapper.bindings(1),
            vec![
                (ControlSelector::new(1, 0, 20), "layer.color.hue".to_string()),
                (
                    ControlSelector::new(1, 0, 21),
                    "layer.color.lightness".to_string()
                ),
            ]
        );

        // A leaf learns itself
        assert_eq!(mapper.begin_learn_property("layer.alpha").unwrap(), 1);
    }
}
