//! Parameter tree boundary.
//!
//! The mapper resolves mapping paths through [`ParameterTree`]. Paths are
//! dotted (`"layer1.color.hue"`); a property node such as `"layer1.color"`
//! has the parameters one level below it as children.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::parameter::SharedParameter;

pub trait ParameterTree: Send + Sync {
    /// Live parameter registered under `path`.
    fn resolve(&self, path: &str) -> Option<SharedParameter>;

    /// Direct children of a property node, in registration order.
    fn children(&self, path: &str) -> Vec<SharedParameter>;
}

/// Flat registry of parameters keyed by their path.
#[derive(Default)]
pub struct ParameterRegistry {
    parameters: RwLock<Vec<SharedParameter>>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter, replacing one with the same path in place.
    pub fn register(&self, parameter: SharedParameter) -> Option<SharedParameter> {
        let mut parameters = self.parameters.write();
        match parameters.iter_mut().find(|p| p.path() == parameter.path()) {
            Some(existing) => Some(std::mem::replace(existing, parameter)),
            None => {
                parameters.push(parameter);
                None
            }
        }
    }

    pub fn unregister(&self, path: &str) -> Option<SharedParameter> {
        let mut parameters = self.parameters.write();
        let index = parameters.iter().position(|p| p.path() == path)?;
        Some(parameters.remove(index))
    }

    pub fn paths(&self) -> Vec<String> {
        self.parameters
            .read()
            .iter()
            .map(|p| p.path().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.read().is_empty()
    }
}

impl ParameterTree for ParameterRegistry {
    fn resolve(&self, path: &str) -> Option<SharedParameter> {
        self.parameters
            .read()
            .iter()
            .find(|p| p.path() == path)
            .map(Arc::clone)
    }

    fn children(&self, path: &str) -> Vec<SharedParameter> {
        let prefix = format!("{path}.");
        self.parameters
            .read()
            .iter()
            .filter(|p| {
                p.path()
                    .strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
            })
            .map(Arc::clone)
            .collect()
    }
}

impl std::fmt::Debug for ParameterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterRegistry")
            .field("paths", &self.paths())
            .finish()
    }
}
