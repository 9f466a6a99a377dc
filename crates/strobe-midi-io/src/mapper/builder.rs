//! MidiMapper builder.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::tree::{ParameterRegistry, ParameterTree};

use super::{MidiMapper, DEFAULT_QUEUE_CAPACITY};

pub struct MidiMapperBuilder {
    pub(super) tree: Option<Arc<dyn ParameterTree>>,
    pub(super) queue_capacity: usize,
}

impl Default for MidiMapperBuilder {
    fn default() -> Self {
        Self {
            tree: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl MidiMapperBuilder {
    /// Parameter tree mapping paths resolve against. Defaults to an empty
    /// [`ParameterRegistry`].
    pub fn tree(mut self, tree: Arc<dyn ParameterTree>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Inbound messages buffered before new ones are dropped.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<MidiMapper> {
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "inbound queue capacity must be at least 1".into(),
            ));
        }
        let tree = self
            .tree
            .unwrap_or_else(|| Arc::new(ParameterRegistry::new()) as Arc<dyn ParameterTree>);
        Ok(MidiMapper::with_capacity(tree, self.queue_capacity))
    }
}
