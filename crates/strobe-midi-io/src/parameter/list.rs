use parking_lot::Mutex;
use strobe_midi::{index_to_midi, midi_to_index};

use super::{ChangeSource, MidiControllable, ParameterBase, ParameterValue};

/// Ordinal parameter selecting one entry of a fixed list, e.g. a blend mode.
///
/// The 7-bit range is split into as many equal buckets as there are items.
#[derive(Debug)]
pub struct MidiControllableList {
    base: ParameterBase,
    items: Vec<String>,
    index: Mutex<usize>,
}

impl MidiControllableList {
    pub fn new<I, S>(path: impl Into<String>, label: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base: ParameterBase::new(path, label),
            items: items.into_iter().map(Into::into).collect(),
            index: Mutex::new(0),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> usize {
        *self.index.lock()
    }

    pub fn current_item(&self) -> Option<&str> {
        self.items.get(self.index()).map(String::as_str)
    }

    /// Application-originated selection; out of range indices are clamped.
    pub fn set_index(&self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        let index = index.min(self.items.len() - 1);
        let mut current = self.index.lock();
        if *current == index {
            return;
        }
        let previous = index_to_midi(*current, self.items.len());
        *current = index;
        self.base
            .notify(ParameterValue::Index(index), ChangeSource::Application);
        let midi = index_to_midi(index, self.items.len());
        if midi != previous {
            self.base.send_feedback(midi);
        }
    }

    /// Select by item name. Returns `false` for unknown items.
    pub fn select(&self, item: &str) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(index) => {
                self.set_index(index);
                true
            }
            None => false,
        }
    }
}

impl MidiControllable for MidiControllableList {
    fn base(&self) -> &ParameterBase {
        &self.base
    }

    fn set_value_from_midi(&self, value: u8) {
        if self.items.is_empty() {
            return;
        }
        let mut current = self.index.lock();
        self.base.record_device_value(value & 0x7F);
        let index = midi_to_index(value, self.items.len());
        if *current == index {
            return;
        }
        *current = index;
        self.base.notify(ParameterValue::Index(index), ChangeSource::Midi);
    }

    fn midi_value(&self) -> u8 {
        index_to_midi(self.index(), self.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes() -> MidiControllableList {
        MidiControllableList::new("layer.blend", "Blend", ["add", "multiply", "screen", "xor"])
    }

    #[test]
    fn test_buckets() {
        let param = modes();
        param.set_value_from_midi(0);
        assert_eq!(param.current_item(), Some("add"));
        param.set_value_from_midi(40);
        assert_eq!(param.current_item(), Some("multiply"));
        param.set_value_from_midi(127);
        assert_eq!(param.current_item(), Some("xor"));
        assert_eq!(param.midi_value(), 127);
    }

    #[test]
    fn test_set_index_clamps() {
        let param = modes();
        param.set_index(99);
        assert_eq!(param.index(), 3);
        assert!(param.select("screen"));
        assert_eq!(param.index(), 2);
        assert!(!param.select("overlay"));
    }

    #[test]
    fn test_empty_list_ignores_input() {
        let param = MidiControllableList::new("x", "X", Vec::<String>::new());
        param.set_value_from_midi(100);
        param.set_index(2);
        assert_eq!(param.index(), 0);
        assert_eq!(param.current_item(), None);
        assert_eq!(param.midi_value(), 0);
    }
}
