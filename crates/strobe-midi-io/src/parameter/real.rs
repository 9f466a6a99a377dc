use parking_lot::Mutex;
use strobe_midi::{midi_to_unit, unit_to_midi};

use super::{ChangeSource, MidiControllable, ParameterBase, ParameterValue};

/// Real valued parameter in `[0, 1]`.
#[derive(Debug)]
pub struct MidiControllableReal {
    base: ParameterBase,
    value: Mutex<f32>,
}

impl MidiControllableReal {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_value(path, label, 0.0)
    }

    pub fn with_value(path: impl Into<String>, label: impl Into<String>, value: f32) -> Self {
        Self {
            base: ParameterBase::new(path, label),
            value: Mutex::new(value.clamp(0.0, 1.0)),
        }
    }

    pub fn value(&self) -> f32 {
        *self.value.lock()
    }

    /// Application-originated update.
    ///
    /// Identical values are ignored. A changed value is announced, and echoed
    /// to the bound control only when its 7-bit form changed too and differs
    /// from what the device shows.
    pub fn set_value(&self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        let mut current = self.value.lock();
        if *current == value {
            return;
        }
        let previous = unit_to_midi(*current);
        *current = value;
        self.base
            .notify(ParameterValue::Real(value), ChangeSource::Application);
        let midi = unit_to_midi(value);
        if midi != previous {
            self.base.send_feedback(midi);
        }
    }
}

impl MidiControllable for MidiControllableReal {
    fn base(&self) -> &ParameterBase {
        &self.base
    }

    fn set_value_from_midi(&self, value: u8) {
        let value = value & 0x7F;
        let mut current = self.value.lock();
        self.base.record_device_value(value);
        let scaled = midi_to_unit(value);
        if *current == scaled {
            return;
        }
        *current = scaled;
        self.base.notify(ParameterValue::Real(scaled), ChangeSource::Midi);
    }

    fn midi_value(&self) -> u8 {
        unit_to_midi(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_midi_scaling() {
        let param = MidiControllableReal::new("master.brightness", "Brightness");
        param.set_value_from_midi(127);
        assert_relative_eq!(param.value(), 1.0);
        param.set_value_from_midi(64);
        assert_relative_eq!(param.value(), 64.0 / 127.0);
        assert_eq!(param.midi_value(), 64);
    }

    #[test]
    fn test_set_value_clamps_and_notifies_once() {
        let param = MidiControllableReal::new("p", "P");
        let changes = param.base().subscribe();

        param.set_value(2.0);
        param.set_value(1.0);
        assert_relative_eq!(param.value(), 1.0);

        let received: Vec<_> = changes.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].value, ParameterValue::Real(1.0));
        assert_eq!(received[0].source, ChangeSource::Application);
    }

    #[test]
    fn test_midi_change_notifies() {
        let param = MidiControllableReal::new("p", "P");
        let changes = param.base().subscribe();
        param.set_value_from_midi(0);
        param.set_value_from_midi(10);
        param.set_value_from_midi(10);

        let received: Vec<_> = changes.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].source, ChangeSource::Midi);
    }
}
