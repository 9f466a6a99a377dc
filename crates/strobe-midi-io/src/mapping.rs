//! Persisted control-to-parameter tables.
//!
//! A mapping file is device independent; the interface it is applied to
//! supplies the interface id.
//!
//! ```toml
//! description = "nanoKONTROL2 master page"
//!
//! [[binding]]
//! channel = 0
//! control = 16
//! parameter = "master.brightness"
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::selector::{ControlAddress, ControlSelector, InterfaceId};

/// One persisted binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub channel: u8,
    pub control: u8,
    pub parameter: String,
}

impl Binding {
    pub fn new(address: ControlAddress, parameter: impl Into<String>) -> Self {
        Self {
            channel: address.channel,
            control: address.control,
            parameter: parameter.into(),
        }
    }

    pub fn address(&self) -> ControlAddress {
        ControlAddress::new(self.channel, self.control)
    }

    pub fn selector(&self, interface: InterfaceId) -> ControlSelector {
        self.address().on(interface)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MappingFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, rename = "binding")]
    bindings: Vec<Binding>,
}

/// Ordered table of bindings, unique per [`ControlAddress`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiMapping {
    description: Option<String>,
    bindings: Vec<Binding>,
}

impl MidiMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            bindings: Vec::new(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Bind `address` to `parameter`, overwriting in place.
    ///
    /// Returns the parameter previously bound to `address`.
    pub fn bind(
        &mut self,
        address: ControlAddress,
        parameter: impl Into<String>,
    ) -> Option<String> {
        let parameter = parameter.into();
        match self.bindings.iter_mut().find(|b| b.address() == address) {
            Some(existing) => Some(std::mem::replace(&mut existing.parameter, parameter)),
            None => {
                self.bindings.push(Binding::new(address, parameter));
                None
            }
        }
    }

    pub fn unbind(&mut self, address: ControlAddress) -> Option<String> {
        let index = self.bindings.iter().position(|b| b.address() == address)?;
        Some(self.bindings.remove(index).parameter)
    }

    /// Remove every binding targeting `parameter`.
    pub fn unbind_parameter(&mut self, parameter: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.parameter != parameter);
        before - self.bindings.len()
    }

    pub fn get(&self, address: ControlAddress) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.address() == address)
            .map(|b| b.parameter.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Parse the TOML representation. Later duplicates overwrite earlier ones.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, String> {
        let file: MappingFile = toml::from_str(text).map_err(|e| e.to_string())?;

        let mut mapping = Self {
            description: file.description,
            bindings: Vec::with_capacity(file.bindings.len()),
        };
        for binding in file.bindings {
            if binding.channel > 15 {
                return Err(format!(
                    "channel {} out of range for '{}'",
                    binding.channel, binding.parameter
                ));
            }
            if binding.control > 127 {
                return Err(format!(
                    "control {} out of range for '{}'",
                    binding.control, binding.parameter
                ));
            }
            if binding.parameter.is_empty() {
                return Err(format!("empty parameter path for {}", binding.address()));
            }
            mapping.bind(binding.address(), binding.parameter);
        }
        Ok(mapping)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, String> {
        let file = MappingFile {
            description: self.description.clone(),
            bindings: self.bindings.clone(),
        };
        toml::to_string_pretty(&file).map_err(|e| e.to_string())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MappingNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_toml_str(&text).map_err(|reason| Error::MappingFileInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self
            .to_toml_string()
            .map_err(|reason| Error::MappingFileInvalid {
                path: path.to_path_buf(),
                reason,
            })?;
        fs::write(path, text)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MidiMapping {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}
