//! Device identification from universal SysEx identity replies.
//!
//! Reply payload layout (framing stripped):
//!
//! ```text
//! 0     1    2     3     4    5       6       7        8        9..10  11..12
//! 7E    dev  06    02    mfr  fam_lo  fam_hi  mod_lo   mod_hi   minor  major
//! ```
//!
//! Manufacturer ids: <http://www.midi.org/techspecs/manid.php>

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sysex::{GENERAL_INFORMATION, IDENTITY_REPLY, NON_REALTIME};

/// Shortest payload carrying every field of an identity reply.
pub const MIN_IDENTITY_REPLY_LEN: usize = 13;

pub const MANUFACTURER_KORG: u8 = 0x42;
pub const KORG_FAMILY_NANOKONTROL: u16 = 0x0104;
pub const KORG_FAMILY_NANOKONTROL2: u16 = 0x0113;

/// MIDI manufacturer id, either the one-byte form or the three-byte form
/// introduced by a zero byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManufacturerId {
    Standard(u8),
    Extended(u8, u8),
}

impl ManufacturerId {
    /// Numeric id; the extended form is `(b1 << 8) | b2`.
    pub fn value(&self) -> u32 {
        match *self {
            Self::Standard(id) => id as u32,
            Self::Extended(hi, lo) => ((hi as u32) << 8) | lo as u32,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::Standard(MANUFACTURER_KORG) => Some("Korg"),
            _ => None,
        }
    }
}

/// Metadata reported by a device. `None` fields are unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_channel: Option<u8>,
    pub manufacturer: Option<ManufacturerId>,
    pub family: Option<u16>,
    pub model: Option<u16>,
    /// `(major, minor)`
    pub version: Option<(u16, u16)>,
}

impl DeviceIdentity {
    /// No field could be parsed.
    pub fn is_unknown(&self) -> bool {
        self.manufacturer.is_none()
            && self.family.is_none()
            && self.model.is_none()
            && self.version.is_none()
    }

    pub fn manufacturer_name(&self) -> Option<&'static str> {
        self.manufacturer.as_ref().and_then(ManufacturerId::name)
    }

    pub fn model_name(&self) -> Option<&'static str> {
        match (self.manufacturer?, self.family?) {
            (ManufacturerId::Standard(MANUFACTURER_KORG), KORG_FAMILY_NANOKONTROL) => {
                Some("nanoKONTROL")
            }
            (ManufacturerId::Standard(MANUFACTURER_KORG), KORG_FAMILY_NANOKONTROL2) => {
                Some("nanoKONTROL2")
            }
            _ => None,
        }
    }

    /// Human readable summary, e.g. `Manufacturer: Korg, Model: nanoKONTROL2, Version: 1.0`.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        match (self.manufacturer_name(), self.manufacturer) {
            (Some(name), _) => parts.push(format!("Manufacturer: {name}")),
            (None, Some(id)) => parts.push(format!("Manufacturer: {:#04x}", id.value())),
            (None, None) => {}
        }
        match (self.model_name(), self.family) {
            (Some(name), _) => parts.push(format!("Model: {name}")),
            (None, Some(family)) => parts.push(format!("Family: {family:#06x}")),
            (None, None) => {}
        }
        if let Some((major, minor)) = self.version {
            parts.push(format!("Version: {major}.{minor}"));
        }
        if parts.is_empty() {
            return f.write_str("Unknown device");
        }
        f.write_str(&parts.join(", "))
    }
}

/// Whether a SysEx payload carries the identity reply sub-IDs.
pub fn is_identity_reply(payload: &[u8]) -> bool {
    payload.len() >= 4
        && payload[0] == NON_REALTIME
        && payload[2] == GENERAL_INFORMATION
        && payload[3] == IDENTITY_REPLY
}

/// Parse an identity reply payload (without `F0`/`F7`).
///
/// Payloads that are too short or do not carry the identity reply sub-IDs
/// yield an identity with every field unknown.
pub fn parse_identity_reply(payload: &[u8]) -> DeviceIdentity {
    if payload.len() < MIN_IDENTITY_REPLY_LEN || !is_identity_reply(payload) {
        return DeviceIdentity::default();
    }

    let le16 = |offset: usize| payload[offset] as u16 | (payload[offset + 1] as u16) << 8;

    let manufacturer = match payload[4] {
        0 => ManufacturerId::Extended(payload[5], payload[6]),
        id => ManufacturerId::Standard(id),
    };

    // Offsets are fixed; the extended manufacturer form overlaps the family bytes.
    DeviceIdentity {
        device_channel: Some(payload[1]),
        manufacturer: Some(manufacturer),
        family: Some(le16(5)),
        model: Some(le16(7)),
        version: Some((le16(11), le16(9))),
    }
}
