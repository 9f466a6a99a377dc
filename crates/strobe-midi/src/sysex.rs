//! System exclusive framing, universal sub-IDs and reassembly of SysEx
//! messages split across transport callbacks.

use crate::status;

/// Non-realtime universal SysEx (2nd byte of the message).
pub const NON_REALTIME: u8 = 0x7E;
/// General information sub-ID #1.
pub const GENERAL_INFORMATION: u8 = 0x06;
/// Identity request sub-ID #2.
pub const IDENTITY_REQUEST: u8 = 0x01;
/// Identity reply sub-ID #2.
pub const IDENTITY_REPLY: u8 = 0x02;

/// Device channel used when probing a device.
pub const INQUIRY_CHANNEL: u8 = 0x00;

/// Largest SysEx message the assembler will buffer.
pub const MAX_SYSEX_LEN: usize = 64 * 1024;

/// Universal "Identity Request" (`F0 7E 00 06 01 F7`).
pub fn identity_request() -> Vec<u8> {
    vec![
        status::SYSEX_START,
        NON_REALTIME,
        INQUIRY_CHANNEL,
        GENERAL_INFORMATION,
        IDENTITY_REQUEST,
        status::SYSEX_END,
    ]
}

/// Wrap a payload in SysEx framing.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 2);
    bytes.push(status::SYSEX_START);
    bytes.extend(payload.iter().map(|b| b & 0x7F));
    bytes.push(status::SYSEX_END);
    bytes
}

/// Reassembles SysEx messages delivered in several chunks.
///
/// Complete messages and everything that is not SysEx pass straight through.
/// Real-time bytes may interleave a SysEx transfer and are passed through
/// without disturbing it. Any other status byte aborts the pending message.
#[derive(Debug, Default)]
pub struct SysExAssembler {
    pending: Option<Vec<u8>>,
}

impl SysExAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a SysEx message is partially received.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one transport chunk. Returns a complete message when one is ready.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        let &first = chunk.first()?;

        if first == status::SYSEX_START {
            if self.pending.take().is_some() {
                tracing::debug!("SysEx restarted before terminator, dropping partial message");
            }
            if chunk.last() == Some(&status::SYSEX_END) {
                return Some(chunk.to_vec());
            }
            self.pending = Some(chunk.to_vec());
            return None;
        }

        if status::is_realtime(first) {
            return Some(chunk.to_vec());
        }

        let Some(mut pending) = self.pending.take() else {
            return Some(chunk.to_vec());
        };

        if status::is_status(first) && first != status::SYSEX_END {
            tracing::debug!(
                status = first,
                len = pending.len(),
                "SysEx interrupted by status byte, dropping partial message"
            );
            return Some(chunk.to_vec());
        }

        pending.extend_from_slice(chunk);
        if pending.len() > MAX_SYSEX_LEN {
            tracing::warn!(len = pending.len(), "SysEx message too large, dropped");
            return None;
        }
        if chunk.contains(&status::SYSEX_END) {
            return Some(pending);
        }
        self.pending = Some(pending);
        None
    }

    /// Drop any partially received message.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
