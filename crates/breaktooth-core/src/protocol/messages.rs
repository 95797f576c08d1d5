//! Messages exchanged between the key injector and the emulation service.
//!
//! The injector is the only sender and the service the only receiver; there
//! are no replies, so the protocol has a single request type today.

use crate::report::state::{KeyState, KEY_SLOTS};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current IPC protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a receiver will accept.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Default filesystem address of the service endpoint.
pub const DEFAULT_SOCKET_PATH: &str = "/run/breaktooth/org.breaktooth.kbservice.sock";

// ── Message type codes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    SendKeys = 0x01,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::SendKeys),
            _ => Err(()),
        }
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// SEND_KEYS (0x01): the complete current keyboard state.
///
/// Payload: `[modifiers:1][count:1][keys:count]`, `count <= 6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendKeysMessage {
    /// Modifier bitmask, HID boot keyboard bit order.
    pub modifiers: u8,
    /// Up to six usage codes; absent trailing slots are empty.
    pub keys: Vec<u8>,
}

impl SendKeysMessage {
    /// Builds the message carrying a full [`KeyState`].
    pub fn from_state(state: &KeyState) -> Self {
        Self {
            modifiers: state.modifiers.bits(),
            keys: state.keys.to_vec(),
        }
    }

    /// Rebuilds the report state on the receiving side.
    pub fn to_state(&self) -> KeyState {
        KeyState::from_parts(self.modifiers, &self.keys)
    }
}

/// Every request the service understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcRequest {
    SendKeys(SendKeysMessage),
}

impl IpcRequest {
    pub fn message_type(&self) -> MessageType {
        match self {
            IpcRequest::SendKeys(_) => MessageType::SendKeys,
        }
    }
}

/// Maximum number of usage codes in a [`SendKeysMessage`].
pub const MAX_KEYS: usize = KEY_SLOTS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_try_from_rejects_unknown_codes() {
        assert_eq!(MessageType::try_from(0x01), Ok(MessageType::SendKeys));
        assert!(MessageType::try_from(0x00).is_err());
        assert!(MessageType::try_from(0x40).is_err());
    }

    #[test]
    fn test_send_keys_state_round_trip() {
        // Arrange
        let state = KeyState::from_parts(0b0010_0001, &[0x04, 0x16, 0x00, 0x2C]);

        // Act
        let msg = SendKeysMessage::from_state(&state);

        // Assert
        assert_eq!(msg.keys.len(), MAX_KEYS);
        assert_eq!(msg.to_state(), state);
    }

    #[test]
    fn test_short_key_buffer_defaults_trailing_slots_to_empty() {
        let msg = SendKeysMessage {
            modifiers: 0,
            keys: vec![0x04],
        };

        assert_eq!(msg.to_state().keys, [0x04, 0, 0, 0, 0, 0]);
    }
}
