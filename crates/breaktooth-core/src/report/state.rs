//! The boot keyboard input report exchanged with the target host.
//!
//! Wire format (10 bytes, as written to the HID interrupt channel):
//! ```text
//! [0xA1][0x01][modifiers:1][reserved:1][key0][key1][key2][key3][key4][key5]
//! ```
//! `0xA1` is the Bluetooth HID transaction header "DATA | Input" and `0x01`
//! the keyboard report ID. Both are constants; only the modifier byte and the
//! six key slots carry state.

use thiserror::Error;

use crate::keymap::hid::ModifierSlot;

/// Transaction header byte: DATA (0xA0) | Input report (0x01).
pub const REPORT_KIND: u8 = 0xA1;

/// Report ID of the keyboard collection.
pub const REPORT_ID_KEYBOARD: u8 = 0x01;

/// Number of simultaneously reportable non-modifier keys.
pub const KEY_SLOTS: usize = 6;

/// Total encoded report length in bytes.
pub const REPORT_LEN: usize = 4 + KEY_SLOTS;

/// Value of an empty key slot.
pub const EMPTY_SLOT: u8 = 0x00;

/// Errors returned when decoding a received report buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report must be exactly {REPORT_LEN} bytes, got {0}")]
    Length(usize),

    #[error("unexpected report kind 0x{0:02X}")]
    ReportKind(u8),

    #[error("unexpected report id 0x{0:02X}")]
    ReportId(u8),

    #[error("reserved byte must be zero, got 0x{0:02X}")]
    Reserved(u8),
}

/// Modifier bitmask of the boot keyboard report.
///
/// Bit `n` is owned by the [`ModifierSlot`] whose discriminant is `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    /// Returns `true` if the slot's bit is set.
    pub fn contains(self, slot: ModifierSlot) -> bool {
        self.0 & slot.mask() != 0
    }

    /// Sets or clears the slot's bit.
    pub fn set(&mut self, slot: ModifierSlot, active: bool) {
        if active {
            self.0 |= slot.mask();
        } else {
            self.0 &= !slot.mask();
        }
    }

    /// Flips the slot's bit.
    pub fn toggle(&mut self, slot: ModifierSlot) {
        self.0 ^= slot.mask();
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Keyboard state as carried by one input report.
///
/// The marker bytes are not stored; [`KeyState::encode`] writes them and
/// [`KeyState::decode`] validates them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyState {
    /// Active modifier keys.
    pub modifiers: ModifierFlags,
    /// Active non-modifier usage codes, `0x00` meaning empty.
    pub keys: [u8; KEY_SLOTS],
}

impl KeyState {
    /// Returns a state with no keys held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from an IPC-style modifier byte and key buffer.
    ///
    /// Missing trailing slots are filled with `0x00`; keys beyond the sixth are ignored.
    pub fn from_parts(modifiers: u8, keys: &[u8]) -> Self {
        let mut slots = [EMPTY_SLOT; KEY_SLOTS];
        for (slot, key) in slots.iter_mut().zip(keys.iter()) {
            *slot = *key;
        }
        Self {
            modifiers: ModifierFlags(modifiers),
            keys: slots,
        }
    }

    /// Returns `true` if some slot currently holds `usage`.
    pub fn holds(&self, usage: u8) -> bool {
        usage != EMPTY_SLOT && self.keys.contains(&usage)
    }

    /// Returns `true` when no modifier and no slot is active.
    pub fn is_idle(&self) -> bool {
        self.modifiers.0 == 0 && self.keys.iter().all(|k| *k == EMPTY_SLOT)
    }

    /// Serializes the state into the 10-byte wire report.
    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut buf = [0u8; REPORT_LEN];
        buf[0] = REPORT_KIND;
        buf[1] = REPORT_ID_KEYBOARD;
        buf[2] = self.modifiers.0;
        buf[3] = 0x00; // reserved
        buf[4..].copy_from_slice(&self.keys);
        buf
    }

    /// Parses a 10-byte wire report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the length, either marker byte, or the
    /// reserved byte do not match the boot keyboard layout.
    pub fn decode(bytes: &[u8]) -> Result<Self, ReportError> {
        if bytes.len() != REPORT_LEN {
            return Err(ReportError::Length(bytes.len()));
        }
        if bytes[0] != REPORT_KIND {
            return Err(ReportError::ReportKind(bytes[0]));
        }
        if bytes[1] != REPORT_ID_KEYBOARD {
            return Err(ReportError::ReportId(bytes[1]));
        }
        if bytes[3] != 0x00 {
            return Err(ReportError::Reserved(bytes[3]));
        }

        let mut keys = [EMPTY_SLOT; KEY_SLOTS];
        keys.copy_from_slice(&bytes[4..]);
        Ok(Self {
            modifiers: ModifierFlags(bytes[2]),
            keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state_encodes_to_markers_and_zeroes() {
        // Arrange
        let state = KeyState::new();

        // Act
        let bytes = state.encode();

        // Assert
        assert_eq!(bytes, [0xA1, 0x01, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(state.is_idle());
    }

    #[test]
    fn test_from_parts_pads_short_key_buffer() {
        let state = KeyState::from_parts(0b0000_0010, &[0x04, 0x05]);

        assert_eq!(state.modifiers, ModifierFlags(0b0000_0010));
        assert_eq!(state.keys, [0x04, 0x05, 0, 0, 0, 0]);
    }

    #[test]
    fn test_from_parts_ignores_keys_beyond_sixth() {
        let state = KeyState::from_parts(0, &[1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(state.keys, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(KeyState::decode(&[0xA1, 0x01]), Err(ReportError::Length(2)));
    }

    #[test]
    fn test_decode_rejects_bad_markers_and_reserved_byte() {
        let mut bytes = KeyState::new().encode();
        bytes[0] = 0xA2;
        assert_eq!(KeyState::decode(&bytes), Err(ReportError::ReportKind(0xA2)));

        let mut bytes = KeyState::new().encode();
        bytes[1] = 0x02;
        assert_eq!(KeyState::decode(&bytes), Err(ReportError::ReportId(0x02)));

        let mut bytes = KeyState::new().encode();
        bytes[3] = 0x7F;
        assert_eq!(KeyState::decode(&bytes), Err(ReportError::Reserved(0x7F)));
    }

    #[test]
    fn test_modifier_flags_set_toggle_contains() {
        let mut flags = ModifierFlags::default();

        flags.set(ModifierSlot::RightGui, true);
        assert!(flags.contains(ModifierSlot::RightGui));
        assert_eq!(flags.bits(), 0b1000_0000);

        flags.toggle(ModifierSlot::RightGui);
        assert!(!flags.contains(ModifierSlot::RightGui));

        flags.toggle(ModifierSlot::LeftCtrl);
        flags.set(ModifierSlot::LeftCtrl, false);
        assert_eq!(flags.bits(), 0);
    }

    #[test]
    fn test_holds_never_matches_empty_slot() {
        let state = KeyState::new();
        assert!(!state.holds(EMPTY_SLOT));
    }
}
