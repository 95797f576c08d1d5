//! Key transition to report translation.
//!
//! Every qualifying key transition read from the local keyboard is folded into
//! a [`KeyState`] with [`apply`]. Modifier keys drive a bit of the modifier
//! byte; every other key occupies one of the six slots while it is held.
//!
//! Slot rules:
//! - press: the usage code goes into the first empty slot (lowest index).
//!   With all six slots busy the press is dropped.
//! - release: the first slot holding the usage code is cleared. Releasing a
//!   key that is not held is a no-op.
//! - a usage code never occupies two slots.

use serde::{Deserialize, Serialize};

use crate::keymap::hid::{HidKeyCode, ModifierSlot};
use crate::keymap::linux_evdev::evdev_to_hid;
use crate::report::state::{KeyState, EMPTY_SLOT};

/// How a modifier transition changes its bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierMode {
    /// Every press and every release flips the bit.
    ///
    /// Correct as long as each press is paired with exactly one release; a
    /// duplicated or missed transition inverts the bit until the next one.
    #[default]
    Toggle,
    /// Press sets the bit, release clears it.
    Level,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Modifier(ModifierSlot),
    NotModifier,
}

/// Classifies an evdev key code as a modifier slot or an ordinary key.
pub fn classify(key: u16) -> KeyClass {
    match evdev_to_hid(key).modifier_slot() {
        Some(slot) => KeyClass::Modifier(slot),
        None => KeyClass::NotModifier,
    }
}

/// Returns the HID usage code for an evdev key code, `0x00` when unmapped.
pub fn usage_code(key: u16) -> u8 {
    evdev_to_hid(key).as_u8()
}

/// Folds one key transition into `state` using [`ModifierMode::Toggle`].
pub fn apply(state: KeyState, key: u16, pressed: bool) -> KeyState {
    apply_with(state, key, pressed, ModifierMode::Toggle)
}

/// Folds one key transition into `state`.
pub fn apply_with(mut state: KeyState, key: u16, pressed: bool, mode: ModifierMode) -> KeyState {
    match classify(key) {
        KeyClass::Modifier(slot) => {
            match mode {
                ModifierMode::Toggle => state.modifiers.toggle(slot),
                ModifierMode::Level => state.modifiers.set(slot, pressed),
            }
            state
        }
        KeyClass::NotModifier => {
            let usage = usage_code(key);
            if usage == HidKeyCode::Unknown.as_u8() {
                return state;
            }
            if pressed {
                press(&mut state, usage);
            } else {
                release(&mut state, usage);
            }
            state
        }
    }
}

fn press(state: &mut KeyState, usage: u8) {
    if state.holds(usage) {
        return;
    }
    if let Some(slot) = state.keys.iter_mut().find(|k| **k == EMPTY_SLOT) {
        *slot = usage;
    }
}

fn release(state: &mut KeyState, usage: u8) {
    if let Some(slot) = state.keys.iter_mut().find(|k| **k == usage) {
        *slot = EMPTY_SLOT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: u16 = 30;
    const KEY_B: u16 = 48;
    const KEY_LEFTCTRL: u16 = 29;
    const KEY_RIGHTMETA: u16 = 126;

    #[test]
    fn test_classify_distinguishes_modifiers() {
        assert_eq!(classify(KEY_LEFTCTRL), KeyClass::Modifier(ModifierSlot::LeftCtrl));
        assert_eq!(classify(KEY_RIGHTMETA), KeyClass::Modifier(ModifierSlot::RightGui));
        assert_eq!(classify(KEY_A), KeyClass::NotModifier);
    }

    #[test]
    fn test_usage_code_for_unmapped_key_is_zero() {
        assert_eq!(usage_code(KEY_A), 0x04);
        assert_eq!(usage_code(0x110), 0x00);
    }

    #[test]
    fn test_press_fills_first_empty_slot() {
        // Arrange
        let state = KeyState::from_parts(0, &[0x10, 0x00, 0x11]);

        // Act
        let next = apply(state, KEY_A, true);

        // Assert
        assert_eq!(next.keys, [0x10, 0x04, 0x11, 0, 0, 0]);
    }

    #[test]
    fn test_release_clears_matching_slot_only() {
        let state = KeyState::from_parts(0, &[0x04, 0x05]);

        let next = apply(state, KEY_A, false);

        assert_eq!(next.keys, [0x00, 0x05, 0, 0, 0, 0]);
    }

    #[test]
    fn test_toggle_mode_flips_on_press_and_on_release() {
        let pressed = apply(KeyState::new(), KEY_LEFTCTRL, true);
        assert_eq!(pressed.modifiers.bits(), 0b0000_0001);

        let released = apply(pressed, KEY_LEFTCTRL, false);
        assert_eq!(released.modifiers.bits(), 0);

        // A duplicated press inverts the bit again.
        let duplicated = apply(apply(KeyState::new(), KEY_LEFTCTRL, true), KEY_LEFTCTRL, true);
        assert_eq!(duplicated.modifiers.bits(), 0);
    }

    #[test]
    fn test_level_mode_is_idempotent_for_repeated_press() {
        let once = apply_with(KeyState::new(), KEY_RIGHTMETA, true, ModifierMode::Level);
        let twice = apply_with(once, KEY_RIGHTMETA, true, ModifierMode::Level);
        assert_eq!(twice.modifiers.bits(), 0b1000_0000);

        let released = apply_with(twice, KEY_RIGHTMETA, false, ModifierMode::Level);
        assert_eq!(released.modifiers.bits(), 0);
    }

    #[test]
    fn test_repeated_press_does_not_duplicate_usage() {
        let once = apply(KeyState::new(), KEY_B, true);
        let twice = apply(once, KEY_B, true);

        assert_eq!(twice, once);
    }

    #[test]
    fn test_unmapped_key_leaves_state_unchanged() {
        let state = KeyState::from_parts(0b0000_0100, &[0x04]);

        assert_eq!(apply(state, 0x110, true), state);
        assert_eq!(apply(state, 0x110, false), state);
    }
}
