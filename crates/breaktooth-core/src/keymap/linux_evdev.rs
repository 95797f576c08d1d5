//! Linux evdev key code to HID Usage ID translation table.
//!
//! evdev codes are defined in `linux/input-event-codes.h` and arrive as the
//! `code` field of every `EV_KEY` event read from `/dev/input/event*`. They
//! identify physical key positions, just like HID Usage IDs, so the table is a
//! one-to-one position mapping with no layout or character handling.
//!
//! Reference: https://github.com/torvalds/linux/blob/master/include/uapi/linux/input-event-codes.h

use super::hid::HidKeyCode;

/// Translates an evdev `KEY_*` code to a [`HidKeyCode`].
///
/// Returns [`HidKeyCode::Unknown`] for codes with no keyboard-page equivalent
/// (mouse buttons, media keys outside the volume trio, vendor keys).
pub fn evdev_to_hid(code: u16) -> HidKeyCode {
    match code {
        1 => HidKeyCode::Escape,   // KEY_ESC
        2 => HidKeyCode::Digit1,   // KEY_1
        3 => HidKeyCode::Digit2,   // KEY_2
        4 => HidKeyCode::Digit3,   // KEY_3
        5 => HidKeyCode::Digit4,   // KEY_4
        6 => HidKeyCode::Digit5,   // KEY_5
        7 => HidKeyCode::Digit6,   // KEY_6
        8 => HidKeyCode::Digit7,   // KEY_7
        9 => HidKeyCode::Digit8,   // KEY_8
        10 => HidKeyCode::Digit9,  // KEY_9
        11 => HidKeyCode::Digit0,  // KEY_0
        12 => HidKeyCode::Minus,   // KEY_MINUS
        13 => HidKeyCode::Equal,   // KEY_EQUAL
        14 => HidKeyCode::Backspace,
        15 => HidKeyCode::Tab,
        16 => HidKeyCode::KeyQ,
        17 => HidKeyCode::KeyW,
        18 => HidKeyCode::KeyE,
        19 => HidKeyCode::KeyR,
        20 => HidKeyCode::KeyT,
        21 => HidKeyCode::KeyY,
        22 => HidKeyCode::KeyU,
        23 => HidKeyCode::KeyI,
        24 => HidKeyCode::KeyO,
        25 => HidKeyCode::KeyP,
        26 => HidKeyCode::BracketLeft,  // KEY_LEFTBRACE
        27 => HidKeyCode::BracketRight, // KEY_RIGHTBRACE
        28 => HidKeyCode::Enter,
        29 => HidKeyCode::ControlLeft,
        30 => HidKeyCode::KeyA,
        31 => HidKeyCode::KeyS,
        32 => HidKeyCode::KeyD,
        33 => HidKeyCode::KeyF,
        34 => HidKeyCode::KeyG,
        35 => HidKeyCode::KeyH,
        36 => HidKeyCode::KeyJ,
        37 => HidKeyCode::KeyK,
        38 => HidKeyCode::KeyL,
        39 => HidKeyCode::Semicolon,
        40 => HidKeyCode::Quote,     // KEY_APOSTROPHE
        41 => HidKeyCode::Backquote, // KEY_GRAVE
        42 => HidKeyCode::ShiftLeft,
        43 => HidKeyCode::Backslash,
        44 => HidKeyCode::KeyZ,
        45 => HidKeyCode::KeyX,
        46 => HidKeyCode::KeyC,
        47 => HidKeyCode::KeyV,
        48 => HidKeyCode::KeyB,
        49 => HidKeyCode::KeyN,
        50 => HidKeyCode::KeyM,
        51 => HidKeyCode::Comma,
        52 => HidKeyCode::Period, // KEY_DOT
        53 => HidKeyCode::Slash,
        54 => HidKeyCode::ShiftRight,
        55 => HidKeyCode::NumpadMultiply, // KEY_KPASTERISK
        56 => HidKeyCode::AltLeft,
        57 => HidKeyCode::Space,
        58 => HidKeyCode::CapsLock,
        59 => HidKeyCode::F1,
        60 => HidKeyCode::F2,
        61 => HidKeyCode::F3,
        62 => HidKeyCode::F4,
        63 => HidKeyCode::F5,
        64 => HidKeyCode::F6,
        65 => HidKeyCode::F7,
        66 => HidKeyCode::F8,
        67 => HidKeyCode::F9,
        68 => HidKeyCode::F10,
        69 => HidKeyCode::NumLock,
        70 => HidKeyCode::ScrollLock,
        71 => HidKeyCode::Numpad7,
        72 => HidKeyCode::Numpad8,
        73 => HidKeyCode::Numpad9,
        74 => HidKeyCode::NumpadSubtract,
        75 => HidKeyCode::Numpad4,
        76 => HidKeyCode::Numpad5,
        77 => HidKeyCode::Numpad6,
        78 => HidKeyCode::NumpadAdd,
        79 => HidKeyCode::Numpad1,
        80 => HidKeyCode::Numpad2,
        81 => HidKeyCode::Numpad3,
        82 => HidKeyCode::Numpad0,
        83 => HidKeyCode::NumpadDecimal,
        86 => HidKeyCode::NonUsBackslash, // KEY_102ND
        87 => HidKeyCode::F11,
        88 => HidKeyCode::F12,
        89 => HidKeyCode::IntlRo,
        92 => HidKeyCode::Henkan,
        93 => HidKeyCode::KatakanaHiragana,
        94 => HidKeyCode::Muhenkan,
        96 => HidKeyCode::NumpadEnter,
        97 => HidKeyCode::ControlRight,
        98 => HidKeyCode::NumpadDivide,
        99 => HidKeyCode::PrintScreen, // KEY_SYSRQ
        100 => HidKeyCode::AltRight,
        102 => HidKeyCode::Home,
        103 => HidKeyCode::ArrowUp,
        104 => HidKeyCode::PageUp,
        105 => HidKeyCode::ArrowLeft,
        106 => HidKeyCode::ArrowRight,
        107 => HidKeyCode::End,
        108 => HidKeyCode::ArrowDown,
        109 => HidKeyCode::PageDown,
        110 => HidKeyCode::Insert,
        111 => HidKeyCode::Delete,
        113 => HidKeyCode::Mute,
        114 => HidKeyCode::VolumeDown,
        115 => HidKeyCode::VolumeUp,
        116 => HidKeyCode::Power,
        117 => HidKeyCode::NumpadEqual,
        119 => HidKeyCode::Pause,
        121 => HidKeyCode::NumpadComma,
        122 => HidKeyCode::Lang1, // KEY_HANGEUL
        123 => HidKeyCode::Lang2, // KEY_HANJA
        124 => HidKeyCode::IntlYen,
        125 => HidKeyCode::MetaLeft,
        126 => HidKeyCode::MetaRight,
        127 => HidKeyCode::ContextMenu, // KEY_COMPOSE
        183 => HidKeyCode::F13,
        184 => HidKeyCode::F14,
        185 => HidKeyCode::F15,
        186 => HidKeyCode::F16,
        187 => HidKeyCode::F17,
        188 => HidKeyCode::F18,
        189 => HidKeyCode::F19,
        190 => HidKeyCode::F20,
        191 => HidKeyCode::F21,
        192 => HidKeyCode::F22,
        193 => HidKeyCode::F23,
        194 => HidKeyCode::F24,
        _ => HidKeyCode::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_row_letters_map_to_hid_letters() {
        // KEY_A..KEY_L are contiguous in evdev (30..=38) but not alphabetical.
        let expected = [
            HidKeyCode::KeyA,
            HidKeyCode::KeyS,
            HidKeyCode::KeyD,
            HidKeyCode::KeyF,
            HidKeyCode::KeyG,
            HidKeyCode::KeyH,
            HidKeyCode::KeyJ,
            HidKeyCode::KeyK,
            HidKeyCode::KeyL,
        ];
        for (offset, hid) in expected.iter().enumerate() {
            assert_eq!(evdev_to_hid(30 + offset as u16), *hid);
        }
    }

    #[test]
    fn test_digit_row_maps_in_order() {
        for code in 2u16..=10 {
            let hid = evdev_to_hid(code);
            assert_eq!(hid.as_u8(), 0x1E + (code as u8 - 2), "KEY code {code}");
        }
        assert_eq!(evdev_to_hid(11), HidKeyCode::Digit0);
    }

    #[test]
    fn test_all_eight_modifiers_are_mapped() {
        // KEY_LEFTCTRL, KEY_LEFTSHIFT, KEY_LEFTALT, KEY_LEFTMETA,
        // KEY_RIGHTCTRL, KEY_RIGHTSHIFT, KEY_RIGHTALT, KEY_RIGHTMETA
        let codes = [29u16, 42, 56, 125, 97, 54, 100, 126];
        for code in codes {
            assert!(evdev_to_hid(code).modifier_slot().is_some(), "evdev {code} should be a modifier");
        }
    }

    #[test]
    fn test_function_keys_are_contiguous_above_f12() {
        for code in 183u16..=194 {
            assert_eq!(evdev_to_hid(code).as_u8(), 0x68 + (code - 183) as u8);
        }
    }

    #[test]
    fn test_non_keyboard_codes_are_unknown() {
        // KEY_RESERVED, BTN_LEFT, BTN_RIGHT, KEY_MAX
        for code in [0u16, 0x110, 0x111, 0x2FF] {
            assert_eq!(evdev_to_hid(code), HidKeyCode::Unknown);
        }
    }
}
