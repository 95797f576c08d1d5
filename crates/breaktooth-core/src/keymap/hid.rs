//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! This is the key representation carried in every input report Breaktooth
//! sends to the target. Linux evdev codes are translated to HID at the capture
//! boundary (see [`super::linux_evdev`]).
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Usage IDs and modifier bits
//!
//! Ordinary keys travel in the six key slots of the boot keyboard report as
//! their Usage ID (letter A is 0x04, Enter is 0x28, and so on). The eight
//! modifier keys (0xE0–0xE7) never occupy a slot: each one owns a single bit
//! of the report's modifier byte, and the bit index is simply
//! `usage - 0xE0`.
//!
//! | Key          | HID Usage ID | Modifier bit |
//! |--------------|--------------|--------------|
//! | Letter A     | 0x04         | –            |
//! | Enter        | 0x28         | –            |
//! | Left Ctrl    | 0xE0         | 0            |
//! | Right GUI    | 0xE7         | 7            |
//!
//! # The `Unknown` sentinel
//!
//! [`HidKeyCode::Unknown`] (0x00, "no event") stands in for any key without a
//! standard mapping. Because 0x00 is also the empty-slot marker, pressing an
//! unknown key never changes a report.

/// USB HID Usage ID for keyboard keys (page 0x07).
///
/// The numeric value of each variant is its Usage ID on the keyboard/keypad page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HidKeyCode {
    /// Sentinel for keys with no HID mapping.
    Unknown = 0x00,

    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    // Function keys F1–F12 (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (HID 0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Keypad (HID 0x53–0x63)
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    // ISO / application keys
    NonUsBackslash = 0x64,
    ContextMenu = 0x65,
    Power = 0x66,
    NumpadEqual = 0x67,

    // Function keys F13–F24 (HID 0x68–0x73)
    F13 = 0x68,
    F14 = 0x69,
    F15 = 0x6A,
    F16 = 0x6B,
    F17 = 0x6C,
    F18 = 0x6D,
    F19 = 0x6E,
    F20 = 0x6F,
    F21 = 0x70,
    F22 = 0x71,
    F23 = 0x72,
    F24 = 0x73,

    // Volume (HID 0x7F–0x81)
    Mute = 0x7F,
    VolumeUp = 0x80,
    VolumeDown = 0x81,

    // International / language keys
    NumpadComma = 0x85,
    IntlRo = 0x87,
    KatakanaHiragana = 0x88,
    IntlYen = 0x89,
    Henkan = 0x8A,
    Muhenkan = 0x8B,
    Lang1 = 0x90,
    Lang2 = 0x91,

    // Modifier keys (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

/// One of the eight modifier bits of the boot keyboard report.
///
/// The discriminant is the bit index inside the modifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModifierSlot {
    LeftCtrl = 0,
    LeftShift = 1,
    LeftAlt = 2,
    LeftGui = 3,
    RightCtrl = 4,
    RightShift = 5,
    RightAlt = 6,
    RightGui = 7,
}

impl ModifierSlot {
    /// Returns the single-bit mask for this slot.
    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl HidKeyCode {
    /// Returns the raw Usage ID written into a report slot.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the modifier bit this key drives, or `None` for slot keys.
    pub fn modifier_slot(self) -> Option<ModifierSlot> {
        match self {
            HidKeyCode::ControlLeft => Some(ModifierSlot::LeftCtrl),
            HidKeyCode::ShiftLeft => Some(ModifierSlot::LeftShift),
            HidKeyCode::AltLeft => Some(ModifierSlot::LeftAlt),
            HidKeyCode::MetaLeft => Some(ModifierSlot::LeftGui),
            HidKeyCode::ControlRight => Some(ModifierSlot::RightCtrl),
            HidKeyCode::ShiftRight => Some(ModifierSlot::RightShift),
            HidKeyCode::AltRight => Some(ModifierSlot::RightAlt),
            HidKeyCode::MetaRight => Some(ModifierSlot::RightGui),
            _ => None,
        }
    }
}
