//! Key code translation tables.
//!
//! The report representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Linux evdev codes are translated to HID at the capture boundary.

pub mod hid;
pub mod linux_evdev;

pub use hid::{HidKeyCode, ModifierSlot};
pub use linux_evdev::evdev_to_hid;
