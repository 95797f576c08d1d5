//! # breaktooth-core
//!
//! Shared library for Breaktooth containing the HID input report model, the
//! key translation table, the IPC wire protocol and the shared configuration.
//!
//! It is used by both the emulator (`breaktooth`) and the key injector
//! (`breaktooth-injector`) and has no dependencies on Bluetooth, input
//! devices or sockets.
//!
//! # Architecture overview
//!
//! Breaktooth emulates a Bluetooth keyboard toward a target host. Two
//! processes cooperate:
//!
//! - the **injector** reads key transitions from a local keyboard, folds them
//!   into a [`KeyState`] and sends the state to the emulator over IPC;
//! - the **emulator** holds the HID control and interrupt channels to the
//!   target and writes each received state as a 10-byte input report.
//!
//! This crate defines what both sides agree on:
//!
//! - **`keymap`** – evdev key codes → USB HID Usage IDs, and modifier slots.
//! - **`report`** – the [`KeyState`] record, its 10-byte encoding, and the
//!   transition codec ([`report::apply`]).
//! - **`protocol`** – framed binary IPC messages ([`IpcRequest`]).
//! - **`config`** – the TOML configuration file schema.
//! - **`privilege`** – the root check both binaries run first.

pub mod config;
pub mod keymap;
pub mod privilege;
pub mod protocol;
pub mod report;

pub use config::{BreaktoothConfig, ConfigError, ProbeFailurePolicy, SecurityLevel};
pub use keymap::hid::{HidKeyCode, ModifierSlot};
pub use protocol::codec::{decode_frame, encode_frame, ProtocolError};
pub use protocol::messages::{IpcRequest, SendKeysMessage};
pub use report::{KeyState, ModifierFlags, ModifierMode, ReportError};
