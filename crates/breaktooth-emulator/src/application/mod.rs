//! Application layer of the emulator.
//!
//! - **`sleep_monitor`** – polls the target with echo probes until it answers.
//! - **`hijack`** – the one-shot L2CAP connect that triggers link-key reuse.
//! - **`hid_service`** – profile registration, the two HID channels and report
//!   transmission.
//! - **`bootstrap`** – runs the three in order.
//!
//! Every Bluetooth operation goes through a trait (`EchoProbe`,
//! `ProbeSocketFactory`, `BluetoothPlatform`) implemented in the
//! infrastructure layer, so this layer runs against mocks in tests.

pub mod bootstrap;
pub mod hid_service;
pub mod hijack;
pub mod sleep_monitor;
