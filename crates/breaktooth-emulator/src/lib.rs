//! breaktooth-emulator library entry point.
//!
//! The `breaktooth` binary and the integration tests both build on this
//! library.
//!
//! # What does the emulator do?
//!
//! It makes the local Bluetooth adapter act as a keyboard toward one target:
//!
//! 1. Waits until the target answers L2CAP echo requests, the sign that it
//!    has entered its power-saving link state.
//! 2. Fires one throw-away raw L2CAP connect (`SOCK_RAW`, PSM 0) so the
//!    target's stack reuses the link key it cached for the impersonated
//!    device.
//! 3. Registers the HID profile, sets a keyboard Class of Device and
//!    connects the HID control and interrupt channels.
//! 4. Serves a local IPC endpoint; every key state received there is written
//!    to the interrupt channel as a 10-byte input report.

/// Application layer: use cases and the traits they need from the platform.
pub mod application;

/// Infrastructure layer: BlueZ, L2CAP sockets, `l2ping` and the IPC endpoint.
pub mod infrastructure;
