//! Infrastructure layer of the emulator.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `breaktooth_core`, but is never imported by `application` outside tests.
//!
//! - **`bluetooth`** – BlueZ profile registration, L2CAP sockets and `l2ping`.
//! - **`ipc`** – the Unix socket endpoint that receives key states from
//!   `breaktooth-injector`.
//! - **`mock`** – recording stand-ins for the Bluetooth adapters.

pub mod bluetooth;
pub mod ipc;
pub mod mock;
