//! Infrastructure layer of the injector: evdev keyboard capture and the IPC
//! client toward the emulator.

pub mod input_capture;
pub mod ipc;
