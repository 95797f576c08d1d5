//! IPC protocol between the key injector and the emulation service.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, encode_frame, payload_len, ProtocolError};
pub use messages::*;
