//! Boot keyboard input report: the record and the transition codec.

pub mod codec;
pub mod state;

pub use codec::{apply, apply_with, classify, usage_code, KeyClass, ModifierMode};
pub use state::{KeyState, ModifierFlags, ReportError, KEY_SLOTS, REPORT_LEN};
