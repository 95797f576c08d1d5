//! Keyboard capture infrastructure.
//!
//! The evdev adapter finds the first input device that reports `KEY_A` and
//! turns its event stream into [`KeyTransition`]s. Auto-repeat events
//! (value 2) and every non-key event are dropped here, so the application
//! layer only ever sees real presses and releases.
//!
//! [`KeyTransition`]: crate::application::capture_keys::KeyTransition

pub mod evdev;
pub mod mock;

pub use self::evdev::{key_transitions, to_transition, EvdevLocator};
