//! Mock keyboard locator for unit testing.
//!
//! Lets tests exercise the discovery retry loop without `/dev/input`.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::application::capture_keys::KeyboardLocator;

/// Path reported for the keyboard once it appears.
pub const MOCK_KEYBOARD_PATH: &str = "/dev/input/event3";

/// A [`KeyboardLocator`] that finds nothing for a fixed number of attempts.
///
/// The "device" it hands out is its path.
#[derive(Debug)]
pub struct MockKeyboardLocator {
    misses: Option<u32>,
    attempts: AtomicU32,
}

impl MockKeyboardLocator {
    /// Finds the keyboard on attempt `misses + 1`.
    pub fn appearing_after(misses: u32) -> Self {
        Self {
            misses: Some(misses),
            attempts: AtomicU32::new(0),
        }
    }

    /// Never finds a keyboard.
    pub fn never() -> Self {
        Self {
            misses: None,
            attempts: AtomicU32::new(0),
        }
    }

    /// Number of `locate` calls so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl KeyboardLocator for MockKeyboardLocator {
    type Device = &'static str;

    fn locate(&self) -> Option<(String, &'static str)> {
        let previous = self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.misses {
            Some(misses) if previous >= misses => {
                Some((MOCK_KEYBOARD_PATH.to_string(), MOCK_KEYBOARD_PATH))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_counts_attempts_until_found() {
        // Arrange
        let locator = MockKeyboardLocator::appearing_after(1);

        // Act
        let first = locator.locate();
        let second = locator.locate();

        // Assert
        assert!(first.is_none());
        assert_eq!(second.map(|(_, dev)| dev), Some(MOCK_KEYBOARD_PATH));
        assert_eq!(locator.attempts(), 2);
    }

    #[test]
    fn test_never_locator_always_misses() {
        let locator = MockKeyboardLocator::never();

        for _ in 0..5 {
            assert!(locator.locate().is_none());
        }
        assert_eq!(locator.attempts(), 5);
    }
}
