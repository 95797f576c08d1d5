//! breaktooth-injector library entry point.
//!
//! Shared by the binary and by the integration tests in `tests/`.

pub mod application;
pub mod infrastructure;
