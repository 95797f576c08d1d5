//! Application layer of the injector.
//!
//! - **`capture_keys`** – keyboard discovery and the capture loop that folds
//!   transitions into a [`KeyState`](breaktooth_core::report::KeyState) and
//!   pushes every change through a [`KeySink`](capture_keys::KeySink).
//!
//! Nothing here touches `/dev/input` or sockets directly; the infrastructure
//! layer supplies the locator, the transition stream and the sink.

pub mod capture_keys;
