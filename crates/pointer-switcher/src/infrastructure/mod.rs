//! Infrastructure layer for the pointer switcher.
//!
//! Contains OS-facing adapters: the raw-input event source, the pointer
//! settings backend, file-system storage, and the presentation bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `pointer_core`.  The only thing `application` takes from here is the
//! [`raw_input::SourceEvent`] / [`raw_input::MotionSource`] pair consumed by
//! `application::dispatch`; test doubles in the `mock` sub-modules are used
//! by application tests.

pub mod pointer_settings;
pub mod raw_input;
pub mod storage;
pub mod ui_bridge;
