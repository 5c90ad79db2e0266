//! Application layer use cases for the pointer switcher.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules) and the infrastructure (OS/storage).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "switch to the
//!   trackball's settings when the trackball moves").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no OS calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`resolve_device`** – Turns a raw-input report into a stable device path.
//! - **`apply_settings`** – Pushes pointer settings to the OS, field by field.
//! - **`switch_engine`** – The debounced state machine deciding when to switch.
//!   It runs on every qualifying mouse report.
//! - **`active_device`** – Publishes which device is currently in use.
//! - **`profile_store`** – The port through which profiles are read and saved.
//! - **`manage_profiles`** – Validation rules for adding, editing and removing
//!   profiles, plus device capture.
//! - **`dispatch`** – Feeds raw-input events through resolution into the engine.

pub mod active_device;
pub mod apply_settings;
pub mod dispatch;
pub mod manage_profiles;
pub mod profile_store;
pub mod resolve_device;
pub mod switch_engine;
