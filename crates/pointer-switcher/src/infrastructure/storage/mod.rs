//! Storage infrastructure: configuration file persistence.
//!
//! This module provides a thin adapter between the application and the
//! file system.  The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate
//!   directory (or the path given with `--config`).
//! - Writing profile changes back to disk through [`config::TomlProfileStore`].
//! - Providing sensible defaults when the file does not exist yet (first run).

pub mod config;
