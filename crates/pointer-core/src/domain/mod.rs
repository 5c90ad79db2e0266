//! Domain entities for the multi-mouse pointer switcher.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, UI frameworks, or file formats.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the domain is the idea of a *device profile*: the pointer settings a
//! user wants while one specific physical mouse is in use, plus the ordered
//! registry that maps raw-input device paths to those profiles.

/// Device profiles, pointer settings, and value ranges.
pub mod profile;

/// Decoded raw-input motion reports.
pub mod motion;

/// Ordered profile collection with its device-path index.
pub mod registry;
