//! # pointer-core
//!
//! Shared domain library for the multi-mouse pointer switcher: device
//! profiles, the profile registry, and the platform-neutral shape of raw
//! mouse motion.
//!
//! It has zero dependencies on OS APIs or UI frameworks, so everything here
//! builds and tests on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! Windows keeps a single, global pointer configuration (speed, acceleration,
//! wheel granularity, button swap, double-click time) no matter how many mice
//! are plugged in.  The switcher watches raw input to learn *which* physical
//! mouse is moving and swaps the global configuration to that mouse's
//! profile.
//!
//! - **`domain::profile`** – [`DeviceProfile`], [`PointerSettings`], and the
//!   case-insensitive [`DevicePath`] that identifies a device.
//! - **`domain::registry`** – [`ProfileRegistry`], the ordered list of profiles
//!   with an O(1) path index for the motion hot path.
//! - **`domain::motion`** – [`RawMotion`], one decoded raw-input report.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `pointer_core::DeviceProfile` instead of the full module path.
pub use domain::motion::{DeviceHandle, RawDeviceKind, RawMotion};
pub use domain::profile::{
    clamp_or, AppliedSettings, DevicePath, DeviceProfile, IconColor, PointerSettings,
    ProfileError, DEFAULT_DOUBLE_CLICK_MS, DEFAULT_ENHANCE_POINTER_PRECISION, DEFAULT_SCROLL_CHARS,
    DEFAULT_SCROLL_LINES, DEFAULT_SPEED, DEFAULT_SWAP_BUTTONS, DOUBLE_CLICK_RANGE_MS, SCROLL_RANGE,
    SPEED_RANGE,
};
pub use domain::registry::{ProfileRegistry, RegistryError};
