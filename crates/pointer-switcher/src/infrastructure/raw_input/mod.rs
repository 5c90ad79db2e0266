//! Raw-input event source.
//!
//! On Windows, this creates a hidden message-only window, registers it for
//! raw mouse input with `RIDEV_INPUTSINK` (so reports arrive even while another
//! application has focus) and `RIDEV_DEVNOTIFY` (so device removal is
//! reported), and pumps the Win32 message loop on the calling thread.
//!
//! # Why raw input instead of a mouse hook? (for beginners)
//!
//! A low-level mouse hook sees *where the cursor went*, merged across every
//! pointing device.  Raw input sees each report *before* the OS merges them,
//! tagged with the handle of the device that produced it.  That tag is the
//! only way to tell a trackball from a mouse.
//!
//! # Testability
//!
//! The [`MotionSource`] trait lets tests drive the switcher with a
//! [`mock::ScriptedMotionSource`] instead of real hardware.

use std::ops::ControlFlow;
use std::rc::Rc;

use pointer_core::{DeviceHandle, RawMotion};
use thiserror::Error;

use crate::application::resolve_device::DevicePathQuery;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// One event delivered by a [`MotionSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// A decoded raw-input report.
    Motion(RawMotion),
    /// The device was unplugged; its handle may be reused later.
    DeviceRemoved(DeviceHandle),
}

/// Error type for raw-input setup.
#[derive(Debug, Error)]
pub enum RawInputError {
    #[error("failed to create raw-input window: {0}")]
    WindowCreation(String),
    #[error("failed to register for raw mouse input: {0}")]
    Registration(String),
    #[error("raw input is only available on Windows")]
    UnsupportedPlatform,
}

/// Trait abstracting raw-input event production.
///
/// The production implementation pumps the Win32 message loop; tests use
/// [`mock::ScriptedMotionSource`].
pub trait MotionSource {
    /// Delivers events to `handler` on the calling thread until the handler
    /// returns [`ControlFlow::Break`] or the source is exhausted.
    fn run(
        &mut self,
        handler: &mut dyn FnMut(SourceEvent) -> ControlFlow<()>,
    ) -> Result<(), RawInputError>;
}

/// The platform event source together with its device-path lookup.
pub struct PlatformInput {
    pub source: Box<dyn MotionSource>,
    pub paths: Rc<dyn DevicePathQuery>,
}

/// Opens the raw-input source for this platform.
///
/// # Errors
///
/// [`RawInputError::UnsupportedPlatform`] on anything but Windows, otherwise
/// window creation or registration failures.
#[cfg(target_os = "windows")]
pub fn open_platform_input() -> Result<PlatformInput, RawInputError> {
    use crate::application::resolve_device::CachingDevicePathQuery;

    let source = windows::RawInputWindow::create()?;
    Ok(PlatformInput {
        source: Box::new(source),
        paths: Rc::new(CachingDevicePathQuery::new(windows::RawInputDevicePathQuery)),
    })
}

/// Opens the raw-input source for this platform.
///
/// # Errors
///
/// Always [`RawInputError::UnsupportedPlatform`] on this platform.
#[cfg(not(target_os = "windows"))]
pub fn open_platform_input() -> Result<PlatformInput, RawInputError> {
    Err(RawInputError::UnsupportedPlatform)
}
