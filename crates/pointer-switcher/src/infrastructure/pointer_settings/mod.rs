//! OS pointer-settings backends.
//!
//! On Windows the global pointer configuration is read and written through
//! `SystemParametersInfoW`, `GetSystemMetrics` and `GetDoubleClickTime`.
//! Elsewhere [`UnsupportedPointerBackend`] reports every call as unsupported,
//! which the applier turns into per-field fallbacks and warnings.

use std::rc::Rc;

use crate::application::apply_settings::{PointerBackend, PointerError};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Returns the pointer backend for this platform.
pub fn platform_backend() -> Rc<dyn PointerBackend> {
    #[cfg(target_os = "windows")]
    {
        Rc::new(windows::WindowsPointerBackend)
    }

    #[cfg(not(target_os = "windows"))]
    {
        Rc::new(UnsupportedPointerBackend)
    }
}

/// Backend for platforms without a global pointer configuration API.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPointerBackend;

impl PointerBackend for UnsupportedPointerBackend {
    fn speed(&self) -> Result<u32, PointerError> {
        Err(PointerError::Unsupported)
    }
    fn set_speed(&self, _speed: u32) -> Result<(), PointerError> {
        Err(PointerError::Unsupported)
    }
    fn enhance_pointer_precision(&self) -> Result<bool, PointerError> {
        Err(PointerError::Unsupported)
    }
    fn set_enhance_pointer_precision(&self, _enabled: bool) -> Result<(), PointerError> {
        Err(PointerError::Unsupported)
    }
    fn scroll_lines(&self) -> Result<u32, PointerError> {
        Err(PointerError::Unsupported)
    }
    fn set_scroll_lines(&self, _lines: u32) -> Result<(), PointerError> {
        Err(PointerError::Unsupported)
    }
    fn scroll_chars(&self) -> Result<u32, PointerError> {
        Err(PointerError::Unsupported)
    }
    fn set_scroll_chars(&self, _chars: u32) -> Result<(), PointerError> {
        Err(PointerError::Unsupported)
    }
    fn swap_buttons(&self) -> Result<bool, PointerError> {
        Err(PointerError::Unsupported)
    }
    fn set_swap_buttons(&self, _swapped: bool) -> Result<(), PointerError> {
        Err(PointerError::Unsupported)
    }
    fn double_click_time_ms(&self) -> Result<u32, PointerError> {
        Err(PointerError::Unsupported)
    }
    fn set_double_click_time_ms(&self, _ms: u32) -> Result<(), PointerError> {
        Err(PointerError::Unsupported)
    }
}
