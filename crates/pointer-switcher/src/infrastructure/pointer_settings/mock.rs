//! In-memory pointer backend for tests.
//!
//! Holds a [`PointerSettings`] block standing in for the OS configuration,
//! counts successful writes, and can be told to fail reads or writes of
//! individual settings.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use pointer_core::PointerSettings;

use crate::application::apply_settings::{PointerBackend, PointerError, PointerSetting};

/// A [`PointerBackend`] that records writes instead of touching the OS.
#[derive(Debug, Default)]
pub struct MockPointerBackend {
    current: RefCell<PointerSettings>,
    writes: Cell<usize>,
    failing_reads: RefCell<HashSet<PointerSetting>>,
    failing_writes: RefCell<HashSet<PointerSetting>>,
}

impl MockPointerBackend {
    /// Starts with [`PointerSettings::default`] as the "OS" state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PointerSettings {
        *self.current.borrow()
    }

    /// Overwrites the simulated OS state without counting a write.
    pub fn set_current(&self, settings: PointerSettings) {
        *self.current.borrow_mut() = settings;
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn fail_reads_of(&self, setting: PointerSetting) {
        self.failing_reads.borrow_mut().insert(setting);
    }

    pub fn fail_writes_to(&self, setting: PointerSetting) {
        self.failing_writes.borrow_mut().insert(setting);
    }

    fn read<T>(&self, setting: PointerSetting, get: impl FnOnce(&PointerSettings) -> T) -> Result<T, PointerError> {
        if self.failing_reads.borrow().contains(&setting) {
            return Err(PointerError::Read {
                setting,
                reason: "simulated read failure".into(),
            });
        }
        Ok(get(&*self.current.borrow()))
    }

    fn write(&self, setting: PointerSetting, set: impl FnOnce(&mut PointerSettings)) -> Result<(), PointerError> {
        if self.failing_writes.borrow().contains(&setting) {
            return Err(PointerError::Write {
                setting,
                reason: "simulated write failure".into(),
            });
        }
        set(&mut *self.current.borrow_mut());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl PointerBackend for MockPointerBackend {
    fn speed(&self) -> Result<u32, PointerError> {
        self.read(PointerSetting::Speed, |s| s.speed)
    }
    fn set_speed(&self, speed: u32) -> Result<(), PointerError> {
        self.write(PointerSetting::Speed, |s| s.speed = speed)
    }
    fn enhance_pointer_precision(&self) -> Result<bool, PointerError> {
        self.read(PointerSetting::EnhancePointerPrecision, |s| s.enhance_pointer_precision)
    }
    fn set_enhance_pointer_precision(&self, enabled: bool) -> Result<(), PointerError> {
        self.write(PointerSetting::EnhancePointerPrecision, |s| {
            s.enhance_pointer_precision = enabled
        })
    }
    fn scroll_lines(&self) -> Result<u32, PointerError> {
        self.read(PointerSetting::ScrollLines, |s| s.scroll_lines)
    }
    fn set_scroll_lines(&self, lines: u32) -> Result<(), PointerError> {
        self.write(PointerSetting::ScrollLines, |s| s.scroll_lines = lines)
    }
    fn scroll_chars(&self) -> Result<u32, PointerError> {
        self.read(PointerSetting::ScrollChars, |s| s.scroll_chars)
    }
    fn set_scroll_chars(&self, chars: u32) -> Result<(), PointerError> {
        self.write(PointerSetting::ScrollChars, |s| s.scroll_chars = chars)
    }
    fn swap_buttons(&self) -> Result<bool, PointerError> {
        self.read(PointerSetting::SwapButtons, |s| s.swap_buttons)
    }
    fn set_swap_buttons(&self, swapped: bool) -> Result<(), PointerError> {
        self.write(PointerSetting::SwapButtons, |s| s.swap_buttons = swapped)
    }
    fn double_click_time_ms(&self) -> Result<u32, PointerError> {
        self.read(PointerSetting::DoubleClickTime, |s| s.double_click_time_ms)
    }
    fn set_double_click_time_ms(&self, ms: u32) -> Result<(), PointerError> {
        self.write(PointerSetting::DoubleClickTime, |s| s.double_click_time_ms = ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_starts_at_defaults() {
        assert_eq!(MockPointerBackend::new().current(), PointerSettings::default());
    }

    #[test]
    fn test_mock_backend_counts_only_successful_writes() {
        // Arrange
        let backend = MockPointerBackend::new();
        backend.fail_writes_to(PointerSetting::SwapButtons);

        // Act
        backend.set_speed(3).unwrap();
        let failed = backend.set_swap_buttons(true);

        // Assert
        assert!(failed.is_err());
        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.current().speed, 3);
        assert!(!backend.current().swap_buttons);
    }

    #[test]
    fn test_mock_backend_simulates_read_failure() {
        let backend = MockPointerBackend::new();
        backend.fail_reads_of(PointerSetting::ScrollChars);
        assert!(matches!(
            backend.scroll_chars(),
            Err(PointerError::Read { setting: PointerSetting::ScrollChars, .. })
        ));
        assert!(backend.scroll_lines().is_ok());
    }
}
