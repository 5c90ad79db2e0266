//! Settings applier: pushes a [`PointerSettings`] block to the OS.
//!
//! The OS exposes each pointer setting through its own call, and any one of
//! them can fail independently (group policy, a locked-down session, a driver
//! that rejects the value).  The applier therefore treats every field as a
//! separate best-effort write: a failure is recorded in the [`ApplyReport`]
//! and logged, and the remaining fields are still written.
//!
//! With `force == false` the applier first reads the live value and skips the
//! write when nothing would change.  Writing an identical value still makes
//! the OS broadcast a settings-change message to every top-level window,
//! which is visible as a brief flicker in some applications.

use std::fmt;
use std::rc::Rc;

use pointer_core::{
    PointerSettings, DEFAULT_DOUBLE_CLICK_MS, DEFAULT_ENHANCE_POINTER_PRECISION,
    DEFAULT_SCROLL_CHARS, DEFAULT_SCROLL_LINES, DEFAULT_SPEED, DEFAULT_SWAP_BUTTONS,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Identifies one OS pointer setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerSetting {
    Speed,
    EnhancePointerPrecision,
    ScrollLines,
    ScrollChars,
    SwapButtons,
    DoubleClickTime,
}

impl fmt::Display for PointerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Speed => "pointer speed",
            Self::EnhancePointerPrecision => "enhance pointer precision",
            Self::ScrollLines => "wheel scroll lines",
            Self::ScrollChars => "wheel scroll chars",
            Self::SwapButtons => "swap mouse buttons",
            Self::DoubleClickTime => "double-click time",
        };
        f.write_str(name)
    }
}

/// Errors reported by a [`PointerBackend`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PointerError {
    #[error("reading {setting} failed: {reason}")]
    Read {
        setting: PointerSetting,
        reason: String,
    },
    #[error("writing {setting} failed: {reason}")]
    Write {
        setting: PointerSetting,
        reason: String,
    },
    #[error("pointer settings are not available on this platform")]
    Unsupported,
}

/// Port: per-setting access to the OS global pointer configuration.
pub trait PointerBackend {
    fn speed(&self) -> Result<u32, PointerError>;
    fn set_speed(&self, speed: u32) -> Result<(), PointerError>;

    fn enhance_pointer_precision(&self) -> Result<bool, PointerError>;
    fn set_enhance_pointer_precision(&self, enabled: bool) -> Result<(), PointerError>;

    fn scroll_lines(&self) -> Result<u32, PointerError>;
    fn set_scroll_lines(&self, lines: u32) -> Result<(), PointerError>;

    fn scroll_chars(&self) -> Result<u32, PointerError>;
    fn set_scroll_chars(&self, chars: u32) -> Result<(), PointerError>;

    fn swap_buttons(&self) -> Result<bool, PointerError>;
    fn set_swap_buttons(&self, swapped: bool) -> Result<(), PointerError>;

    fn double_click_time_ms(&self) -> Result<u32, PointerError>;
    fn set_double_click_time_ms(&self, ms: u32) -> Result<(), PointerError>;
}

/// Outcome of one [`SettingsApplier::apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Settings that were written to the OS.
    pub written: Vec<PointerSetting>,
    /// Settings skipped because the OS already held the desired value.
    pub unchanged: Vec<PointerSetting>,
    /// Per-setting failures; the other settings were still attempted.
    pub failures: Vec<PointerError>,
}

impl ApplyReport {
    /// `true` when no write failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies pointer settings through a [`PointerBackend`].
pub struct SettingsApplier {
    backend: Rc<dyn PointerBackend>,
    fallback: PointerSettings,
}

impl SettingsApplier {
    /// Creates an applier that clamps out-of-range values to the built-in
    /// defaults.
    pub fn new(backend: Rc<dyn PointerBackend>) -> Self {
        Self {
            backend,
            fallback: PointerSettings::default(),
        }
    }

    /// Uses `fallback` for out-of-range values instead of the built-in
    /// defaults.  Callers usually pass [`Self::read_current_defaults`].
    pub fn with_fallback(mut self, fallback: PointerSettings) -> Self {
        self.fallback = fallback.clamped(&PointerSettings::default());
        self
    }

    pub fn fallback(&self) -> &PointerSettings {
        &self.fallback
    }

    /// Returns `settings` with every out-of-range field replaced by the
    /// applier's fallback.
    pub fn clamp(&self, settings: &PointerSettings) -> PointerSettings {
        settings.clamped(&self.fallback)
    }

    /// Writes `settings` to the OS.
    ///
    /// The speed is only written when `apply_speed` is set.  With `force`
    /// every write is issued; otherwise writes matching the live OS value are
    /// skipped.  Never fails: problems are collected in the returned report.
    pub fn apply(&self, settings: &PointerSettings, apply_speed: bool, force: bool) -> ApplyReport {
        let s = self.clamp(settings);
        let b = &*self.backend;
        let mut report = ApplyReport::default();

        if apply_speed {
            write_setting(&mut report, PointerSetting::Speed, s.speed, force, || b.speed(), |v| b.set_speed(v));
        }
        write_setting(
            &mut report,
            PointerSetting::EnhancePointerPrecision,
            s.enhance_pointer_precision,
            force,
            || b.enhance_pointer_precision(),
            |v| b.set_enhance_pointer_precision(v),
        );
        write_setting(
            &mut report,
            PointerSetting::ScrollLines,
            s.scroll_lines,
            force,
            || b.scroll_lines(),
            |v| b.set_scroll_lines(v),
        );
        write_setting(
            &mut report,
            PointerSetting::ScrollChars,
            s.scroll_chars,
            force,
            || b.scroll_chars(),
            |v| b.set_scroll_chars(v),
        );
        write_setting(
            &mut report,
            PointerSetting::SwapButtons,
            s.swap_buttons,
            force,
            || b.swap_buttons(),
            |v| b.set_swap_buttons(v),
        );
        write_setting(
            &mut report,
            PointerSetting::DoubleClickTime,
            s.double_click_time_ms,
            force,
            || b.double_click_time_ms(),
            |v| b.set_double_click_time_ms(v),
        );

        report
    }

    /// Reads the live OS pointer configuration.
    ///
    /// Any field that cannot be read, or reads back out of range, takes its
    /// documented fallback (speed 10, precision on, 3 lines, 3 chars, no swap,
    /// 500 ms).
    pub fn read_current_defaults(&self) -> PointerSettings {
        let b = &*self.backend;
        let live = PointerSettings {
            speed: read_or(PointerSetting::Speed, b.speed(), DEFAULT_SPEED),
            enhance_pointer_precision: read_or(
                PointerSetting::EnhancePointerPrecision,
                b.enhance_pointer_precision(),
                DEFAULT_ENHANCE_POINTER_PRECISION,
            ),
            scroll_lines: read_or(PointerSetting::ScrollLines, b.scroll_lines(), DEFAULT_SCROLL_LINES),
            scroll_chars: read_or(PointerSetting::ScrollChars, b.scroll_chars(), DEFAULT_SCROLL_CHARS),
            swap_buttons: read_or(PointerSetting::SwapButtons, b.swap_buttons(), DEFAULT_SWAP_BUTTONS),
            double_click_time_ms: read_or(
                PointerSetting::DoubleClickTime,
                b.double_click_time_ms(),
                DEFAULT_DOUBLE_CLICK_MS,
            ),
        };
        live.clamped(&PointerSettings::default())
    }
}

fn write_setting<T: PartialEq + Copy + fmt::Debug>(
    report: &mut ApplyReport,
    setting: PointerSetting,
    desired: T,
    force: bool,
    read: impl FnOnce() -> Result<T, PointerError>,
    write: impl FnOnce(T) -> Result<(), PointerError>,
) {
    if !force {
        match read() {
            Ok(current) if current == desired => {
                report.unchanged.push(setting);
                return;
            }
            Ok(_) => {}
            Err(e) => debug!(%setting, error = %e, "could not read current value; writing anyway"),
        }
    }
    match write(desired) {
        Ok(()) => report.written.push(setting),
        Err(e) => {
            warn!(%setting, value = ?desired, error = %e, "pointer setting write failed");
            report.failures.push(e);
        }
    }
}

fn read_or<T: fmt::Debug>(setting: PointerSetting, value: Result<T, PointerError>, fallback: T) -> T {
    value.unwrap_or_else(|e| {
        debug!(%setting, error = %e, fallback = ?fallback, "using fallback for unreadable setting");
        fallback
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::pointer_settings::mock::MockPointerBackend;

    fn applier() -> (SettingsApplier, Rc<MockPointerBackend>) {
        let backend = Rc::new(MockPointerBackend::new());
        (SettingsApplier::new(backend.clone()), backend)
    }

    fn custom() -> PointerSettings {
        PointerSettings {
            speed: 4,
            enhance_pointer_precision: false,
            scroll_lines: 7,
            scroll_chars: 2,
            swap_buttons: true,
            double_click_time_ms: 350,
        }
    }

    #[test]
    fn test_apply_writes_every_field() {
        // Arrange
        let (applier, backend) = applier();

        // Act
        let report = applier.apply(&custom(), true, false);

        // Assert
        assert!(report.is_clean());
        assert_eq!(report.written.len(), 6);
        assert_eq!(backend.current(), custom());
    }

    #[test]
    fn test_apply_without_speed_leaves_speed_untouched() {
        let (applier, backend) = applier();

        let report = applier.apply(&custom(), false, true);

        assert!(!report.written.contains(&PointerSetting::Speed));
        assert_eq!(backend.current().speed, 10);
        assert!(backend.current().swap_buttons);
    }

    #[test]
    fn test_apply_skips_unchanged_values_when_not_forced() {
        // Arrange
        let (applier, backend) = applier();
        let mut desired = PointerSettings::default();
        desired.speed = 15;

        // Act
        let report = applier.apply(&desired, true, false);

        // Assert
        assert_eq!(report.written, vec![PointerSetting::Speed]);
        assert_eq!(report.unchanged.len(), 5);
        assert_eq!(backend.write_count(), 1);
    }

    #[test]
    fn test_apply_forced_writes_even_identical_values() {
        let (applier, backend) = applier();

        let report = applier.apply(&PointerSettings::default(), true, true);

        assert_eq!(report.written.len(), 6);
        assert!(report.unchanged.is_empty());
        assert_eq!(backend.write_count(), 6);
    }

    #[test]
    fn test_apply_continues_after_a_failed_write() {
        // Arrange
        let (applier, backend) = applier();
        backend.fail_writes_to(PointerSetting::ScrollLines);

        // Act
        let report = applier.apply(&custom(), true, false);

        // Assert
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            PointerError::Write { setting: PointerSetting::ScrollLines, .. }
        ));
        let live = backend.current();
        assert_eq!(live.speed, 4);
        assert_eq!(live.double_click_time_ms, 350);
        assert_eq!(live.scroll_lines, 3, "failed field keeps its previous value");
    }

    #[test]
    fn test_apply_writes_when_read_fails() {
        let (applier, backend) = applier();
        backend.fail_reads_of(PointerSetting::Speed);

        let report = applier.apply(&PointerSettings::default(), true, false);

        assert_eq!(report.written, vec![PointerSetting::Speed]);
    }

    #[test]
    fn test_apply_clamps_out_of_range_values_to_fallback() {
        // Arrange
        let (applier, backend) = applier();
        let fallback = PointerSettings {
            speed: 6,
            ..PointerSettings::default()
        };
        let applier = applier.with_fallback(fallback);
        let wild = PointerSettings {
            speed: 99,
            double_click_time_ms: 5,
            ..custom()
        };

        // Act
        applier.apply(&wild, true, true);

        // Assert
        assert_eq!(backend.current().speed, 6);
        assert_eq!(backend.current().double_click_time_ms, 500);
    }

    #[test]
    fn test_apply_passes_boundary_values_through() {
        let (applier, backend) = applier();
        let edge = PointerSettings {
            speed: 20,
            scroll_lines: 0,
            scroll_chars: 100,
            double_click_time_ms: 900,
            ..PointerSettings::default()
        };

        applier.apply(&edge, true, true);

        assert_eq!(backend.current(), edge);
    }

    #[test]
    fn test_read_current_defaults_reflects_live_values() {
        let (applier, backend) = applier();
        backend.set_current(custom());

        assert_eq!(applier.read_current_defaults(), custom());
    }

    #[test]
    fn test_read_current_defaults_substitutes_fallback_per_field() {
        // Arrange
        let (applier, backend) = applier();
        backend.set_current(custom());
        backend.fail_reads_of(PointerSetting::Speed);
        backend.fail_reads_of(PointerSetting::DoubleClickTime);

        // Act
        let read = applier.read_current_defaults();

        // Assert
        assert_eq!(read.speed, 10);
        assert_eq!(read.double_click_time_ms, 500);
        assert_eq!(read.scroll_lines, 7);
        assert!(read.swap_buttons);
    }

    #[test]
    fn test_forced_apply_of_current_snapshot_leaves_os_unchanged() {
        // Arrange
        let (applier, backend) = applier();
        backend.set_current(custom());

        // Act
        let snapshot = applier.read_current_defaults();
        let report = applier.apply(&snapshot, true, true);

        // Assert
        assert!(report.is_clean());
        assert_eq!(backend.current(), custom());
    }
}
