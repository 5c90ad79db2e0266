//! Presentation bridge: what a tray icon or console shows.
//!
//! The application layer publishes [`ActiveDeviceStatus`] values; this module
//! turns them into presentation DTOs and provides the two listeners the
//! binary uses: [`LoggingListener`] (structured log line per switch) and
//! [`TrayStatusCell`] (latest status kept for polling by a tray front end).
//!
//! # Data Transfer Objects (DTOs)
//!
//! Internal types carry things a front end cannot consume directly, such as
//! [`pointer_core::DevicePath`] with its case-folded shadow copy or the RGB
//! [`pointer_core::IconColor`].  DTOs are flat structs that:
//!
//! - Contain only plain fields (`String`, `u32`, `bool`).
//! - Derive `Serialize` so any front end (tray, CLI, a future settings window)
//!   can render them the same way.
//! - Are built with `From` conversions, so the mapping lives in one place.

use std::cell::RefCell;

use pointer_core::DeviceProfile;
use serde::Serialize;
use tracing::info;

use crate::application::active_device::{ActiveDeviceListener, ActiveDeviceStatus};

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Tray tooltip and icon state for the active device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrayStatus {
    pub device_name: String,
    pub device_path: String,
    pub speed: u32,
    pub applied: bool,
    /// `#RRGGBB`.
    pub icon_color: String,
    pub tooltip: String,
}

impl From<&ActiveDeviceStatus> for TrayStatus {
    fn from(s: &ActiveDeviceStatus) -> Self {
        let tooltip = if s.is_applied {
            format!("{} (speed {})", s.display_name, s.speed)
        } else {
            format!("{} (not applied)", s.display_name)
        };
        Self {
            device_name: s.display_name.clone(),
            device_path: s.device_path.to_string(),
            speed: s.speed,
            applied: s.is_applied,
            icon_color: s.icon_color.to_hex(),
            tooltip,
        }
    }
}

/// One row of the `list` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRow {
    pub name: String,
    pub device_path: String,
    pub speed: u32,
    pub enabled: bool,
    pub auto_apply: bool,
    pub apply_on_startup: bool,
    pub icon_color: String,
}

impl From<&DeviceProfile> for ProfileRow {
    fn from(p: &DeviceProfile) -> Self {
        Self {
            name: p.name.clone(),
            device_path: p.device_path.to_string(),
            speed: p.settings.speed,
            enabled: p.enabled,
            auto_apply: p.auto_apply,
            apply_on_startup: p.apply_on_startup,
            icon_color: p.icon_color.to_hex(),
        }
    }
}

impl ProfileRow {
    /// Single-line human-readable rendering.
    pub fn to_line(&self) -> String {
        let mut flags = Vec::new();
        if !self.enabled {
            flags.push("disabled");
        }
        if !self.auto_apply {
            flags.push("manual");
        }
        if self.apply_on_startup {
            flags.push("startup");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        format!(
            "{} {:<20} speed {:>2}{}  {}",
            self.icon_color, self.name, self.speed, flags, self.device_path
        )
    }
}

// ── Listeners ─────────────────────────────────────────────────────────────────

/// Logs every active-device change at `info`.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl ActiveDeviceListener for LoggingListener {
    fn active_device_changed(&self, status: &ActiveDeviceStatus) {
        info!(
            device = %status.display_name,
            speed = status.speed,
            applied = status.is_applied,
            "active device"
        );
    }
}

/// Keeps the latest [`TrayStatus`] for a polling front end.
#[derive(Debug, Default)]
pub struct TrayStatusCell {
    latest: RefCell<Option<TrayStatus>>,
}

impl TrayStatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<TrayStatus> {
        self.latest.borrow().clone()
    }
}

impl ActiveDeviceListener for TrayStatusCell {
    fn active_device_changed(&self, status: &ActiveDeviceStatus) {
        *self.latest.borrow_mut() = Some(TrayStatus::from(status));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pointer_core::{DevicePath, IconColor};

    fn profile() -> DeviceProfile {
        let mut p = DeviceProfile::new("Trackball", DevicePath::new(r"\\?\HID#T").unwrap())
            .with_speed(4);
        p.icon_color = IconColor::FOREST_GREEN;
        p
    }

    #[test]
    fn test_tray_status_from_applied_device() {
        let p = profile();
        let status = ActiveDeviceStatus::new(&p, &p.settings);

        let tray = TrayStatus::from(&status);

        assert_eq!(tray.tooltip, "Trackball (speed 4)");
        assert_eq!(tray.icon_color, "#228B22");
        assert!(tray.applied);
    }

    #[test]
    fn test_tray_status_marks_manual_device_not_applied() {
        let mut p = profile();
        p.auto_apply = false;

        let tray = TrayStatus::from(&ActiveDeviceStatus::new(&p, &p.settings));

        assert_eq!(tray.tooltip, "Trackball (not applied)");
        assert!(!tray.applied);
    }

    #[test]
    fn test_tray_status_cell_keeps_latest() {
        // Arrange
        let cell = TrayStatusCell::new();
        let p = profile();

        // Act
        cell.active_device_changed(&ActiveDeviceStatus::new(&p, &p.settings));

        // Assert
        assert_eq!(cell.latest().map(|t| t.speed), Some(4));
    }

    #[test]
    fn test_profile_row_line_lists_flags() {
        let mut p = profile();
        p.apply_on_startup = true;
        p.auto_apply = false;

        let line = ProfileRow::from(&p).to_line();

        assert!(line.contains("[manual, startup]"), "{line}");
        assert!(line.starts_with("#228B22 Trackball"));
        assert!(line.ends_with(r"\\?\HID#T"));
    }
}
