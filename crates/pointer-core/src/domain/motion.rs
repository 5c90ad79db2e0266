//! Raw-input motion reports, decoupled from any OS structure layout.
//!
//! The event source decodes the platform's raw-input packet into a
//! [`RawMotion`]; everything downstream works on this plain value.

/// Opaque OS handle of the device that produced a report.
///
/// On Windows this is the `hDevice` field of `RAWINPUTHEADER`.  Handles are
/// only valid while the device stays attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub isize);

/// Device class reported in the raw-input header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDeviceKind {
    Mouse,
    Keyboard,
    /// Any other HID collection sharing the usage page.
    Hid,
}

/// One decoded raw-input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMotion {
    pub kind: RawDeviceKind,
    pub device: DeviceHandle,
    /// Relative X displacement since the previous report.
    pub last_x: i32,
    /// Relative Y displacement since the previous report.
    pub last_y: i32,
}

impl RawMotion {
    /// Convenience constructor for a mouse report.
    pub fn mouse(device: DeviceHandle, last_x: i32, last_y: i32) -> Self {
        Self {
            kind: RawDeviceKind::Mouse,
            device,
            last_x,
            last_y,
        }
    }

    /// Whether this report may establish which device is in use.
    ///
    /// Only mouse-class reports with actual displacement qualify: button and
    /// wheel reports carry `last_x == last_y == 0` and are ignored.
    pub fn establishes_identity(&self) -> bool {
        self.kind == RawDeviceKind::Mouse && (self.last_x != 0 || self.last_y != 0)
    }
}
