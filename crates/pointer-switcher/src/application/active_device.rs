//! Active-device notifier.
//!
//! Publishes which device the switcher currently considers in use, so a tray
//! icon or console can show its name, colour and speed.  The engine calls
//! [`ActiveDeviceNotifier::notify`] only after the corresponding OS writes
//! were attempted, so listeners never see a device that is not yet applied.

use std::rc::Rc;

use pointer_core::{DevicePath, DeviceProfile, IconColor, PointerSettings};

/// Snapshot of the active device as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDeviceStatus {
    pub device_path: DevicePath,
    pub display_name: String,
    /// Speed in effect for this device.
    pub speed: u32,
    /// `false` when the profile opted out of automatic switching; the tray
    /// shows such a device as "not applied".
    pub is_applied: bool,
    pub icon_color: IconColor,
}

impl ActiveDeviceStatus {
    /// Builds the status for `profile` with `settings` in effect.
    pub fn new(profile: &DeviceProfile, settings: &PointerSettings) -> Self {
        Self {
            device_path: profile.device_path.clone(),
            display_name: profile.name.clone(),
            speed: settings.speed,
            is_applied: profile.auto_apply,
            icon_color: profile.icon_color,
        }
    }
}

/// Receives active-device changes.
pub trait ActiveDeviceListener {
    fn active_device_changed(&self, status: &ActiveDeviceStatus);
}

/// Fan-out of [`ActiveDeviceStatus`] updates to subscribed listeners.
///
/// Also keeps the latest status so pollers need not subscribe.
#[derive(Default)]
pub struct ActiveDeviceNotifier {
    listeners: Vec<Rc<dyn ActiveDeviceListener>>,
    current: Option<ActiveDeviceStatus>,
}

impl ActiveDeviceNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Rc<dyn ActiveDeviceListener>) {
        self.listeners.push(listener);
    }

    /// Records `status` as current and forwards it to every listener in
    /// subscription order.
    pub fn notify(&mut self, status: ActiveDeviceStatus) {
        for listener in &self.listeners {
            listener.active_device_changed(&status);
        }
        self.current = Some(status);
    }

    /// The most recently published status, if any.
    pub fn current(&self) -> Option<&ActiveDeviceStatus> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingListener {
        seen: RefCell<Vec<String>>,
    }

    impl ActiveDeviceListener for RecordingListener {
        fn active_device_changed(&self, status: &ActiveDeviceStatus) {
            self.seen.borrow_mut().push(status.display_name.clone());
        }
    }

    fn profile(name: &str, auto_apply: bool) -> DeviceProfile {
        let mut p = DeviceProfile::new(name, DevicePath::new(name).unwrap());
        p.auto_apply = auto_apply;
        p.icon_color = IconColor::TEAL;
        p
    }

    #[test]
    fn test_status_copies_profile_presentation_fields() {
        let p = profile("Trackball", true).with_speed(12);

        let status = ActiveDeviceStatus::new(&p, &p.settings);

        assert_eq!(status.display_name, "Trackball");
        assert_eq!(status.speed, 12);
        assert_eq!(status.icon_color, IconColor::TEAL);
        assert!(status.is_applied);
    }

    #[test]
    fn test_status_is_not_applied_for_manual_only_profile() {
        let p = profile("Manual", false);
        assert!(!ActiveDeviceStatus::new(&p, &p.settings).is_applied);
    }

    #[test]
    fn test_notify_reaches_every_listener_and_updates_current() {
        // Arrange
        let mut notifier = ActiveDeviceNotifier::new();
        let first = Rc::new(RecordingListener::default());
        let second = Rc::new(RecordingListener::default());
        notifier.subscribe(first.clone());
        notifier.subscribe(second.clone());
        let p = profile("Mouse", true);

        // Act
        notifier.notify(ActiveDeviceStatus::new(&p, &p.settings));

        // Assert
        assert_eq!(*first.seen.borrow(), vec!["Mouse".to_string()]);
        assert_eq!(*second.seen.borrow(), vec!["Mouse".to_string()]);
        assert_eq!(notifier.current().map(|s| s.display_name.as_str()), Some("Mouse"));
    }

    #[test]
    fn test_current_is_none_before_first_notification() {
        assert!(ActiveDeviceNotifier::new().current().is_none());
    }
}
