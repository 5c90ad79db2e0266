//! Profile store port.
//!
//! The switching engine reads profiles on every qualifying motion event and
//! writes back exactly one kind of change (a manual speed edit).  The editing
//! rules in [`crate::application::manage_profiles`] replace the whole profile
//! set at once.  Both go through [`ProfileStore`], so the engine never knows
//! whether profiles live in memory or in a TOML file.

use std::cell::RefCell;
use std::error::Error as StdError;

use pointer_core::{DevicePath, DeviceProfile, ProfileRegistry};
use thiserror::Error;

/// Errors returned by profile store writes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be written.
    #[error("profile store backend failed: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

/// Read/write access to the configured device profiles.
///
/// Methods take `&self`: the application is single-threaded and
/// implementations use interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore {
    /// Returns the profile whose device path matches `path` (case-insensitive).
    fn find_by_device_path(&self, path: &DevicePath) -> Option<DeviceProfile>;

    /// Every profile, in configuration order.
    fn all(&self) -> Vec<DeviceProfile>;

    /// Upserts one profile and makes the change durable.
    fn persist(&self, profile: &DeviceProfile) -> Result<(), StoreError>;

    /// Replaces the whole profile set and makes the change durable.
    fn save_all(&self, profiles: Vec<DeviceProfile>) -> Result<(), StoreError>;
}

// ── InMemoryProfileStore ──────────────────────────────────────────────────────

/// A [`ProfileStore`] that keeps profiles in a [`ProfileRegistry`] and never
/// touches the disk.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    registry: RefCell<ProfileRegistry>,
}

impl InMemoryProfileStore {
    pub fn new(profiles: Vec<DeviceProfile>) -> Self {
        Self {
            registry: RefCell::new(ProfileRegistry::new(profiles)),
        }
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn find_by_device_path(&self, path: &DevicePath) -> Option<DeviceProfile> {
        self.registry.borrow().find_by_device_path(path).cloned()
    }

    fn all(&self) -> Vec<DeviceProfile> {
        self.registry.borrow().profiles().to_vec()
    }

    fn persist(&self, profile: &DeviceProfile) -> Result<(), StoreError> {
        self.registry.borrow_mut().upsert(profile.clone());
        Ok(())
    }

    fn save_all(&self, profiles: Vec<DeviceProfile>) -> Result<(), StoreError> {
        *self.registry.borrow_mut() = ProfileRegistry::new(profiles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DevicePath {
        DevicePath::new(s).unwrap()
    }

    #[test]
    fn test_in_memory_store_finds_profile_ignoring_case() {
        let store = InMemoryProfileStore::new(vec![DeviceProfile::new("Mouse", path("HID#ABC"))]);
        assert!(store.find_by_device_path(&path("hid#abc")).is_some());
        assert!(store.find_by_device_path(&path("hid#xyz")).is_none());
    }

    #[test]
    fn test_in_memory_store_persist_overwrites_existing_profile() {
        // Arrange
        let store = InMemoryProfileStore::new(vec![DeviceProfile::new("Mouse", path("a"))]);

        // Act
        store
            .persist(&DeviceProfile::new("Mouse", path("a")).with_speed(3))
            .unwrap();

        // Assert
        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].settings.speed, 3);
    }

    #[test]
    fn test_in_memory_store_save_all_replaces_every_profile() {
        let store = InMemoryProfileStore::new(vec![DeviceProfile::new("Old", path("old"))]);

        store
            .save_all(vec![DeviceProfile::new("New", path("new"))])
            .unwrap();

        assert!(store.find_by_device_path(&path("old")).is_none());
        assert_eq!(store.all()[0].name, "New");
    }
}
