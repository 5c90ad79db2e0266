//! ProfileManager: validates and applies profile edits.
//!
//! The switching engine never creates or deletes profiles.  This use case is
//! the single place where the profile set changes shape, and it enforces the
//! rules every saved set must satisfy:
//!
//! - a profile has a non-empty (trimmed) name and device path,
//! - names are unique ignoring ASCII case,
//! - device paths are unique,
//! - at most one profile carries `apply_on_startup`.
//!
//! It also holds the small state machines used while *adding* a device:
//! [`CaptureSession`] (wait for the first device that moves) and
//! [`DeviceDiscovery`] (report each device once).

use std::collections::HashSet;
use std::rc::Rc;

use pointer_core::{
    DevicePath, DeviceProfile, PointerSettings, ProfileError, ProfileRegistry, RegistryError,
};
use thiserror::Error;
use tracing::info;

use super::profile_store::{ProfileStore, StoreError};

/// Errors returned when a profile edit is rejected or cannot be saved.
#[derive(Debug, Error)]
pub enum ManageProfilesError {
    #[error("invalid profile: {0}")]
    Invalid(#[from] ProfileError),
    #[error(transparent)]
    Conflict(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies profile edits to a [`ProfileStore`].
pub struct ProfileManager {
    store: Rc<dyn ProfileStore>,
}

impl ProfileManager {
    pub fn new(store: Rc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Builds (but does not save) a new profile.
    ///
    /// The profile auto-applies, is not a startup profile, uses `settings`
    /// (normally the live OS values) and takes the first palette colour no
    /// other profile uses.
    ///
    /// # Errors
    ///
    /// [`ProfileError::EmptyName`] or [`ProfileError::EmptyDevicePath`].
    pub fn draft(
        &self,
        name: &str,
        device_path: &str,
        settings: PointerSettings,
    ) -> Result<DeviceProfile, ManageProfilesError> {
        let device_path = DevicePath::new(device_path)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName.into());
        }
        let registry = self.registry();
        let mut profile = DeviceProfile::new(name, device_path).with_settings(settings);
        profile.icon_color = registry.next_icon_color();
        Ok(profile)
    }

    /// Validates and saves a new profile.
    pub fn add(&self, profile: DeviceProfile) -> Result<(), ManageProfilesError> {
        profile.validate()?;
        let mut registry = self.registry();
        let key = profile.device_path.clone();
        let startup = profile.apply_on_startup;
        registry.insert(profile)?;
        self.commit(registry, &key, startup)?;
        info!(device = %key, "profile added");
        Ok(())
    }

    /// Replaces the profile currently stored under `existing`.
    pub fn edit(
        &self,
        existing: &DevicePath,
        profile: DeviceProfile,
    ) -> Result<(), ManageProfilesError> {
        profile.validate()?;
        let mut registry = self.registry();
        let key = profile.device_path.clone();
        let startup = profile.apply_on_startup;
        registry.replace(existing, profile)?;
        self.commit(registry, &key, startup)?;
        info!(device = %key, "profile updated");
        Ok(())
    }

    /// Removes and returns the profile for `path`.
    pub fn remove(&self, path: &DevicePath) -> Result<DeviceProfile, ManageProfilesError> {
        let mut registry = self.registry();
        let removed = registry
            .remove(path)
            .ok_or_else(|| RegistryError::NotFound(path.clone()))?;
        self.store.save_all(registry.into_profiles())?;
        info!(device = %path, "profile removed");
        Ok(removed)
    }

    /// Makes `path` the only startup profile, or clears every startup flag
    /// when `path` is `None`.
    pub fn set_startup_profile(&self, path: Option<&DevicePath>) -> Result<(), ManageProfilesError> {
        let registry = self.registry();
        let mut profiles = registry.into_profiles();
        if let Some(path) = path {
            if !profiles.iter().any(|p| &p.device_path == path) {
                return Err(RegistryError::NotFound(path.clone()).into());
            }
        }
        for profile in &mut profiles {
            profile.apply_on_startup = Some(&profile.device_path) == path;
        }
        self.store.save_all(profiles)?;
        Ok(())
    }

    /// On first run (no profiles at all) creates a profile for `device_path`
    /// holding the current OS settings, so the switcher has something to
    /// return to.  Returns `None` when profiles already exist.
    pub fn synthesize_default(
        &self,
        device_path: DevicePath,
        settings: PointerSettings,
    ) -> Result<Option<DeviceProfile>, ManageProfilesError> {
        let registry = self.registry();
        if !registry.is_empty() {
            return Ok(None);
        }
        let profile = self.draft("Mouse 1", device_path.as_str(), settings)?;
        self.add(profile.clone())?;
        info!(device = %profile.device_path, "created default profile on first run");
        Ok(Some(profile))
    }

    fn registry(&self) -> ProfileRegistry {
        ProfileRegistry::new(self.store.all())
    }

    fn commit(
        &self,
        mut registry: ProfileRegistry,
        saved: &DevicePath,
        startup: bool,
    ) -> Result<(), StoreError> {
        if startup {
            registry.clear_startup_flags_except(saved);
        }
        self.store.save_all(registry.into_profiles())
    }
}

// ── Capture ───────────────────────────────────────────────────────────────────

/// Waits for the first device identity observed after the session starts.
#[derive(Debug, Default)]
pub struct CaptureSession {
    captured: Option<DevicePath>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a resolved identity.  Returns `true` when this call completed
    /// the session; later offers are ignored.
    pub fn offer(&mut self, path: DevicePath) -> bool {
        if self.captured.is_some() {
            return false;
        }
        self.captured = Some(path);
        true
    }

    pub fn into_captured(self) -> Option<DevicePath> {
        self.captured
    }
}

/// Remembers which devices have been reported so each is shown once.
#[derive(Debug, Default)]
pub struct DeviceDiscovery {
    seen: HashSet<DevicePath>,
}

impl DeviceDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `path` is observed.
    pub fn observe(&mut self, path: &DevicePath) -> bool {
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
