//! Profile registry: the ordered set of configured devices and its
//! device-path index.
//!
//! The registry keeps profiles in the order they were configured (that order
//! decides which profile wins when several request startup application) and a
//! `HashMap<DevicePath, usize>` index for O(1) lookup on the motion hot path.
//!
//! The index is never patched in place.  Every mutation edits the ordered
//! `Vec` and then rebuilds the index from scratch, so the index can never
//! disagree with the list it describes.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use super::profile::{DevicePath, DeviceProfile, IconColor};

/// Errors raised by registry mutations that enforce uniqueness.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a device named {0:?} already exists")]
    DuplicateName(String),
    #[error("device path {0} is already assigned to {1:?}")]
    DuplicatePath(DevicePath, String),
    #[error("no profile for device path {0}")]
    NotFound(DevicePath),
}

/// Ordered collection of device profiles with a path index.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<DeviceProfile>,
    by_path: HashMap<DevicePath, usize>,
}

impl ProfileRegistry {
    /// Builds a registry from `profiles`, keeping their order.
    ///
    /// Loading is lenient: when two profiles share a device path the first one
    /// is indexed and the later one is kept in the list but never matched.
    pub fn new(profiles: Vec<DeviceProfile>) -> Self {
        let mut registry = Self {
            profiles,
            by_path: HashMap::new(),
        };
        registry.rebuild_index();
        registry
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles in configuration order.
    pub fn profiles(&self) -> &[DeviceProfile] {
        &self.profiles
    }

    pub fn find_by_device_path(&self, path: &DevicePath) -> Option<&DeviceProfile> {
        self.by_path.get(path).map(|&i| &self.profiles[i])
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&DeviceProfile> {
        let name = name.trim();
        self.profiles
            .iter()
            .find(|p| p.name.trim().eq_ignore_ascii_case(name))
    }

    /// Looks a profile up by name first, then by device path.
    pub fn find_by_name_or_path(&self, key: &str) -> Option<&DeviceProfile> {
        self.find_by_name(key).or_else(|| {
            DevicePath::new(key)
                .ok()
                .and_then(|path| self.find_by_device_path(&path))
        })
    }

    /// Whether another profile (other than the one at `ignore`) already uses `name`.
    pub fn name_exists(&self, name: &str, ignore: Option<&DevicePath>) -> bool {
        let name = name.trim();
        self.profiles.iter().any(|p| {
            Some(&p.device_path) != ignore && p.name.trim().eq_ignore_ascii_case(name)
        })
    }

    /// The profile to push at process start: the first enabled profile
    /// flagged `apply_on_startup`.
    pub fn startup_profile(&self) -> Option<&DeviceProfile> {
        self.startup_candidates().next()
    }

    /// Every enabled profile flagged `apply_on_startup`, in order.
    pub fn startup_candidates(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.profiles
            .iter()
            .filter(|p| p.enabled && p.apply_on_startup)
    }

    /// First palette colour no profile uses yet, or the first palette entry
    /// when every colour is taken.
    pub fn next_icon_color(&self) -> IconColor {
        IconColor::PALETTE
            .iter()
            .copied()
            .find(|c| !self.profiles.iter().any(|p| p.icon_color == *c))
            .unwrap_or(IconColor::PALETTE[0])
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Adds a new profile, enforcing unique names and device paths.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] or [`RegistryError::DuplicatePath`].
    pub fn insert(&mut self, profile: DeviceProfile) -> Result<(), RegistryError> {
        self.check_unique(&profile, None)?;
        self.profiles.push(profile);
        self.rebuild_index();
        Ok(())
    }

    /// Replaces the profile currently registered under `existing`.  The new
    /// profile may carry a different device path.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when `existing` is unknown, or a uniqueness
    /// violation against the other profiles.
    pub fn replace(
        &mut self,
        existing: &DevicePath,
        profile: DeviceProfile,
    ) -> Result<(), RegistryError> {
        let index = *self
            .by_path
            .get(existing)
            .ok_or_else(|| RegistryError::NotFound(existing.clone()))?;
        self.check_unique(&profile, Some(existing))?;
        self.profiles[index] = profile;
        self.rebuild_index();
        Ok(())
    }

    /// Inserts or overwrites without uniqueness checks.  The profile replaces
    /// the entry with the same device path, or failing that the entry with the
    /// same name (its path was edited), or is appended.
    pub fn upsert(&mut self, profile: DeviceProfile) {
        let index = self.by_path.get(&profile.device_path).copied().or_else(|| {
            let name = profile.name.trim();
            self.profiles
                .iter()
                .position(|p| p.name.trim().eq_ignore_ascii_case(name))
        });
        match index {
            Some(index) => self.profiles[index] = profile,
            None => self.profiles.push(profile),
        }
        self.rebuild_index();
    }

    /// Removes the profile for `path`, returning it.
    pub fn remove(&mut self, path: &DevicePath) -> Option<DeviceProfile> {
        let index = *self.by_path.get(path)?;
        let removed = self.profiles.remove(index);
        self.rebuild_index();
        Some(removed)
    }

    /// Clears `apply_on_startup` on every profile except the one at `keep`.
    pub fn clear_startup_flags_except(&mut self, keep: &DevicePath) {
        for profile in &mut self.profiles {
            if &profile.device_path != keep {
                profile.apply_on_startup = false;
            }
        }
    }

    /// Consumes the registry, returning the ordered profile list.
    pub fn into_profiles(self) -> Vec<DeviceProfile> {
        self.profiles
    }

    fn check_unique(
        &self,
        profile: &DeviceProfile,
        ignore: Option<&DevicePath>,
    ) -> Result<(), RegistryError> {
        if self.name_exists(&profile.name, ignore) {
            return Err(RegistryError::DuplicateName(profile.name.trim().to_string()));
        }
        if let Some(owner) = self.find_by_device_path(&profile.device_path) {
            if Some(&owner.device_path) != ignore {
                return Err(RegistryError::DuplicatePath(
                    profile.device_path.clone(),
                    owner.name.clone(),
                ));
            }
        }
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.by_path.clear();
        for (index, profile) in self.profiles.iter().enumerate() {
            if self.by_path.contains_key(&profile.device_path) {
                warn!(
                    device = %profile.device_path,
                    name = %profile.name,
                    "duplicate device path; profile will never be matched"
                );
                continue;
            }
            self.by_path.insert(profile.device_path.clone(), index);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DevicePath {
        DevicePath::new(s).unwrap()
    }

    fn profile(name: &str, p: &str) -> DeviceProfile {
        DeviceProfile::new(name, path(p))
    }

    #[test]
    fn test_find_by_device_path_is_case_insensitive() {
        let registry = ProfileRegistry::new(vec![profile("Mouse", r"\\?\HID#VID_046D")]);
        let found = registry.find_by_device_path(&path(r"\\?\hid#vid_046d"));
        assert_eq!(found.map(|p| p.name.as_str()), Some("Mouse"));
    }

    #[test]
    fn test_find_by_device_path_returns_none_for_unknown_device() {
        let registry = ProfileRegistry::new(vec![profile("Mouse", "a")]);
        assert!(registry.find_by_device_path(&path("b")).is_none());
    }

    #[test]
    fn test_duplicate_paths_first_profile_wins_lookup() {
        // Arrange
        let registry = ProfileRegistry::new(vec![profile("First", "dev"), profile("Second", "DEV")]);

        // Act
        let found = registry.find_by_device_path(&path("dev")).unwrap();

        // Assert
        assert_eq!(found.name, "First");
        assert_eq!(registry.len(), 2, "shadowed profile is kept in the list");
    }

    #[test]
    fn test_startup_profile_is_first_enabled_flagged_profile() {
        // Arrange
        let mut disabled = profile("Disabled", "a");
        disabled.apply_on_startup = true;
        disabled.enabled = false;
        let mut first = profile("First", "b");
        first.apply_on_startup = true;
        let mut second = profile("Second", "c");
        second.apply_on_startup = true;
        let registry = ProfileRegistry::new(vec![disabled, first, second]);

        // Act / Assert
        assert_eq!(registry.startup_profile().unwrap().name, "First");
        assert_eq!(registry.startup_candidates().count(), 2);
    }

    #[test]
    fn test_startup_profile_none_when_no_profile_flagged() {
        let registry = ProfileRegistry::new(vec![profile("A", "a"), profile("B", "b")]);
        assert!(registry.startup_profile().is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_name_ignoring_case() {
        let mut registry = ProfileRegistry::new(vec![profile("Trackball", "a")]);
        let result = registry.insert(profile("TRACKBALL", "b"));
        assert_eq!(result, Err(RegistryError::DuplicateName("TRACKBALL".into())));
    }

    #[test]
    fn test_insert_rejects_duplicate_path() {
        let mut registry = ProfileRegistry::new(vec![profile("Trackball", "a")]);
        let result = registry.insert(profile("Mouse", "A"));
        assert!(matches!(result, Err(RegistryError::DuplicatePath(_, owner)) if owner == "Trackball"));
    }

    #[test]
    fn test_replace_allows_keeping_own_name_and_changing_path() {
        // Arrange
        let mut registry = ProfileRegistry::new(vec![profile("Trackball", "a"), profile("Mouse", "b")]);

        // Act
        registry
            .replace(&path("a"), profile("Trackball", "c"))
            .expect("editing a profile in place must succeed");

        // Assert
        assert!(registry.find_by_device_path(&path("a")).is_none());
        assert_eq!(registry.find_by_device_path(&path("c")).unwrap().name, "Trackball");
        assert_eq!(registry.profiles()[0].name, "Trackball", "order is preserved");
    }

    #[test]
    fn test_replace_unknown_path_is_not_found() {
        let mut registry = ProfileRegistry::new(vec![]);
        let result = registry.replace(&path("x"), profile("X", "x"));
        assert_eq!(result, Err(RegistryError::NotFound(path("x"))));
    }

    #[test]
    fn test_remove_rebuilds_index_for_following_profiles() {
        // Arrange
        let mut registry =
            ProfileRegistry::new(vec![profile("A", "a"), profile("B", "b"), profile("C", "c")]);

        // Act
        let removed = registry.remove(&path("a"));

        // Assert
        assert_eq!(removed.unwrap().name, "A");
        assert_eq!(registry.find_by_device_path(&path("c")).unwrap().name, "C");
        assert_eq!(registry.find_by_device_path(&path("b")).unwrap().name, "B");
    }

    #[test]
    fn test_upsert_matches_by_path_then_by_name() {
        // Arrange
        let mut registry = ProfileRegistry::new(vec![profile("A", "a"), profile("B", "b")]);

        // Act
        registry.upsert(profile("A renamed", "A").with_speed(4));
        registry.upsert(profile("b", "b-moved"));
        registry.upsert(profile("C", "c"));

        // Assert
        let names: Vec<&str> = registry.profiles().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A renamed", "b", "C"]);
        assert_eq!(registry.find_by_device_path(&path("a")).unwrap().settings.speed, 4);
        assert!(registry.find_by_device_path(&path("b")).is_none());
        assert!(registry.find_by_device_path(&path("b-moved")).is_some());
    }

    #[test]
    fn test_next_icon_color_skips_used_palette_entries() {
        // Arrange
        let mut a = profile("A", "a");
        a.icon_color = IconColor::STEEL_BLUE;
        let mut b = profile("B", "b");
        b.icon_color = IconColor::ORANGE_RED;
        let registry = ProfileRegistry::new(vec![a, b]);

        // Act / Assert
        assert_eq!(registry.next_icon_color(), IconColor::FOREST_GREEN);
    }

    #[test]
    fn test_next_icon_color_wraps_to_first_when_palette_exhausted() {
        let profiles = IconColor::PALETTE
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut p = profile(&format!("P{i}"), &format!("path{i}"));
                p.icon_color = *c;
                p
            })
            .collect();
        let registry = ProfileRegistry::new(profiles);
        assert_eq!(registry.next_icon_color(), IconColor::STEEL_BLUE);
    }

    #[test]
    fn test_find_by_name_or_path_prefers_name() {
        let registry = ProfileRegistry::new(vec![profile("Mouse", "m"), profile("m", "x")]);
        assert_eq!(registry.find_by_name_or_path("m").unwrap().name, "m");
        assert_eq!(registry.find_by_name_or_path("MOUSE").unwrap().name, "Mouse");
        assert_eq!(registry.find_by_name_or_path("X").unwrap().name, "m");
    }

    #[test]
    fn test_clear_startup_flags_except_keeps_only_one() {
        let mut a = profile("A", "a");
        a.apply_on_startup = true;
        let mut b = profile("B", "b");
        b.apply_on_startup = true;
        let mut registry = ProfileRegistry::new(vec![a, b]);

        registry.clear_startup_flags_except(&path("b"));

        assert_eq!(registry.startup_profile().unwrap().name, "B");
        assert_eq!(registry.startup_candidates().count(), 1);
    }
}
