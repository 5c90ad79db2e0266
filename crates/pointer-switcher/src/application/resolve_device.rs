//! Device identity resolution.
//!
//! Turns a decoded raw-input report into the stable [`DevicePath`] of the
//! physical device that produced it, or `None` when the report should not
//! influence which device is considered in use.
//!
//! # Why a handle is not enough (for beginners)
//!
//! Every raw-input report carries an OS *handle* for its device.  Handles are
//! cheap to compare but are reassigned whenever a device is re-plugged or the
//! machine reboots, so profiles cannot be keyed on them.  The device *path*
//! (`\\?\HID#VID_...`) is stable, but fetching it costs a system call that
//! allocates a wide-string buffer.  [`CachingDevicePathQuery`] keeps a
//! handle → path map so the hot path pays that cost once per device, and
//! drops an entry when the event source reports that the device went away.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pointer_core::{DeviceHandle, DevicePath, RawMotion};
use tracing::trace;

/// Port: looks up the OS device path for a raw-input device handle.
pub trait DevicePathQuery {
    /// Returns the device path, or `None` when the OS lookup fails.
    fn device_path(&self, device: DeviceHandle) -> Option<String>;

    /// Forgets anything remembered about `device`.  Called when the device is
    /// removed, since its handle may later be reused for another device.
    fn forget(&self, _device: DeviceHandle) {}
}

/// Resolves raw-input reports to device identities.
pub struct DeviceIdentityResolver {
    query: Rc<dyn DevicePathQuery>,
}

impl DeviceIdentityResolver {
    pub fn new(query: Rc<dyn DevicePathQuery>) -> Self {
        Self { query }
    }

    /// Returns the identity of the device behind `motion`.
    ///
    /// Non-mouse reports, zero-displacement reports (buttons and wheel), failed
    /// lookups, and empty paths all yield `None`.  Never panics.
    pub fn resolve(&self, motion: &RawMotion) -> Option<DevicePath> {
        if !motion.establishes_identity() {
            return None;
        }
        let raw = self.query.device_path(motion.device)?;
        match DevicePath::new(&raw) {
            Ok(path) => Some(path),
            Err(_) => {
                trace!(handle = motion.device.0, "device reported an empty path");
                None
            }
        }
    }

    /// Forwards a removal notification to the path query.
    pub fn device_removed(&self, device: DeviceHandle) {
        self.query.forget(device);
    }
}

// ── CachingDevicePathQuery ────────────────────────────────────────────────────

/// Decorator that memoizes successful lookups of an inner [`DevicePathQuery`].
///
/// Failed lookups are not cached, so a device that briefly reports no path is
/// retried on its next report.
pub struct CachingDevicePathQuery<Q> {
    inner: Q,
    cache: RefCell<HashMap<DeviceHandle, String>>,
    misses: Cell<u64>,
}

impl<Q: DevicePathQuery> CachingDevicePathQuery<Q> {
    pub fn new(inner: Q) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
            misses: Cell::new(0),
        }
    }

    /// Number of lookups forwarded to the inner query.
    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<Q: DevicePathQuery> DevicePathQuery for CachingDevicePathQuery<Q> {
    fn device_path(&self, device: DeviceHandle) -> Option<String> {
        if let Some(path) = self.cache.borrow().get(&device) {
            return Some(path.clone());
        }
        self.misses.set(self.misses.get() + 1);
        let path = self.inner.device_path(device)?;
        if !path.trim_end_matches('\0').trim().is_empty() {
            self.cache.borrow_mut().insert(device, path.clone());
        }
        Some(path)
    }

    fn forget(&self, device: DeviceHandle) {
        if self.cache.borrow_mut().remove(&device).is_some() {
            trace!(handle = device.0, "dropped cached device path");
        }
        self.inner.forget(device);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::raw_input::mock::MockDevicePathQuery;
    use pointer_core::{RawDeviceKind, RawMotion};

    const PATH: &str = r"\\?\HID#VID_046D&PID_C539&MI_01#8&10c9e4b2&0&0000#{378de44c-56ef-11d1-bc8c-00a0c91405dd}";

    fn resolver_with(query: MockDevicePathQuery) -> (DeviceIdentityResolver, Rc<MockDevicePathQuery>) {
        let query = Rc::new(query);
        (DeviceIdentityResolver::new(query.clone()), query)
    }

    #[test]
    fn test_resolve_returns_path_for_moving_mouse() {
        // Arrange
        let (resolver, _) = resolver_with(MockDevicePathQuery::new().with_device(1, PATH));

        // Act
        let resolved = resolver.resolve(&RawMotion::mouse(DeviceHandle(1), 4, -1));

        // Assert
        assert_eq!(resolved.map(|p| p.as_str().to_string()), Some(PATH.to_string()));
    }

    #[test]
    fn test_resolve_ignores_zero_displacement_without_querying_os() {
        let (resolver, query) = resolver_with(MockDevicePathQuery::new().with_device(1, PATH));

        assert!(resolver.resolve(&RawMotion::mouse(DeviceHandle(1), 0, 0)).is_none());
        assert_eq!(query.lookups(), 0);
    }

    #[test]
    fn test_resolve_ignores_keyboard_reports() {
        let (resolver, query) = resolver_with(MockDevicePathQuery::new().with_device(1, PATH));
        let report = RawMotion {
            kind: RawDeviceKind::Keyboard,
            device: DeviceHandle(1),
            last_x: 5,
            last_y: 5,
        };

        assert!(resolver.resolve(&report).is_none());
        assert_eq!(query.lookups(), 0);
    }

    #[test]
    fn test_resolve_returns_none_when_lookup_fails() {
        let (resolver, _) = resolver_with(MockDevicePathQuery::new());
        assert!(resolver.resolve(&RawMotion::mouse(DeviceHandle(9), 1, 1)).is_none());
    }

    #[test]
    fn test_resolve_returns_none_for_empty_path() {
        let (resolver, _) = resolver_with(MockDevicePathQuery::new().with_device(2, "\0"));
        assert!(resolver.resolve(&RawMotion::mouse(DeviceHandle(2), 1, 0)).is_none());
    }

    #[test]
    fn test_caching_query_hits_os_once_per_device() {
        // Arrange
        let query = CachingDevicePathQuery::new(MockDevicePathQuery::new().with_device(1, PATH));

        // Act
        for _ in 0..100 {
            assert_eq!(query.device_path(DeviceHandle(1)).as_deref(), Some(PATH));
        }

        // Assert
        assert_eq!(query.misses(), 1);
        assert_eq!(query.cached_len(), 1);
    }

    #[test]
    fn test_caching_query_forget_forces_fresh_lookup() {
        // Arrange
        let query = CachingDevicePathQuery::new(MockDevicePathQuery::new().with_device(1, PATH));
        query.device_path(DeviceHandle(1));

        // Act
        query.forget(DeviceHandle(1));
        query.device_path(DeviceHandle(1));

        // Assert
        assert_eq!(query.misses(), 2);
    }

    #[test]
    fn test_caching_query_does_not_cache_failures() {
        let query = CachingDevicePathQuery::new(MockDevicePathQuery::new());
        assert!(query.device_path(DeviceHandle(3)).is_none());
        assert!(query.device_path(DeviceHandle(3)).is_none());
        assert_eq!(query.misses(), 2);
        assert_eq!(query.cached_len(), 0);
    }

    #[test]
    fn test_device_removed_reaches_cache() {
        // Arrange
        let caching = Rc::new(CachingDevicePathQuery::new(
            MockDevicePathQuery::new().with_device(1, PATH),
        ));
        let resolver = DeviceIdentityResolver::new(caching.clone());
        resolver.resolve(&RawMotion::mouse(DeviceHandle(1), 1, 0));

        // Act
        resolver.device_removed(DeviceHandle(1));

        // Assert
        assert_eq!(caching.cached_len(), 0);
    }
}
