//! EventDispatcher: feeds raw-input events into the switching engine.
//!
//! This is the glue between a [`MotionSource`] and the use cases.  For each
//! event it:
//!
//! 1. Resolves a motion report to a [`pointer_core::DevicePath`] (or drops it).
//! 2. On first run, when no profile exists at all, creates a default profile
//!    for the first device that moves.
//! 3. Hands the path to [`SwitchingEngine::on_device_motion`].
//!
//! Removal notifications go to the resolver so a stale handle → path entry
//! cannot be reused for a different device.

use std::ops::ControlFlow;

use pointer_core::PointerSettings;
use tracing::{debug, warn};

use super::manage_profiles::ProfileManager;
use super::resolve_device::DeviceIdentityResolver;
use super::switch_engine::{SwitchOutcome, SwitchingEngine};
use crate::infrastructure::raw_input::{MotionSource, RawInputError, SourceEvent};

/// Creates the "Mouse 1" profile on the first qualifying motion.
struct FirstRun {
    manager: ProfileManager,
    settings: PointerSettings,
}

/// Routes [`SourceEvent`]s to the resolver and the engine.
pub struct EventDispatcher {
    resolver: DeviceIdentityResolver,
    engine: SwitchingEngine,
    first_run: Option<FirstRun>,
}

impl EventDispatcher {
    pub fn new(resolver: DeviceIdentityResolver, engine: SwitchingEngine) -> Self {
        Self {
            resolver,
            engine,
            first_run: None,
        }
    }

    /// Enables first-run profile creation with `settings` as its values.
    ///
    /// Has no effect once any profile exists.
    pub fn with_first_run(mut self, manager: ProfileManager, settings: PointerSettings) -> Self {
        self.first_run = Some(FirstRun { manager, settings });
        self
    }

    pub fn engine(&self) -> &SwitchingEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SwitchingEngine {
        &mut self.engine
    }

    /// Handles one event.  Returns the engine's outcome for motion that
    /// resolved to a device, `None` otherwise.
    pub fn handle_event(&mut self, event: SourceEvent) -> Option<SwitchOutcome> {
        match event {
            SourceEvent::Motion(motion) => {
                let path = self.resolver.resolve(&motion)?;
                self.ensure_first_profile(&path);
                Some(self.engine.on_device_motion(&path))
            }
            SourceEvent::DeviceRemoved(device) => {
                debug!(handle = device.0, "device removed");
                self.resolver.device_removed(device);
                None
            }
        }
    }

    /// Drives `source` until it stops delivering events.
    ///
    /// # Errors
    ///
    /// Propagates the event source's error.
    pub fn run(&mut self, source: &mut dyn MotionSource) -> Result<(), RawInputError> {
        source.run(&mut |event| {
            self.handle_event(event);
            ControlFlow::Continue(())
        })
    }

    fn ensure_first_profile(&mut self, path: &pointer_core::DevicePath) {
        let Some(first_run) = self.first_run.take() else {
            return;
        };
        if let Err(e) = first_run
            .manager
            .synthesize_default(path.clone(), first_run.settings)
        {
            warn!(device = %path, error = %e, "could not create first-run profile");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use pointer_core::{DeviceHandle, DevicePath, DeviceProfile, RawDeviceKind, RawMotion};

    use crate::application::apply_settings::SettingsApplier;
    use crate::application::profile_store::{InMemoryProfileStore, ProfileStore};
    use crate::application::switch_engine::{IgnoreReason, ManualClock, SwitchPolicy};
    use crate::infrastructure::pointer_settings::mock::MockPointerBackend;
    use crate::infrastructure::raw_input::mock::{MockDevicePathQuery, ScriptedMotionSource};

    const MOUSE: &str = r"\\?\HID#VID_046D&PID_C52B#mouse";
    const TRACKBALL: &str = r"\\?\HID#VID_047D&PID_1020#trackball";

    struct Fixture {
        dispatcher: EventDispatcher,
        store: Rc<InMemoryProfileStore>,
        query: Rc<MockDevicePathQuery>,
        backend: Rc<MockPointerBackend>,
    }

    fn fixture(profiles: Vec<DeviceProfile>) -> Fixture {
        let store = Rc::new(InMemoryProfileStore::new(profiles));
        let query = Rc::new(
            MockDevicePathQuery::new()
                .with_device(1, MOUSE)
                .with_device(2, TRACKBALL),
        );
        let backend = Rc::new(MockPointerBackend::new());
        let engine = SwitchingEngine::new(
            store.clone(),
            SettingsApplier::new(backend.clone()),
            Rc::new(ManualClock::new()),
            SwitchPolicy::default(),
        );
        Fixture {
            dispatcher: EventDispatcher::new(DeviceIdentityResolver::new(query.clone()), engine),
            store,
            query,
            backend,
        }
    }

    fn motion(device: isize) -> SourceEvent {
        SourceEvent::Motion(RawMotion::mouse(DeviceHandle(device), 3, -1))
    }

    fn profile(name: &str, raw_path: &str, speed: u32) -> DeviceProfile {
        DeviceProfile::new(name, DevicePath::new(raw_path).unwrap()).with_speed(speed)
    }

    #[test]
    fn test_motion_from_known_device_applies_its_profile() {
        // Arrange
        let mut f = fixture(vec![profile("Trackball", TRACKBALL, 4)]);

        // Act
        let outcome = f.dispatcher.handle_event(motion(2));

        // Assert
        assert_eq!(outcome, Some(SwitchOutcome::Applied));
        assert_eq!(f.backend.current().speed, 4);
    }

    #[test]
    fn test_motion_from_unknown_device_is_ignored() {
        let mut f = fixture(vec![profile("Trackball", TRACKBALL, 4)]);

        let outcome = f.dispatcher.handle_event(motion(1));

        assert_eq!(outcome, Some(SwitchOutcome::Ignored(IgnoreReason::UnknownDevice)));
        assert_eq!(f.backend.write_count(), 0);
    }

    #[test]
    fn test_zero_motion_never_reaches_engine() {
        // Arrange
        let mut f = fixture(vec![profile("Trackball", TRACKBALL, 4)]);
        let click = SourceEvent::Motion(RawMotion::mouse(DeviceHandle(2), 0, 0));

        // Act
        let outcome = f.dispatcher.handle_event(click);

        // Assert
        assert_eq!(outcome, None);
        assert_eq!(f.query.lookups(), 0);
        assert!(f.dispatcher.engine().state().is_idle());
    }

    #[test]
    fn test_keyboard_report_is_dropped() {
        let mut f = fixture(vec![profile("Trackball", TRACKBALL, 4)]);
        let key = SourceEvent::Motion(RawMotion {
            kind: RawDeviceKind::Keyboard,
            device: DeviceHandle(2),
            last_x: 5,
            last_y: 5,
        });

        assert_eq!(f.dispatcher.handle_event(key), None);
    }

    #[test]
    fn test_removal_is_forwarded_to_path_query() {
        let mut f = fixture(vec![]);

        let outcome = f.dispatcher.handle_event(SourceEvent::DeviceRemoved(DeviceHandle(2)));

        assert_eq!(outcome, None);
        assert_eq!(f.query.forgotten(), vec![DeviceHandle(2)]);
    }

    #[test]
    fn test_first_run_creates_default_profile_for_first_device() {
        // Arrange
        let f = fixture(vec![]);
        let manager = ProfileManager::new(f.store.clone());
        let live = PointerSettings {
            speed: 12,
            ..PointerSettings::default()
        };
        let mut dispatcher = f.dispatcher.with_first_run(manager, live);

        // Act
        let outcome = dispatcher.handle_event(motion(1));

        // Assert
        let all = f.store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Mouse 1");
        assert_eq!(all[0].settings.speed, 12);
        assert_eq!(outcome, Some(SwitchOutcome::Applied));
    }

    #[test]
    fn test_first_run_does_nothing_when_profiles_exist() {
        let f = fixture(vec![profile("Trackball", TRACKBALL, 4)]);
        let manager = ProfileManager::new(f.store.clone());
        let mut dispatcher = f.dispatcher.with_first_run(manager, PointerSettings::default());

        dispatcher.handle_event(motion(1));

        assert_eq!(f.store.all().len(), 1);
    }

    #[test]
    fn test_first_run_only_creates_one_profile() {
        let f = fixture(vec![]);
        let manager = ProfileManager::new(f.store.clone());
        let mut dispatcher = f.dispatcher.with_first_run(manager, PointerSettings::default());

        dispatcher.handle_event(motion(1));
        dispatcher.handle_event(motion(2));

        let names: Vec<String> = f.store.all().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Mouse 1".to_string()]);
    }

    #[test]
    fn test_run_consumes_every_scripted_event() {
        // Arrange
        let mut f = fixture(vec![
            profile("Mouse", MOUSE, 10),
            profile("Trackball", TRACKBALL, 4),
        ]);
        let mut source = ScriptedMotionSource::new()
            .with_motion(2, 1, 0)
            .with_removal(1)
            .with_motion(2, 0, 1);

        // Act
        f.dispatcher.run(&mut source).unwrap();

        // Assert
        assert_eq!(source.delivered(), 3);
        assert_eq!(source.remaining(), 0);
        assert_eq!(f.backend.current().speed, 4);
    }
}
