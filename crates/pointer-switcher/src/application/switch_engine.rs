//! SwitchingEngine: decides whether, when, and how to push a profile to the OS.
//!
//! This use case is the heart of the switcher.  It receives resolved device
//! identities from the raw-input loop, looks up the matching profile in the
//! [`ProfileStore`], compares the candidate settings with what was last
//! applied, enforces the minimum switch interval, and drives the
//! [`SettingsApplier`] and [`ActiveDeviceNotifier`].
//!
//! # State machine
//!
//! ```text
//!            motion(known, enabled, auto_apply)
//!   Idle ─────────────────────────────────────────▶ Active(device, applied)
//!                                                    │   ▲
//!                        motion from another device  │   │ apply / adopt
//!                        (settings differ, interval  │   │
//!                         elapsed or exempt)         ▼   │
//!                                                    Active(other, applied')
//! ```
//!
//! Everything the engine knows lives in one [`EngineState`] owned by the
//! engine instance.  Nothing is persisted; a restart begins in `Idle` and the
//! startup profile (if any) seeds the first `Active` state.
//!
//! # Architecture
//!
//! The engine depends only on ports (`ProfileStore`, `PointerBackend` through
//! the applier, `Clock`) and domain types.  All implementations are injected
//! at construction time, so the debounce logic is tested with a
//! [`ManualClock`] instead of real sleeps.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pointer_core::{clamp_or, AppliedSettings, DevicePath, DeviceProfile, ProfileRegistry, SPEED_RANGE};
use tracing::{debug, info, trace, warn};

use super::active_device::{ActiveDeviceListener, ActiveDeviceNotifier, ActiveDeviceStatus};
use super::apply_settings::SettingsApplier;
use super::profile_store::{ProfileStore, StoreError};

/// Default minimum time between two OS writes triggered by motion.
pub const MIN_SWITCH_INTERVAL: Duration = Duration::from_millis(200);

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Port: monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven [`Clock`] for tests and benchmarks.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

// ── Policy and state ──────────────────────────────────────────────────────────

/// Debounce configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchPolicy {
    /// Minimum time between two motion-triggered OS writes.
    pub min_switch_interval: Duration,
    /// When `false`, a change of device is applied immediately even inside
    /// the interval; only same-device setting changes are debounced.
    pub debounce_device_changes: bool,
}

impl Default for SwitchPolicy {
    fn default() -> Self {
        Self {
            min_switch_interval: MIN_SWITCH_INTERVAL,
            debounce_device_changes: true,
        }
    }
}

/// Everything the engine remembers between events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    /// What was last pushed to the OS, and from which device.
    pub last_applied: Option<AppliedSettings>,
    /// Clock reading of the last OS write; `None` before the first one.
    pub last_switch_at: Option<Duration>,
    /// The device currently considered in use.
    pub active_device_key: Option<DevicePath>,
}

impl EngineState {
    pub fn is_idle(&self) -> bool {
        self.active_device_key.is_none()
    }
}

/// Why an event did not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No profile matches the device path.
    UnknownDevice,
    /// The profile exists but is disabled.
    Disabled,
    /// The profile does not take part in automatic switching.
    AutoApplyOff,
    /// No enabled profile asks to be applied at startup.
    NoStartupProfile,
    /// The speed was stored, but the device is not the active one so nothing
    /// was pushed to the OS.
    NotActiveDevice,
}

/// Result of one engine entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Settings were pushed to the OS.
    Applied,
    /// The active device already has these settings in effect.
    AlreadyCurrent,
    /// The active device changed but its settings equal what is applied, so
    /// only the active device was updated.
    ActiveDeviceChanged,
    /// A change was due but fell inside the minimum switch interval and was
    /// dropped.
    Deferred,
    Ignored(IgnoreReason),
}

// ── SwitchingEngine ───────────────────────────────────────────────────────────

/// The debounced switching state machine.
pub struct SwitchingEngine {
    store: Rc<dyn ProfileStore>,
    applier: SettingsApplier,
    clock: Rc<dyn Clock>,
    policy: SwitchPolicy,
    notifier: ActiveDeviceNotifier,
    state: EngineState,
}

impl SwitchingEngine {
    pub fn new(
        store: Rc<dyn ProfileStore>,
        applier: SettingsApplier,
        clock: Rc<dyn Clock>,
        policy: SwitchPolicy,
    ) -> Self {
        Self {
            store,
            applier,
            clock,
            policy,
            notifier: ActiveDeviceNotifier::new(),
            state: EngineState::default(),
        }
    }

    pub fn subscribe(&mut self, listener: Rc<dyn ActiveDeviceListener>) {
        self.notifier.subscribe(listener);
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn policy(&self) -> &SwitchPolicy {
        &self.policy
    }

    pub fn applier(&self) -> &SettingsApplier {
        &self.applier
    }

    /// The most recently published active-device status.
    pub fn active_status(&self) -> Option<&ActiveDeviceStatus> {
        self.notifier.current()
    }

    /// Handles motion from the device at `path`.
    pub fn on_device_motion(&mut self, path: &DevicePath) -> SwitchOutcome {
        let Some(profile) = self.store.find_by_device_path(path) else {
            trace!(device = %path, "motion from unconfigured device");
            return SwitchOutcome::Ignored(IgnoreReason::UnknownDevice);
        };
        if !profile.enabled {
            trace!(device = %profile.name, "profile disabled");
            return SwitchOutcome::Ignored(IgnoreReason::Disabled);
        }
        if !profile.auto_apply {
            trace!(device = %profile.name, "profile does not auto-apply");
            return SwitchOutcome::Ignored(IgnoreReason::AutoApplyOff);
        }

        let candidate = self.applier.clamp(&profile.settings);
        let device_changed = self.state.active_device_key.as_ref() != Some(&profile.device_path);
        let settings_changed = self
            .state
            .last_applied
            .as_ref()
            .map_or(true, |applied| applied.settings != candidate);

        if !settings_changed {
            if !device_changed {
                return SwitchOutcome::AlreadyCurrent;
            }
            debug!(device = %profile.name, "active device changed; settings already in effect");
            self.state.active_device_key = Some(profile.device_path.clone());
            self.state.last_applied = Some(AppliedSettings {
                device_key: profile.device_path.clone(),
                settings: candidate,
            });
            self.notifier.notify(ActiveDeviceStatus::new(&profile, &candidate));
            return SwitchOutcome::ActiveDeviceChanged;
        }

        let now = self.clock.now();
        let exempt = device_changed && !self.policy.debounce_device_changes;
        if !exempt && !self.interval_elapsed(now) {
            debug!(
                device = %profile.name,
                interval_ms = self.policy.min_switch_interval.as_millis() as u64,
                "switch deferred; inside minimum interval"
            );
            return SwitchOutcome::Deferred;
        }

        self.push(&profile, candidate, false, now);
        SwitchOutcome::Applied
    }

    /// Stores a manually chosen speed for the profile at `path`.
    ///
    /// Out-of-range speeds keep the profile's current speed.  The store write
    /// is best-effort.  When the device is the active one the updated profile
    /// is force-applied at once.
    pub fn on_manual_speed_change(&mut self, path: &DevicePath, speed: i64) -> SwitchOutcome {
        let Some(profile) = self.speed_changed_profile(path, speed) else {
            return SwitchOutcome::Ignored(IgnoreReason::UnknownDevice);
        };
        if let Err(e) = self.store.persist(&profile) {
            warn!(device = %profile.name, error = %e, "failed to persist speed change");
        }
        self.apply_if_active(&profile)
    }

    /// Like [`Self::on_manual_speed_change`], but the store write must
    /// succeed.  Nothing is pushed to the OS when it fails.
    ///
    /// # Errors
    ///
    /// Returns the store's [`StoreError`].
    pub fn try_manual_speed_change(
        &mut self,
        path: &DevicePath,
        speed: i64,
    ) -> Result<SwitchOutcome, StoreError> {
        let Some(profile) = self.speed_changed_profile(path, speed) else {
            return Ok(SwitchOutcome::Ignored(IgnoreReason::UnknownDevice));
        };
        self.store.persist(&profile)?;
        Ok(self.apply_if_active(&profile))
    }

    /// Force-applies the startup profile, if any, and makes it active.
    ///
    /// The first enabled profile flagged `apply_on_startup` in store order
    /// wins; other flagged profiles are logged and skipped.
    pub fn on_startup(&mut self) -> SwitchOutcome {
        let registry = ProfileRegistry::new(self.store.all());
        let mut candidates = registry.startup_candidates();
        let Some(profile) = candidates.next() else {
            debug!("no startup profile");
            return SwitchOutcome::Ignored(IgnoreReason::NoStartupProfile);
        };
        let skipped: Vec<&str> = candidates.map(|p| p.name.as_str()).collect();
        if !skipped.is_empty() {
            warn!(
                using = %profile.name,
                ignored = ?skipped,
                "several profiles request startup application; using the first"
            );
        }

        let candidate = self.applier.clamp(&profile.settings);
        let now = self.clock.now();
        info!(device = %profile.name, "applying startup profile");
        self.push(profile, candidate, true, now);
        SwitchOutcome::Applied
    }

    /// Force-applies `profile` without making its device active.
    ///
    /// Used to preview unsaved edits.  The settings are recorded as last
    /// applied, so the next motion compares against what the OS now holds.
    pub fn apply_preview(&mut self, profile: &DeviceProfile) -> SwitchOutcome {
        let candidate = self.applier.clamp(&profile.settings);
        let report = self.applier.apply(&candidate, true, true);
        debug!(
            device = %profile.name,
            written = report.written.len(),
            failed = report.failures.len(),
            "preview applied"
        );
        self.state.last_applied = Some(AppliedSettings {
            device_key: profile.device_path.clone(),
            settings: candidate,
        });
        self.state.last_switch_at = Some(self.clock.now());
        SwitchOutcome::Applied
    }

    fn speed_changed_profile(&self, path: &DevicePath, speed: i64) -> Option<DeviceProfile> {
        let Some(mut profile) = self.store.find_by_device_path(path) else {
            warn!(device = %path, "speed change for unconfigured device");
            return None;
        };
        profile.settings.speed = clamp_or(speed, SPEED_RANGE, profile.settings.speed);
        info!(device = %profile.name, speed = profile.settings.speed, "speed changed");
        Some(profile)
    }

    fn apply_if_active(&mut self, profile: &DeviceProfile) -> SwitchOutcome {
        if self.state.active_device_key.as_ref() != Some(&profile.device_path) {
            return SwitchOutcome::Ignored(IgnoreReason::NotActiveDevice);
        }
        let candidate = self.applier.clamp(&profile.settings);
        let now = self.clock.now();
        self.push(profile, candidate, true, now);
        SwitchOutcome::Applied
    }

    fn interval_elapsed(&self, now: Duration) -> bool {
        match self.state.last_switch_at {
            None => true,
            Some(at) => now.saturating_sub(at) >= self.policy.min_switch_interval,
        }
    }

    fn push(
        &mut self,
        profile: &DeviceProfile,
        settings: pointer_core::PointerSettings,
        force: bool,
        now: Duration,
    ) {
        let report = self.applier.apply(&settings, true, force);
        info!(
            device = %profile.name,
            speed = settings.speed,
            written = report.written.len(),
            failed = report.failures.len(),
            "pointer settings switched"
        );
        self.state.last_applied = Some(AppliedSettings {
            device_key: profile.device_path.clone(),
            settings,
        });
        self.state.last_switch_at = Some(now);
        self.state.active_device_key = Some(profile.device_path.clone());
        self.notifier.notify(ActiveDeviceStatus::new(profile, &settings));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
