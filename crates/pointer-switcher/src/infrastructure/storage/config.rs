//! TOML-based configuration persistence for the pointer switcher.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\MultiMouseSwitcher\config.toml`
//! - Linux:    `~/.config/multimouseswitcher/config.toml`
//! - macOS:    `~/Library/Application Support/MultiMouseSwitcher/config.toml`
//!
//! The `--config` command-line flag points every function here at another
//! file instead.
//!
//! # File layout (for beginners)
//!
//! ```toml
//! [general]
//! log_level = "info"
//! min_switch_interval_ms = 200
//! debounce_device_changes = true
//!
//! [[devices]]
//! name = "Trackball"
//! device_path = '\\?\HID#VID_047D&PID_2041#7&1d4b2c3&0&0000#{378de44c-56ef-11d1-bc8c-00a0c91405dd}'
//! speed = 4
//! icon_color = "#228B22"
//! ```
//!
//! `[[devices]]` is TOML's "array of tables" syntax: each block appends one
//! entry to the `devices` list.  Every field except `name` and `device_path`
//! may be omitted and takes its documented default, so a hand-written entry
//! can be as short as two lines.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  This allows
//! the app to work correctly on first run (before a config file exists) and
//! when upgrading from an older config file that is missing newer fields.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pointer_core::{
    DevicePath, DeviceProfile, IconColor, PointerSettings, ProfileRegistry,
    DEFAULT_DOUBLE_CLICK_MS, DEFAULT_ENHANCE_POINTER_PRECISION, DEFAULT_SCROLL_CHARS,
    DEFAULT_SCROLL_LINES, DEFAULT_SPEED,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::profile_store::{ProfileStore, StoreError};
use crate::application::switch_engine::{SwitchPolicy, MIN_SWITCH_INTERVAL};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// Process-wide behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Minimum time between two motion-triggered switches.
    #[serde(default = "default_min_switch_interval_ms")]
    pub min_switch_interval_ms: u64,
    /// Whether a change of device is subject to the minimum interval too.
    #[serde(default = "default_true")]
    pub debounce_device_changes: bool,
}

impl GeneralConfig {
    /// The debounce policy described by this section.
    pub fn switch_policy(&self) -> SwitchPolicy {
        SwitchPolicy {
            min_switch_interval: Duration::from_millis(self.min_switch_interval_ms),
            debounce_device_changes: self.debounce_device_changes,
        }
    }
}

/// One `[[devices]]` entry.
///
/// Kept separate from [`DeviceProfile`] so a malformed entry (say, an empty
/// device path) can be skipped with a warning instead of failing the whole
/// file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceEntry {
    pub name: String,
    pub device_path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub auto_apply: bool,
    #[serde(default)]
    pub apply_on_startup: bool,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default = "default_enhance_pointer_precision")]
    pub enhance_pointer_precision: bool,
    #[serde(default = "default_scroll_lines")]
    pub scroll_lines: u32,
    #[serde(default = "default_scroll_chars")]
    pub scroll_chars: u32,
    #[serde(default)]
    pub swap_buttons: bool,
    #[serde(default = "default_double_click_time_ms")]
    pub double_click_time_ms: u32,
    #[serde(default)]
    pub icon_color: IconColor,
}

impl DeviceEntry {
    /// Converts the entry, or returns `None` when its device path is empty.
    pub fn to_profile(&self) -> Option<DeviceProfile> {
        let device_path = match DevicePath::new(&self.device_path) {
            Ok(path) => path,
            Err(e) => {
                warn!(name = %self.name, error = %e, "skipping device entry");
                return None;
            }
        };
        Some(DeviceProfile {
            name: self.name.clone(),
            device_path,
            enabled: self.enabled,
            auto_apply: self.auto_apply,
            apply_on_startup: self.apply_on_startup,
            icon_color: self.icon_color,
            settings: PointerSettings {
                speed: self.speed,
                enhance_pointer_precision: self.enhance_pointer_precision,
                scroll_lines: self.scroll_lines,
                scroll_chars: self.scroll_chars,
                swap_buttons: self.swap_buttons,
                double_click_time_ms: self.double_click_time_ms,
            },
        })
    }
}

impl From<&DeviceProfile> for DeviceEntry {
    fn from(p: &DeviceProfile) -> Self {
        Self {
            name: p.name.clone(),
            device_path: p.device_path.as_str().to_string(),
            enabled: p.enabled,
            auto_apply: p.auto_apply,
            apply_on_startup: p.apply_on_startup,
            speed: p.settings.speed,
            enhance_pointer_precision: p.settings.enhance_pointer_precision,
            scroll_lines: p.settings.scroll_lines,
            scroll_chars: p.settings.scroll_chars,
            swap_buttons: p.settings.swap_buttons,
            double_click_time_ms: p.settings.double_click_time_ms,
            icon_color: p.icon_color,
        }
    }
}

impl AppConfig {
    /// Every well-formed device entry as a profile, in file order.
    pub fn profiles(&self) -> Vec<DeviceProfile> {
        self.devices.iter().filter_map(DeviceEntry::to_profile).collect()
    }

    pub fn set_profiles(&mut self, profiles: &[DeviceProfile]) {
        self.devices = profiles.iter().map(DeviceEntry::from).collect();
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_min_switch_interval_ms() -> u64 {
    MIN_SWITCH_INTERVAL.as_millis() as u64
}
fn default_true() -> bool {
    true
}
fn default_speed() -> u32 {
    DEFAULT_SPEED
}
fn default_enhance_pointer_precision() -> bool {
    DEFAULT_ENHANCE_POINTER_PRECISION
}
fn default_scroll_lines() -> u32 {
    DEFAULT_SCROLL_LINES
}
fn default_scroll_chars() -> u32 {
    DEFAULT_SCROLL_CHARS
}
fn default_double_click_time_ms() -> u32 {
    DEFAULT_DOUBLE_CLICK_MS
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            min_switch_interval_ms: default_min_switch_interval_ms(),
            debounce_device_changes: default_true(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`.
///
/// Creates the config directory and file if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    // Ensure directory exists before writing.
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the application
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MultiMouseSwitcher"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("multimouseswitcher"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MultiMouseSwitcher")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── TomlProfileStore ──────────────────────────────────────────────────────────

/// [`ProfileStore`] backed by the TOML config file.
///
/// Lookups go to an in-memory [`ProfileRegistry`]; every write updates it and
/// rewrites the whole file, keeping the `[general]` section as loaded.
pub struct TomlProfileStore {
    path: PathBuf,
    config: RefCell<AppConfig>,
    registry: RefCell<ProfileRegistry>,
}

impl TomlProfileStore {
    /// Loads the file at `path` (a missing file is an empty configuration).
    ///
    /// # Errors
    ///
    /// Propagates [`load_config`] failures.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_config(&path)?;
        let registry = ProfileRegistry::new(config.profiles());
        debug!(path = %path.display(), profiles = registry.len(), "profiles loaded");
        Ok(Self {
            path,
            config: RefCell::new(config),
            registry: RefCell::new(registry),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `[general]` section as loaded.
    pub fn general(&self) -> GeneralConfig {
        self.config.borrow().general.clone()
    }

    /// Writes `registry` to disk and adopts it only once the write succeeded,
    /// so memory never runs ahead of the file.
    fn commit(&self, registry: ProfileRegistry) -> Result<(), StoreError> {
        let mut config = self.config.borrow().clone();
        config.set_profiles(registry.profiles());
        save_config(&self.path, &config).map_err(|e| StoreError::Backend(Box::new(e)))?;
        *self.config.borrow_mut() = config;
        *self.registry.borrow_mut() = registry;
        Ok(())
    }
}

impl ProfileStore for TomlProfileStore {
    fn find_by_device_path(&self, path: &DevicePath) -> Option<DeviceProfile> {
        self.registry.borrow().find_by_device_path(path).cloned()
    }

    fn all(&self) -> Vec<DeviceProfile> {
        self.registry.borrow().profiles().to_vec()
    }

    fn persist(&self, profile: &DeviceProfile) -> Result<(), StoreError> {
        let mut registry = self.registry.borrow().clone();
        registry.upsert(profile.clone());
        self.commit(registry)
    }

    fn save_all(&self, profiles: Vec<DeviceProfile>) -> Result<(), StoreError> {
        self.commit(ProfileRegistry::new(profiles))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
