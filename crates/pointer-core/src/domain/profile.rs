//! Device profiles and the pointer settings they carry.
//!
//! A [`DeviceProfile`] binds one physical pointing device (identified by its
//! raw-input [`DevicePath`]) to the global pointer configuration the user wants
//! while that device is in use.
//!
//! # Why clamp instead of reject? (for beginners)
//!
//! Profile values arrive from several places: the TOML config file (which the
//! user may hand-edit), the CLI, and quick-switch speed menus.  The operating
//! system only accepts a narrow range for each setting, but refusing to switch
//! devices because one number is off would be worse for the user than using a
//! sensible value.  Every numeric field therefore goes through [`clamp_or`]:
//! in-range values pass through untouched, anything else is replaced by a
//! fallback chosen by the caller.
//!
//! # Case-insensitive device paths
//!
//! Windows reports raw-input device paths such as
//! `\\?\HID#VID_046D&PID_C539&MI_01&Col01#8&10c9e4b2&0&0000#{378de44c-...}`.
//! The same device may be reported with different letter casing depending on
//! the API used, so [`DevicePath`] compares and hashes on an ASCII-folded copy
//! while keeping the original text for display and persistence.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Value ranges and fallbacks ────────────────────────────────────────────────

/// Valid pointer speeds (Control Panel's slider has 20 notches).
pub const SPEED_RANGE: RangeInclusive<u32> = 1..=20;
/// Valid wheel scroll granularity.  `0` means "one page/screen per notch".
pub const SCROLL_RANGE: RangeInclusive<u32> = 0..=100;
/// Valid double-click intervals in milliseconds.
pub const DOUBLE_CLICK_RANGE_MS: RangeInclusive<u32> = 200..=900;

pub const DEFAULT_SPEED: u32 = 10;
pub const DEFAULT_ENHANCE_POINTER_PRECISION: bool = true;
pub const DEFAULT_SCROLL_LINES: u32 = 3;
pub const DEFAULT_SCROLL_CHARS: u32 = 3;
pub const DEFAULT_SWAP_BUTTONS: bool = false;
pub const DEFAULT_DOUBLE_CLICK_MS: u32 = 500;

/// Returns `value` when it lies inside `range`, otherwise `fallback`.
///
/// The fallback itself is pulled into `range` so the result always satisfies
/// the range invariant, even when a caller passes a stale fallback.
///
/// ```
/// use pointer_core::domain::profile::{clamp_or, SPEED_RANGE};
///
/// assert_eq!(clamp_or(15, SPEED_RANGE, 10), 15);
/// assert_eq!(clamp_or(0, SPEED_RANGE, 10), 10);
/// assert_eq!(clamp_or(-3, SPEED_RANGE, 10), 10);
/// ```
pub fn clamp_or(value: i64, range: RangeInclusive<u32>, fallback: u32) -> u32 {
    let (min, max) = (*range.start(), *range.end());
    if value >= i64::from(min) && value <= i64::from(max) {
        value as u32
    } else {
        fallback.clamp(min, max)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Validation errors for profile fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("device path must not be empty")]
    EmptyDevicePath,
    #[error("profile name must not be empty")]
    EmptyName,
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("invalid colour {0:?}: expected #RRGGBB")]
    InvalidColor(String),
}

// ── DevicePath ────────────────────────────────────────────────────────────────

/// Stable OS-assigned identifier of one physical input device.
///
/// Equality and hashing ignore ASCII case.
#[derive(Clone)]
pub struct DevicePath {
    raw: String,
    folded: String,
}

impl DevicePath {
    /// Creates a device path from `raw`, trimming surrounding whitespace and
    /// any trailing NUL terminators left by wide-string OS buffers.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::EmptyDevicePath`] if nothing is left after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProfileError> {
        let trimmed = raw.as_ref().trim_end_matches('\0').trim();
        if trimmed.is_empty() {
            return Err(ProfileError::EmptyDevicePath);
        }
        Ok(Self {
            raw: trimmed.to_string(),
            folded: trimmed.to_ascii_lowercase(),
        })
    }

    /// The path as originally reported.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for DevicePath {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for DevicePath {}

impl Hash for DevicePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl fmt::Debug for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DevicePath").field(&self.raw).finish()
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DevicePath {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DevicePath {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DevicePath> for String {
    fn from(path: DevicePath) -> Self {
        path.raw
    }
}

impl Serialize for DevicePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for DevicePath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

// ── IconColor ─────────────────────────────────────────────────────────────────

/// Tray icon colour for a profile.  Presentation-only; the engine just
/// forwards it to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl IconColor {
    pub const STEEL_BLUE: Self = Self::rgb(0x46, 0x82, 0xB4);
    pub const FOREST_GREEN: Self = Self::rgb(0x22, 0x8B, 0x22);
    pub const ORANGE_RED: Self = Self::rgb(0xFF, 0x45, 0x00);
    pub const SLATE_BLUE: Self = Self::rgb(0x6A, 0x5A, 0xCD);
    pub const DARK_CYAN: Self = Self::rgb(0x00, 0x8B, 0x8B);
    pub const GOLDENROD: Self = Self::rgb(0xDA, 0xA5, 0x20);
    pub const CRIMSON: Self = Self::rgb(0xDC, 0x14, 0x3C);
    pub const TEAL: Self = Self::rgb(0x00, 0x80, 0x80);
    pub const GRAY: Self = Self::rgb(0x80, 0x80, 0x80);

    /// Colours handed out to new profiles, in order.
    pub const PALETTE: [Self; 8] = [
        Self::STEEL_BLUE,
        Self::FOREST_GREEN,
        Self::ORANGE_RED,
        Self::SLATE_BLUE,
        Self::DARK_CYAN,
        Self::GOLDENROD,
        Self::CRIMSON,
        Self::TEAL,
    ];

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB` form used in the config file.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for IconColor {
    fn default() -> Self {
        Self::GRAY
    }
}

impl fmt::Display for IconColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for IconColor {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProfileError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for IconColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IconColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── PointerSettings ───────────────────────────────────────────────────────────

/// The OS-facing part of a profile: everything that is pushed to the global
/// pointer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerSettings {
    pub speed: u32,
    pub enhance_pointer_precision: bool,
    pub scroll_lines: u32,
    pub scroll_chars: u32,
    pub swap_buttons: bool,
    pub double_click_time_ms: u32,
}

impl PointerSettings {
    /// Returns a copy with every numeric field inside its valid range.
    ///
    /// Out-of-range fields take the corresponding value from `fallback`.
    pub fn clamped(&self, fallback: &PointerSettings) -> PointerSettings {
        PointerSettings {
            speed: clamp_or(self.speed.into(), SPEED_RANGE, fallback.speed),
            enhance_pointer_precision: self.enhance_pointer_precision,
            scroll_lines: clamp_or(self.scroll_lines.into(), SCROLL_RANGE, fallback.scroll_lines),
            scroll_chars: clamp_or(self.scroll_chars.into(), SCROLL_RANGE, fallback.scroll_chars),
            swap_buttons: self.swap_buttons,
            double_click_time_ms: clamp_or(
                self.double_click_time_ms.into(),
                DOUBLE_CLICK_RANGE_MS,
                fallback.double_click_time_ms,
            ),
        }
    }

    /// Checks every numeric field against its range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProfileError::OutOfRange`] encountered.
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_range("speed", self.speed, SPEED_RANGE)?;
        check_range("scroll_lines", self.scroll_lines, SCROLL_RANGE)?;
        check_range("scroll_chars", self.scroll_chars, SCROLL_RANGE)?;
        check_range(
            "double_click_time_ms",
            self.double_click_time_ms,
            DOUBLE_CLICK_RANGE_MS,
        )
    }
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            enhance_pointer_precision: DEFAULT_ENHANCE_POINTER_PRECISION,
            scroll_lines: DEFAULT_SCROLL_LINES,
            scroll_chars: DEFAULT_SCROLL_CHARS,
            swap_buttons: DEFAULT_SWAP_BUTTONS,
            double_click_time_ms: DEFAULT_DOUBLE_CLICK_MS,
        }
    }
}

fn check_range(field: &'static str, value: u32, range: RangeInclusive<u32>) -> Result<(), ProfileError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ProfileError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

// ── AppliedSettings ───────────────────────────────────────────────────────────

/// Snapshot of what was last pushed to the OS and which device it came from.
///
/// Two snapshots are equal iff every field matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSettings {
    pub device_key: DevicePath,
    pub settings: PointerSettings,
}

// ── DeviceProfile ─────────────────────────────────────────────────────────────

/// One physical pointing device's desired configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Display label shown in the tray and CLI.
    pub name: String,
    /// Natural key used for lookup.
    pub device_path: DevicePath,
    /// Whether this profile may ever be applied.
    pub enabled: bool,
    /// Whether motion from this device triggers automatic switching.
    pub auto_apply: bool,
    /// Whether this profile is pushed once when the process starts.
    pub apply_on_startup: bool,
    pub icon_color: IconColor,
    pub settings: PointerSettings,
}

impl DeviceProfile {
    /// Creates an enabled, auto-applying profile with default settings.
    pub fn new(name: impl Into<String>, device_path: DevicePath) -> Self {
        Self {
            name: name.into(),
            device_path,
            enabled: true,
            auto_apply: true,
            apply_on_startup: false,
            icon_color: IconColor::default(),
            settings: PointerSettings::default(),
        }
    }

    /// Builder-style setter for the pointer speed.
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.settings.speed = speed;
        self
    }

    /// Builder-style setter for the whole settings block.
    pub fn with_settings(mut self, settings: PointerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Checks the name and every numeric setting.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::EmptyName`] or the first out-of-range field.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        self.settings.validate()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
