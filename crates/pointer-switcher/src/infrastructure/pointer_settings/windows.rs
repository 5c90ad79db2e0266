//! Windows pointer backend built on `SystemParametersInfoW`.
//!
//! Writes pass `SPIF_SENDCHANGE` so running applications receive
//! `WM_SETTINGCHANGE`, but not `SPIF_UPDATEINIFILE`: profile switches happen
//! many times a day and do not belong in the user's persistent profile.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::ffi::c_void;

use windows::Win32::UI::Input::KeyboardAndMouse::GetDoubleClickTime;
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SystemParametersInfoW, SM_SWAPBUTTON, SPIF_SENDCHANGE, SPI_GETMOUSE,
    SPI_GETMOUSESPEED, SPI_GETWHEELSCROLLCHARS, SPI_GETWHEELSCROLLLINES, SPI_SETDOUBLECLICKTIME,
    SPI_SETMOUSE, SPI_SETMOUSEBUTTONSWAP, SPI_SETMOUSESPEED, SPI_SETWHEELSCROLLCHARS,
    SPI_SETWHEELSCROLLLINES, SYSTEM_PARAMETERS_INFO_ACTION, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
};

use crate::application::apply_settings::{PointerBackend, PointerError, PointerSetting};

/// `SPI_SETWHEELSCROLLLINES` value meaning "one screen per notch".
const WHEEL_PAGESCROLL: u32 = u32::MAX;

/// Stock acceleration thresholds, used when enabling precision finds none set.
const DEFAULT_ACCEL_THRESHOLDS: [i32; 2] = [6, 10];

/// `SPI_SETMOUSE` parameters for toggling "Enhance pointer precision".
///
/// Only the acceleration level changes; user-tuned thresholds are kept.
fn precision_params(current: [i32; 3], enabled: bool) -> [i32; 3] {
    let mut params = current;
    params[2] = i32::from(enabled);
    if enabled && params[..2] == [0, 0] {
        params[..2].copy_from_slice(&DEFAULT_ACCEL_THRESHOLDS);
    }
    params
}

/// Reads the `SPI_GETMOUSE` thresholds and acceleration level.
fn mouse_params(setting: PointerSetting) -> Result<[i32; 3], PointerError> {
    let mut params = [0i32; 3];
    // SAFETY: SPI_GETMOUSE writes three ints into `params`.
    unsafe {
        SystemParametersInfoW(
            SPI_GETMOUSE,
            0,
            Some(params.as_mut_ptr().cast()),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    }
    .map_err(|e| read_error(setting, e))?;
    Ok(params)
}

/// [`crate::application::apply_settings::PointerBackend`] for the Windows
/// global pointer configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPointerBackend;

fn read_error(setting: PointerSetting, e: windows::core::Error) -> PointerError {
    PointerError::Read {
        setting,
        reason: e.to_string(),
    }
}

fn write_error(setting: PointerSetting, e: windows::core::Error) -> PointerError {
    PointerError::Write {
        setting,
        reason: e.to_string(),
    }
}

/// Reads a `u32`-sized value through `pvParam`.
fn get_u32(action: SYSTEM_PARAMETERS_INFO_ACTION, setting: PointerSetting) -> Result<u32, PointerError> {
    let mut value: u32 = 0;
    // SAFETY: `value` is a valid out-pointer for every GET action used here.
    unsafe {
        SystemParametersInfoW(
            action,
            0,
            Some(&mut value as *mut u32 as *mut c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    }
    .map_err(|e| read_error(setting, e))?;
    Ok(value)
}

/// Writes a value passed in `uiParam`.
fn set_ui_param(
    action: SYSTEM_PARAMETERS_INFO_ACTION,
    value: u32,
    setting: PointerSetting,
) -> Result<(), PointerError> {
    // SAFETY: these SET actions read only `uiParam`.
    unsafe { SystemParametersInfoW(action, value, None, SPIF_SENDCHANGE) }
        .map_err(|e| write_error(setting, e))
}

impl PointerBackend for WindowsPointerBackend {
    fn speed(&self) -> Result<u32, PointerError> {
        get_u32(SPI_GETMOUSESPEED, PointerSetting::Speed)
    }

    fn set_speed(&self, speed: u32) -> Result<(), PointerError> {
        // SAFETY: SPI_SETMOUSESPEED takes the speed itself in `pvParam`.
        unsafe {
            SystemParametersInfoW(
                SPI_SETMOUSESPEED,
                0,
                Some(speed as usize as *mut c_void),
                SPIF_SENDCHANGE,
            )
        }
        .map_err(|e| write_error(PointerSetting::Speed, e))
    }

    fn enhance_pointer_precision(&self) -> Result<bool, PointerError> {
        let params = mouse_params(PointerSetting::EnhancePointerPrecision)?;
        Ok(params[2] != 0)
    }

    fn set_enhance_pointer_precision(&self, enabled: bool) -> Result<(), PointerError> {
        let current = mouse_params(PointerSetting::EnhancePointerPrecision)?;
        let mut params = precision_params(current, enabled);
        // SAFETY: SPI_SETMOUSE reads three ints from `params`.
        unsafe {
            SystemParametersInfoW(
                SPI_SETMOUSE,
                0,
                Some(params.as_mut_ptr().cast()),
                SPIF_SENDCHANGE,
            )
        }
        .map_err(|e| write_error(PointerSetting::EnhancePointerPrecision, e))
    }

    fn scroll_lines(&self) -> Result<u32, PointerError> {
        let lines = get_u32(SPI_GETWHEELSCROLLLINES, PointerSetting::ScrollLines)?;
        Ok(if lines == WHEEL_PAGESCROLL { 0 } else { lines })
    }

    fn set_scroll_lines(&self, lines: u32) -> Result<(), PointerError> {
        let value = if lines == 0 { WHEEL_PAGESCROLL } else { lines };
        set_ui_param(SPI_SETWHEELSCROLLLINES, value, PointerSetting::ScrollLines)
    }

    fn scroll_chars(&self) -> Result<u32, PointerError> {
        get_u32(SPI_GETWHEELSCROLLCHARS, PointerSetting::ScrollChars)
    }

    fn set_scroll_chars(&self, chars: u32) -> Result<(), PointerError> {
        set_ui_param(SPI_SETWHEELSCROLLCHARS, chars, PointerSetting::ScrollChars)
    }

    fn swap_buttons(&self) -> Result<bool, PointerError> {
        // SAFETY: GetSystemMetrics has no preconditions.
        Ok(unsafe { GetSystemMetrics(SM_SWAPBUTTON) } != 0)
    }

    fn set_swap_buttons(&self, swapped: bool) -> Result<(), PointerError> {
        set_ui_param(SPI_SETMOUSEBUTTONSWAP, u32::from(swapped), PointerSetting::SwapButtons)
    }

    fn double_click_time_ms(&self) -> Result<u32, PointerError> {
        // SAFETY: GetDoubleClickTime has no preconditions.
        Ok(unsafe { GetDoubleClickTime() })
    }

    fn set_double_click_time_ms(&self, ms: u32) -> Result<(), PointerError> {
        set_ui_param(SPI_SETDOUBLECLICKTIME, ms, PointerSetting::DoubleClickTime)
    }
}
