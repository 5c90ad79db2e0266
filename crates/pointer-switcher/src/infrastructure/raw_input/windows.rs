//! Windows raw-input implementation.
//!
//! Creates a message-only window (`HWND_MESSAGE`), registers it for the
//! generic-desktop mouse usage with `RIDEV_INPUTSINK | RIDEV_DEVNOTIFY`, and
//! runs the `GetMessageW` loop on the calling thread.  `WM_INPUT` and
//! `WM_INPUT_DEVICE_CHANGE` are intercepted in the loop itself, before
//! dispatch, so the handler closure can borrow local state and no global
//! sender is needed.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use std::mem::size_of;
use std::ops::ControlFlow;

use pointer_core::{DeviceHandle, RawDeviceKind, RawMotion};
use tracing::{debug, trace};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{GetLastError, HANDLE, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::{
    GetRawInputData, GetRawInputDeviceInfoW, RegisterRawInputDevices, HRAWINPUT, RAWINPUT,
    RAWINPUTDEVICE, RAWINPUTHEADER, RIDEV_DEVNOTIFY, RIDEV_INPUTSINK, RIDI_DEVICENAME, RID_INPUT,
    RIM_TYPEKEYBOARD, RIM_TYPEMOUSE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostQuitMessage, RegisterClassW, UnregisterClassW, HWND_MESSAGE, MSG, WINDOW_EX_STYLE,
    WINDOW_STYLE, WM_DESTROY, WM_INPUT, WNDCLASSW,
};

use super::{MotionSource, RawInputError, SourceEvent};
use crate::application::resolve_device::DevicePathQuery;

const WINDOW_CLASS: PCWSTR = w!("MultiMouseSwitcherRawInput");
const WM_INPUT_DEVICE_CHANGE: u32 = 0x00FE;
const GIDC_REMOVAL: usize = 2;
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;
const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_MOUSE: u16 = 0x02;

/// Hidden window receiving `WM_INPUT` for every attached mouse.
///
/// Dropping it destroys the window and unregisters the window class.
pub struct RawInputWindow {
    hwnd: HWND,
    instance: HINSTANCE,
}

impl RawInputWindow {
    /// Creates the window and registers it for raw mouse input.
    ///
    /// # Errors
    ///
    /// [`RawInputError::WindowCreation`] or [`RawInputError::Registration`].
    pub fn create() -> Result<Self, RawInputError> {
        // SAFETY: GetModuleHandleW(None) returns the handle of the running
        // executable and has no preconditions.
        let module = unsafe { GetModuleHandleW(None) }
            .map_err(|e| RawInputError::WindowCreation(e.to_string()))?;
        let instance = HINSTANCE(module.0);

        let class = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: WINDOW_CLASS,
            ..Default::default()
        };
        // SAFETY: `class` is fully initialised and WINDOW_CLASS is a static
        // NUL-terminated wide string.
        if unsafe { RegisterClassW(&class) } == 0 {
            // SAFETY: reads the calling thread's last-error value.
            let error = unsafe { GetLastError() };
            if error.0 != ERROR_CLASS_ALREADY_EXISTS {
                return Err(RawInputError::WindowCreation(format!(
                    "RegisterClassW failed: {error:?}"
                )));
            }
        }

        // SAFETY: the class was registered above; HWND_MESSAGE makes this a
        // message-only window that is never shown.
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                WINDOW_CLASS,
                w!("Multi-Mouse Switcher"),
                WINDOW_STYLE(0),
                0,
                0,
                0,
                0,
                Some(HWND_MESSAGE),
                None,
                Some(instance),
                None,
            )
        }
        .map_err(|e| RawInputError::WindowCreation(e.to_string()))?;

        let window = Self { hwnd, instance };
        window.register_mouse()?;
        debug!("raw-input window created");
        Ok(window)
    }

    fn register_mouse(&self) -> Result<(), RawInputError> {
        let devices = [RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: RIDEV_INPUTSINK | RIDEV_DEVNOTIFY,
            hwndTarget: self.hwnd,
        }];
        // SAFETY: `devices` outlives the call and cbsize matches its element type.
        unsafe { RegisterRawInputDevices(&devices, size_of::<RAWINPUTDEVICE>() as u32) }
            .map_err(|e| RawInputError::Registration(e.to_string()))
    }
}

impl MotionSource for RawInputWindow {
    fn run(
        &mut self,
        handler: &mut dyn FnMut(SourceEvent) -> ControlFlow<()>,
    ) -> Result<(), RawInputError> {
        let mut msg = MSG::default();
        loop {
            // SAFETY: standard Win32 GetMessage loop on the thread that owns
            // the window.
            let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            if result.0 == 0 || result.0 == -1 {
                break;
            }

            let event = if msg.hwnd == self.hwnd {
                match msg.message {
                    WM_INPUT => read_motion(msg.lParam).map(SourceEvent::Motion),
                    WM_INPUT_DEVICE_CHANGE if msg.wParam.0 == GIDC_REMOVAL => {
                        Some(SourceEvent::DeviceRemoved(DeviceHandle(msg.lParam.0)))
                    }
                    _ => None,
                }
            } else {
                None
            };

            // SAFETY: DefWindowProcW must still see WM_INPUT to release the
            // raw-input buffer.
            unsafe { DispatchMessageW(&msg) };

            if let Some(event) = event {
                if handler(event).is_break() {
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Drop for RawInputWindow {
    fn drop(&mut self) {
        // SAFETY: the window and class were created by `create` and are
        // destroyed exactly once here.
        unsafe {
            let _ = DestroyWindow(self.hwnd);
            let _ = UnregisterClassW(WINDOW_CLASS, Some(self.instance));
        }
    }
}

/// Window procedure; all interesting messages are handled in the loop.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if msg == WM_DESTROY {
        // SAFETY: posts WM_QUIT to the calling thread's queue.
        unsafe { PostQuitMessage(0) };
        return LRESULT(0);
    }
    // SAFETY: forwards unhandled messages to the default procedure.
    unsafe { DefWindowProcW(hwnd, msg, w_param, l_param) }
}

/// Decodes a `WM_INPUT` payload.
fn read_motion(l_param: LPARAM) -> Option<RawMotion> {
    let mut raw = RAWINPUT::default();
    let mut size = size_of::<RAWINPUT>() as u32;
    // SAFETY: `raw` provides `size` writable bytes; l_param is the HRAWINPUT of
    // the WM_INPUT message currently being processed.
    let copied = unsafe {
        GetRawInputData(
            HRAWINPUT(l_param.0 as *mut c_void),
            RID_INPUT,
            Some(&mut raw as *mut RAWINPUT as *mut c_void),
            &mut size,
            size_of::<RAWINPUTHEADER>() as u32,
        )
    };
    if copied == u32::MAX || copied == 0 {
        trace!("GetRawInputData failed");
        return None;
    }

    let kind = match raw.header.dwType {
        t if t == RIM_TYPEMOUSE.0 => RawDeviceKind::Mouse,
        t if t == RIM_TYPEKEYBOARD.0 => RawDeviceKind::Keyboard,
        _ => RawDeviceKind::Hid,
    };
    let (last_x, last_y) = if kind == RawDeviceKind::Mouse {
        // SAFETY: dwType says the union holds a RAWMOUSE.
        unsafe { (raw.data.mouse.lLastX, raw.data.mouse.lLastY) }
    } else {
        (0, 0)
    };
    Some(RawMotion {
        kind,
        device: DeviceHandle(raw.header.hDevice.0 as isize),
        last_x,
        last_y,
    })
}

// ── Device path lookup ────────────────────────────────────────────────────────

/// [`DevicePathQuery`] calling `GetRawInputDeviceInfoW(RIDI_DEVICENAME)`.
pub struct RawInputDevicePathQuery;

impl DevicePathQuery for RawInputDevicePathQuery {
    fn device_path(&self, device: DeviceHandle) -> Option<String> {
        let handle = HANDLE(device.0 as *mut c_void);
        let mut len = 0u32;
        // SAFETY: size query; no buffer is written.
        let result = unsafe { GetRawInputDeviceInfoW(Some(handle), RIDI_DEVICENAME, None, &mut len) };
        if result != 0 || len == 0 {
            return None;
        }

        // RIDI_DEVICENAME reports its size in characters, not bytes.
        let mut buffer = vec![0u16; len as usize];
        // SAFETY: `buffer` holds `len` UTF-16 units as requested above.
        let result = unsafe {
            GetRawInputDeviceInfoW(
                Some(handle),
                RIDI_DEVICENAME,
                Some(buffer.as_mut_ptr().cast()),
                &mut len,
            )
        };
        if result == u32::MAX {
            return None;
        }
        let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Some(String::from_utf16_lossy(&buffer[..end]))
    }
}
