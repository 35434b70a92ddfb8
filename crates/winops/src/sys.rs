//! Win32 foreground window and GDI pixel reads.
use std::ffi::c_void;

use tracing::trace;
use windows::Win32::{
    Foundation::{COLORREF, HWND},
    Graphics::Gdi::{GetDC, GetPixel, ReleaseDC},
    UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW},
};

use crate::{Error, Result, Rgb, WindowSnapshot};

/// `GetPixel` result for points outside the clipping region.
const CLR_INVALID: u32 = 0xFFFF_FFFF;

pub(crate) fn foreground() -> WindowSnapshot {
    let hwnd = unsafe { GetForegroundWindow() };
    if hwnd.is_invalid() {
        return WindowSnapshot::default();
    }
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    let title = if len > 0 {
        let mut buf = vec![0u16; len as usize + 1];
        let n = unsafe { GetWindowTextW(hwnd, &mut buf) };
        String::from_utf16_lossy(&buf[..n.max(0) as usize])
    } else {
        String::new()
    };
    WindowSnapshot {
        title,
        handle: hwnd.0 as isize,
    }
}

pub(crate) fn pixel(window: &WindowSnapshot, x: i32, y: i32) -> Result<Rgb> {
    if window.handle == 0 {
        return Err(Error::NoWindow);
    }
    let hwnd = HWND(window.handle as *mut c_void);
    let hdc = unsafe { GetDC(hwnd) };
    if hdc.is_invalid() {
        return Err(Error::PixelRead { x, y });
    }
    let color: COLORREF = unsafe { GetPixel(hdc, x, y) };
    unsafe { ReleaseDC(hwnd, hdc) };
    if color.0 == CLR_INVALID {
        trace!(x, y, "pixel_out_of_clip");
        return Err(Error::PixelRead { x, y });
    }
    Ok(Rgb::from_colorref(color.0))
}
