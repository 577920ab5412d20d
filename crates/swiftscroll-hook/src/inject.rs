//! Synthetic wheel emission.
//!
//! Emitted pixel deltas are scaled into the `notches × 120` wheel-delta unit
//! applications expect: at 10 units per pixel, the default 12 px step totals
//! exactly one classic 120-unit notch per unaccelerated physical notch.

/// Wheel-delta units carried by one emitted pixel.
pub const WHEEL_UNITS_PER_PX: i32 = 10;

/// Extra-info word stamped on any input this process injects, so the
/// interception layer can reject its own output by marker as well as by the
/// OS injected flags. ASCII "SWSC".
pub const SYNTHETIC_WHEEL_MARK: usize = 0x5357_5343;

/// Scale an emitted pixel delta into wheel-delta units.
#[inline]
pub fn wheel_units(delta_px: i32) -> i32 {
    delta_px.saturating_mul(WHEEL_UNITS_PER_PX)
}

#[cfg(windows)]
pub use win32_emitter::Win32WheelEmitter;

#[cfg(windows)]
mod win32_emitter {
    use swiftscroll_core::{Axis, Error, Result, TargetWindow, WheelEmitter};
    use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorPos, IsWindow, PostMessageW, WM_MOUSEHWHEEL, WM_MOUSEWHEEL,
    };

    use super::wheel_units;

    /// Posts wheel messages straight to the window captured at notch time,
    /// which is what lets scrolling follow the hovered window rather than
    /// the focused one.
    pub struct Win32WheelEmitter;

    impl WheelEmitter for Win32WheelEmitter {
        fn emit(&self, axis: Axis, delta_px: i32, target: TargetWindow) -> Result<()> {
            let hwnd = HWND(target.0 as *mut core::ffi::c_void);
            unsafe {
                if !IsWindow(Some(hwnd)).as_bool() {
                    return Err(Error::InjectionFailed(format!(
                        "target window {:#x} is gone",
                        target.0
                    )));
                }
                let mut pt = windows::Win32::Foundation::POINT::default();
                let _ = GetCursorPos(&mut pt);

                let message = match axis {
                    Axis::Vertical => WM_MOUSEWHEEL,
                    Axis::Horizontal => WM_MOUSEHWHEEL,
                };
                let wparam = WPARAM((wheel_units(delta_px) as u16 as usize) << 16);
                let lparam = LPARAM((((pt.y as u32) << 16) | (pt.x as u32 & 0xFFFF)) as isize);
                PostMessageW(Some(hwnd), message, wparam, lparam)
                    .map_err(|e| Error::InjectionFailed(e.to_string()))?;
            }
            Ok(())
        }
    }
}
