//! Wheel event filtering.
//!
//! The decision core behind the low-level mouse hook: reject injected
//! events, pass taskbar scrolling through untouched, classify the axis, and
//! hand accepted notches to the [`WheelSink`]. The Win32 callback handles
//! only the raw parts (hook code, payload marshalling) and delegates every
//! decision here, which keeps the whole pipeline testable off-Windows.
//!
//! The hook fast path has to finish in well under a millisecond, so the two
//! system queries that would otherwise dominate are cached: Shift key state
//! for 50 ms and the shell-tray window handles for 2 s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use swiftscroll_core::TargetWindow;

use crate::inject::SYNTHETIC_WHEEL_MARK;
use crate::probes::{KeyStateProbe, ShellTrayProbe, WindowProbe};

/// How long a sampled Shift state is reused before re-querying.
pub const SHIFT_CACHE_TTL: Duration = Duration::from_millis(50);

/// How long the shell-tray handle lookup is reused.
pub const TRAY_CACHE_TTL: Duration = Duration::from_secs(2);

/// Which wheel message produced a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelKind {
    Vertical,
    Horizontal,
}

/// A marshalled low-level wheel event, before filtering.
#[derive(Debug, Clone, Copy)]
pub struct RawWheel {
    pub kind: WheelKind,
    /// Signed notch delta (±120 per detent).
    pub delta: i32,
    /// Cursor position in screen coordinates.
    pub x: i32,
    pub y: i32,
    /// OS injected / lower-integrity-injected flags.
    pub injected: bool,
    /// Extra-info word attached by the injecting process, if any.
    pub extra_info: usize,
}

/// What the hook callback should tell the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Forward the event up the hook chain unchanged.
    Forward,
    /// Swallow it; the engine owns this notch now.
    Swallow,
}

/// Receiver of accepted notches. Returning true marks the event handled,
/// which makes the filter swallow it from the hook chain.
pub trait WheelSink: Send + Sync {
    fn on_wheel(&self, delta: i32, x: i32, y: i32) -> bool;
    fn on_hwheel(&self, delta: i32, x: i32, y: i32) -> bool;
}

#[derive(Default)]
struct FilterCaches {
    shift: Option<(Instant, bool)>,
    tray: Option<(Instant, [Option<TargetWindow>; 2])>,
}

/// The interception decision core. One instance lives for the lifetime of
/// the hook; its caches are reset on every install.
pub struct WheelFilter {
    keys: Box<dyn KeyStateProbe>,
    tray: Box<dyn ShellTrayProbe>,
    windows: Box<dyn WindowProbe>,
    shift_key_horizontal: AtomicBool,
    caches: Mutex<FilterCaches>,
}

impl WheelFilter {
    pub fn new(
        keys: Box<dyn KeyStateProbe>,
        tray: Box<dyn ShellTrayProbe>,
        windows: Box<dyn WindowProbe>,
    ) -> Self {
        Self {
            keys,
            tray,
            windows,
            shift_key_horizontal: AtomicBool::new(true),
            caches: Mutex::new(FilterCaches::default()),
        }
    }

    /// Mirror of `AppSettings::shift_key_horizontal`, pushed down by the
    /// orchestrator on every settings change.
    pub fn set_shift_key_horizontal(&self, on: bool) {
        self.shift_key_horizontal.store(on, Ordering::Relaxed);
    }

    /// Drop cached system state. Called on hook install.
    pub fn reset_caches(&self) {
        if let Ok(mut caches) = self.caches.lock() {
            *caches = FilterCaches::default();
        }
    }

    /// Run the full filtering order for one marshalled event.
    pub fn process(&self, raw: RawWheel, now: Instant, sink: &dyn WheelSink) -> HookDecision {
        // Injected origin: the feedback-loop guard. The engine's own
        // synthetic stream must never re-enter the pipeline, and neither
        // should any other injector's.
        if raw.injected || raw.extra_info == SYNTHETIC_WHEEL_MARK {
            return HookDecision::Forward;
        }

        // Taskbar scrolling keeps its native behavior (virtual desktop
        // switching and the like).
        if self.over_taskbar(raw.x, raw.y, now) {
            return HookDecision::Forward;
        }

        let handled = match raw.kind {
            WheelKind::Vertical => {
                if self.shift_key_horizontal.load(Ordering::Relaxed) && self.shift_down(now) {
                    sink.on_hwheel(raw.delta, raw.x, raw.y)
                } else {
                    sink.on_wheel(raw.delta, raw.x, raw.y)
                }
            }
            WheelKind::Horizontal => sink.on_hwheel(raw.delta, raw.x, raw.y),
        };

        if handled {
            HookDecision::Swallow
        } else {
            HookDecision::Forward
        }
    }

    fn shift_down(&self, now: Instant) -> bool {
        let Ok(mut caches) = self.caches.lock() else {
            return self.keys.shift_down();
        };
        if let Some((sampled, state)) = caches.shift {
            if now.saturating_duration_since(sampled) < SHIFT_CACHE_TTL {
                return state;
            }
        }
        let state = self.keys.shift_down();
        caches.shift = Some((now, state));
        state
    }

    fn over_taskbar(&self, x: i32, y: i32, now: Instant) -> bool {
        let Some(window) = self.windows.window_at(x, y) else {
            return false;
        };
        let Ok(mut caches) = self.caches.lock() else {
            return false;
        };
        let handles = match caches.tray {
            Some((looked_up, handles))
                if now.saturating_duration_since(looked_up) < TRAY_CACHE_TTL =>
            {
                handles
            }
            _ => {
                let handles = self.tray.tray_windows();
                caches.tray = Some((now, handles));
                handles
            }
        };
        handles.iter().any(|h| *h == Some(window))
    }
}
