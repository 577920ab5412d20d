//! System-query seams.
//!
//! The interception layer and the orchestrator never call Win32 directly;
//! they go through these traits so the whole pipeline can be exercised in
//! tests with canned answers.

use swiftscroll_core::TargetWindow;

/// Modifier key state, sampled through the hook layer's timed cache.
pub trait KeyStateProbe: Send + Sync {
    fn shift_down(&self) -> bool;
}

/// Lookup of the primary and secondary shell-tray windows.
pub trait ShellTrayProbe: Send + Sync {
    fn tray_windows(&self) -> [Option<TargetWindow>; 2];
}

/// Window under a screen point.
pub trait WindowProbe: Send + Sync {
    fn window_at(&self, x: i32, y: i32) -> Option<TargetWindow>;
}

/// Image-file stem (lowercase, no extension) of a window's owning process.
pub trait ProcessProbe: Send + Sync {
    fn process_of(&self, window: TargetWindow) -> Option<String>;
}
