pub mod autostart;
pub mod backend;
pub mod filter;
pub mod inject;
pub mod probes;
pub mod service;
#[cfg(windows)]
pub mod win32;

pub use backend::{MockHookBackend, MouseHookBackend};
pub use filter::{HookDecision, RawWheel, WheelFilter, WheelKind, WheelSink};
pub use service::ScrollService;
#[cfg(windows)]
pub use win32::{Win32HookBackend, Win32KeyProbe, Win32TrayProbe, Win32WindowProbe};
