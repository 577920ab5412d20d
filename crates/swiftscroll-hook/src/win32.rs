//! Win32 implementations of the hook backend and the system probes.
//!
//! The low-level mouse hook runs on its own thread with a message pump;
//! the callback marshals the payload, delegates every decision to the
//! shared [`WheelFilter`], and must never let a panic cross into the OS
//! message dispatcher.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::{error, warn};

use swiftscroll_core::{Error, Result, TargetWindow};

use crate::filter::{HookDecision, RawWheel, WheelFilter, WheelKind, WheelSink};
use crate::probes::{KeyStateProbe, ProcessProbe, ShellTrayProbe, WindowProbe};
use crate::MouseHookBackend;

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{CloseHandle, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::Threading::{
    GetCurrentThreadId, OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_SHIFT};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, FindWindowW, GetAncestor, GetMessageW,
    GetWindowThreadProcessId, PostThreadMessageW, SetWindowsHookExW, TranslateMessage,
    UnhookWindowsHookEx, WindowFromPoint, GA_ROOT, HC_ACTION, LLMHF_INJECTED,
    LLMHF_LOWER_IL_INJECTED, MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL, WM_MOUSEHWHEEL, WM_MOUSEWHEEL,
    WM_QUIT,
};

struct HookWiring {
    filter: Arc<WheelFilter>,
    sink: Arc<dyn WheelSink>,
}

static HOOK_WIRING: OnceCell<Mutex<Option<HookWiring>>> = OnceCell::new();

fn wiring_cell() -> &'static Mutex<Option<HookWiring>> {
    HOOK_WIRING.get_or_init(|| Mutex::new(None))
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        if code != HC_ACTION as i32 {
            return CallNextHookEx(None, code, wparam, lparam);
        }
        let message = wparam.0 as u32;
        if message != WM_MOUSEWHEEL && message != WM_MOUSEHWHEEL {
            return CallNextHookEx(None, code, wparam, lparam);
        }
        // Defensive marshal: a null payload forwards unchanged.
        if lparam.0 == 0 {
            return CallNextHookEx(None, code, wparam, lparam);
        }
        let data = &*(lparam.0 as *const MSLLHOOKSTRUCT);

        let wiring = match wiring_cell().try_lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|w| (Arc::clone(&w.filter), Arc::clone(&w.sink))),
            Err(_) => None,
        };
        let Some((filter, sink)) = wiring else {
            return CallNextHookEx(None, code, wparam, lparam);
        };

        let raw = RawWheel {
            kind: if message == WM_MOUSEWHEEL {
                WheelKind::Vertical
            } else {
                WheelKind::Horizontal
            },
            delta: ((data.mouseData >> 16) as u16 as i16) as i32,
            x: data.pt.x,
            y: data.pt.y,
            injected: data.flags & (LLMHF_INJECTED | LLMHF_LOWER_IL_INJECTED) != 0,
            extra_info: data.dwExtraInfo,
        };

        match filter.process(raw, Instant::now(), sink.as_ref()) {
            HookDecision::Swallow => LRESULT(1),
            HookDecision::Forward => CallNextHookEx(None, code, wparam, lparam),
        }
    }));

    match result {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(error = %message, "wheel hook panicked");
            CallNextHookEx(None, code, wparam, lparam)
        }
    }
}

/// The real WH_MOUSE_LL backend. Owns the hook thread.
#[derive(Default)]
pub struct Win32HookBackend {
    installed: AtomicBool,
    thread_id: Arc<AtomicUsize>,
    handle: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl MouseHookBackend for Win32HookBackend {
    fn install(&self, filter: Arc<WheelFilter>, sink: Arc<dyn WheelSink>) -> Result<()> {
        if self.installed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        filter.reset_caches();
        if let Ok(mut wiring) = wiring_cell().lock() {
            *wiring = Some(HookWiring { filter, sink });
        }

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<std::result::Result<(), String>>();
        let thread_id = Arc::clone(&self.thread_id);
        let handle = std::thread::spawn(move || {
            let hook = unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(hook_proc), None, 0) };
            let hook = match hook {
                Ok(hook) => {
                    thread_id.store(unsafe { GetCurrentThreadId() } as usize, Ordering::SeqCst);
                    let _ = ready_tx.send(Ok(()));
                    hook
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            let mut msg = MSG::default();
            loop {
                let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
                if result.0 == -1 || result.0 == 0 || msg.message == WM_QUIT {
                    break;
                }
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            unsafe {
                let _ = UnhookWindowsHookEx(hook);
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                if let Ok(mut guard) = self.handle.lock() {
                    *guard = Some(handle);
                }
                Ok(())
            }
            Ok(Err(reason)) => {
                self.teardown_wiring();
                let _ = handle.join();
                Err(Error::HookInstallFailed(reason))
            }
            Err(_) => {
                self.teardown_wiring();
                Err(Error::HookInstallFailed("hook thread died".into()))
            }
        }
    }

    fn uninstall(&self) {
        if !self.installed.swap(false, Ordering::SeqCst) {
            return;
        }
        let thread_id = self.thread_id.load(Ordering::SeqCst) as u32;
        if thread_id != 0 {
            unsafe {
                let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
        }
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
        if let Ok(mut wiring) = wiring_cell().lock() {
            *wiring = None;
        }
    }

    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}

impl Win32HookBackend {
    fn teardown_wiring(&self) {
        self.installed.store(false, Ordering::SeqCst);
        if let Ok(mut wiring) = wiring_cell().lock() {
            *wiring = None;
        }
    }
}

/// `GetAsyncKeyState`-based Shift probe. The filter caches the answer.
pub struct Win32KeyProbe;

impl KeyStateProbe for Win32KeyProbe {
    fn shift_down(&self) -> bool {
        unsafe { (GetAsyncKeyState(VK_SHIFT.0 as i32) as u16 & 0x8000) != 0 }
    }
}

/// Shell-tray class-name lookup, primary and secondary monitors.
pub struct Win32TrayProbe;

impl ShellTrayProbe for Win32TrayProbe {
    fn tray_windows(&self) -> [Option<TargetWindow>; 2] {
        unsafe {
            [
                FindWindowW(w!("Shell_TrayWnd"), PCWSTR::null())
                    .ok()
                    .map(to_target),
                FindWindowW(w!("Shell_SecondaryTrayWnd"), PCWSTR::null())
                    .ok()
                    .map(to_target),
            ]
        }
    }
}

/// Point-to-window and window-to-process resolution.
pub struct Win32WindowProbe;

impl WindowProbe for Win32WindowProbe {
    fn window_at(&self, x: i32, y: i32) -> Option<TargetWindow> {
        let hwnd = unsafe { WindowFromPoint(POINT { x, y }) };
        if hwnd.is_invalid() {
            None
        } else {
            Some(to_target(hwnd))
        }
    }
}

impl ProcessProbe for Win32WindowProbe {
    fn process_of(&self, window: TargetWindow) -> Option<String> {
        let hwnd = HWND(window.0 as *mut core::ffi::c_void);
        unsafe {
            let root = GetAncestor(hwnd, GA_ROOT);
            let hwnd = if root.is_invalid() { hwnd } else { root };

            let mut pid = 0u32;
            if GetWindowThreadProcessId(hwnd, Some(&mut pid)) == 0 || pid == 0 {
                return None;
            }
            let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
            let mut buf = [0u16; 1024];
            let mut len = buf.len() as u32;
            let queried = QueryFullProcessImageNameW(
                process,
                PROCESS_NAME_WIN32,
                windows::core::PWSTR(buf.as_mut_ptr()),
                &mut len,
            );
            let _ = CloseHandle(process);
            if queried.is_err() {
                warn!(pid, "could not query process image name");
                return None;
            }
            let path = String::from_utf16_lossy(&buf[..len as usize]);
            image_stem(&path)
        }
    }
}

fn to_target(hwnd: HWND) -> TargetWindow {
    TargetWindow(hwnd.0 as isize)
}

/// Lowercase image-file stem: `C:\Tools\Notepad.EXE` → `notepad`.
fn image_stem(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_lowercase)
}
