//! Hook backend abstraction.
//!
//! The service talks to a [`MouseHookBackend`] so the Win32 hook can be
//! swapped for [`MockHookBackend`] in tests, which replays raw wheel events
//! through the same filter the real hook uses.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use swiftscroll_core::Result;

use crate::filter::{HookDecision, RawWheel, WheelFilter, WheelSink};

/// Installs and revokes the system-wide low-level mouse hook.
///
/// Both directions are idempotent: installing twice is one install,
/// uninstalling twice is one uninstall.
pub trait MouseHookBackend: Send + Sync {
    fn install(&self, filter: Arc<WheelFilter>, sink: Arc<dyn WheelSink>) -> Result<()>;
    fn uninstall(&self);
    fn is_installed(&self) -> bool;
}

/// Test backend: no OS hook, events are injected with [`simulate`].
///
/// [`simulate`]: MockHookBackend::simulate
#[derive(Default)]
pub struct MockHookBackend {
    installed: AtomicBool,
    install_count: AtomicUsize,
    uninstall_count: AtomicUsize,
    fail_install: AtomicBool,
    wiring: Mutex<Option<(Arc<WheelFilter>, Arc<dyn WheelSink>)>>,
}

impl MockHookBackend {
    pub fn failing() -> Self {
        let backend = Self::default();
        backend.fail_install.store(true, Ordering::SeqCst);
        backend
    }

    /// Replay one raw event through the installed filter, as the hook
    /// callback would. Forwards unconditionally while uninstalled.
    pub fn simulate(&self, raw: RawWheel) -> HookDecision {
        self.simulate_at(raw, Instant::now())
    }

    pub fn simulate_at(&self, raw: RawWheel, now: Instant) -> HookDecision {
        if !self.is_installed() {
            return HookDecision::Forward;
        }
        let wiring = self.wiring.lock().ok().and_then(|guard| guard.clone());
        match wiring {
            Some((filter, sink)) => filter.process(raw, now, sink.as_ref()),
            None => HookDecision::Forward,
        }
    }

    pub fn install_count(&self) -> usize {
        self.install_count.load(Ordering::SeqCst)
    }

    pub fn uninstall_count(&self) -> usize {
        self.uninstall_count.load(Ordering::SeqCst)
    }
}

impl MouseHookBackend for MockHookBackend {
    fn install(&self, filter: Arc<WheelFilter>, sink: Arc<dyn WheelSink>) -> Result<()> {
        if self.fail_install.load(Ordering::SeqCst) {
            return Err(swiftscroll_core::Error::HookInstallFailed(
                "mock backend configured to fail".into(),
            ));
        }
        if self.installed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.install_count.fetch_add(1, Ordering::SeqCst);
        filter.reset_caches();
        if let Ok(mut wiring) = self.wiring.lock() {
            *wiring = Some((filter, sink));
        }
        Ok(())
    }

    fn uninstall(&self) {
        if !self.installed.swap(false, Ordering::SeqCst) {
            return;
        }
        self.uninstall_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut wiring) = self.wiring.lock() {
            *wiring = None;
        }
    }

    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}
