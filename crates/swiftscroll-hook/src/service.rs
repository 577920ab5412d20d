//! The orchestrating service.
//!
//! Wires the hook backend, the interception filter, the parameter resolver,
//! and the scroll engine together, and owns every lifecycle transition: the
//! hook and the engine start and stop as a pair on the master enable flag.
//!
//! Settings live behind a mutex as an immutable snapshot; the hook callback
//! holds the lock only long enough to clone the `Arc`. The parameters for a
//! notch are resolved on the hook thread and travel with the notch itself,
//! so a profile switch between two quick notches can never retro-apply the
//! later profile to the earlier notch.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use swiftscroll_core::{
    resolve, AppSettings, Axis, EngineHandle, Error, NotchEvent, Result, ScrollEngine,
    WheelEmitter,
};

use crate::backend::MouseHookBackend;
use crate::filter::{WheelFilter, WheelSink};
use crate::probes::{ProcessProbe, WindowProbe};

struct EngineRuntime {
    handle: EngineHandle,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

pub struct ScrollService {
    settings: Mutex<Arc<AppSettings>>,
    hook: Arc<dyn MouseHookBackend>,
    filter: Arc<WheelFilter>,
    windows: Arc<dyn WindowProbe>,
    processes: Arc<dyn ProcessProbe>,
    emitter: Arc<dyn WheelEmitter>,
    runtime: Mutex<Option<EngineRuntime>>,
}

impl ScrollService {
    pub fn new(
        mut settings: AppSettings,
        hook: Arc<dyn MouseHookBackend>,
        filter: Arc<WheelFilter>,
        windows: Arc<dyn WindowProbe>,
        processes: Arc<dyn ProcessProbe>,
        emitter: Arc<dyn WheelEmitter>,
    ) -> Arc<Self> {
        settings.normalize();
        filter.set_shift_key_horizontal(settings.shift_key_horizontal);
        Arc::new(Self {
            settings: Mutex::new(Arc::new(settings)),
            hook,
            filter,
            windows,
            processes,
            emitter,
            runtime: Mutex::new(None),
        })
    }

    /// Start the engine and install the hook. A refused hook registration is
    /// non-fatal for the process: the engine is torn down again and the
    /// caller decides whether to keep running without smooth scrolling.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let settings = self.snapshot();
        if !settings.enabled {
            info!("smooth scrolling disabled in settings");
            return Ok(());
        }
        self.start_engine();
        let sink: Arc<dyn WheelSink> = Arc::clone(self) as Arc<dyn WheelSink>;
        if let Err(e) = self.hook.install(Arc::clone(&self.filter), sink) {
            self.shutdown_engine();
            return Err(e);
        }
        info!("wheel interception active");
        Ok(())
    }

    /// Uninstall the hook, then stop the engine. New notches stop arriving
    /// immediately; in-flight animations are discarded without emitting
    /// their remainder.
    pub async fn stop(&self) {
        self.hook.uninstall();
        let runtime = match self.runtime.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(runtime) = runtime {
            let _ = runtime.shutdown.send(true);
            let _ = runtime.task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.hook.is_installed()
    }

    /// Replace the settings snapshot, re-propagate the Shift-horizontal flag,
    /// and follow the master enable flag. Notches resolved after this call
    /// see the new snapshot; in-flight animations keep their captured
    /// parameters.
    pub async fn update_settings(self: &Arc<Self>, mut settings: AppSettings) {
        settings.normalize();
        let was_enabled = self.snapshot().enabled;
        self.filter
            .set_shift_key_horizontal(settings.shift_key_horizontal);

        let snapshot = Arc::new(settings);
        if let Ok(mut guard) = self.settings.lock() {
            *guard = Arc::clone(&snapshot);
        }

        match (was_enabled, snapshot.enabled) {
            (false, true) => {
                if let Err(e) = self.start() {
                    warn!("{e}; continuing without smooth scrolling");
                }
            }
            (true, false) => self.stop().await,
            _ => {}
        }
    }

    pub fn snapshot(&self) -> Arc<AppSettings> {
        match self.settings.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn start_engine(&self) {
        let Ok(mut guard) = self.runtime.lock() else {
            return;
        };
        if guard.is_some() {
            return;
        }
        let (engine, handle) = ScrollEngine::new(Arc::clone(&self.emitter));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(engine.run(shutdown_rx));
        *guard = Some(EngineRuntime {
            handle,
            shutdown,
            task,
        });
    }

    /// Signal the engine task to stop without awaiting it.
    fn shutdown_engine(&self) {
        if let Ok(mut guard) = self.runtime.lock() {
            if let Some(runtime) = guard.take() {
                let _ = runtime.shutdown.send(true);
            }
        }
    }

    fn engine_handle(&self) -> Option<EngineHandle> {
        self.runtime
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|rt| rt.handle.clone()))
    }

    /// Per-notch path, run on the hook thread. Returns true to swallow.
    fn handle_notch(&self, axis: Axis, delta: i32, x: i32, y: i32) -> bool {
        let settings = self.snapshot();
        if !settings.enabled {
            return false;
        }
        let Some(window) = self.windows.window_at(x, y) else {
            debug!("{}", Error::WindowLookupFailed(x, y));
            return false;
        };
        let Some(process) = self.processes.process_of(window) else {
            debug!("no owning process for window {:#x}", window.0);
            return false;
        };

        let resolution = resolve(&settings, &process);
        if resolution.excluded {
            return false;
        }
        let Some(handle) = self.engine_handle() else {
            return false;
        };

        let delta = if resolution.effective.reverse_wheel_direction {
            -delta
        } else {
            delta
        };
        // The effective tuple is bound to the notch here, on the hook
        // thread, so the engine never has to guess which profile a queued
        // notch belongs to.
        handle.submit(NotchEvent {
            axis,
            delta,
            arrived: Instant::now(),
            target: window,
            params: resolution.effective,
        })
    }
}

impl WheelSink for ScrollService {
    fn on_wheel(&self, delta: i32, x: i32, y: i32) -> bool {
        self.handle_notch(Axis::Vertical, delta, x, y)
    }

    fn on_hwheel(&self, delta: i32, x: i32, y: i32) -> bool {
        self.handle_notch(Axis::Horizontal, delta, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use swiftscroll_core::{AppProfileBinding, ScrollProfile, TargetWindow};

    use crate::backend::MockHookBackend;
    use crate::filter::{HookDecision, RawWheel, WheelKind};
    use crate::probes::{KeyStateProbe, ShellTrayProbe};

    struct Keys(Arc<AtomicBool>);
    impl KeyStateProbe for Keys {
        fn shift_down(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Tray(Option<TargetWindow>);
    impl ShellTrayProbe for Tray {
        fn tray_windows(&self) -> [Option<TargetWindow>; 2] {
            [self.0, None]
        }
    }

    struct Window(Option<TargetWindow>);
    impl WindowProbe for Window {
        fn window_at(&self, _x: i32, _y: i32) -> Option<TargetWindow> {
            self.0
        }
    }

    /// Process probe whose answer can change between notches.
    struct SwitchableProcess(Mutex<String>);
    impl SwitchableProcess {
        fn set(&self, name: &str) {
            *self.0.lock().unwrap() = name.to_string();
        }
    }
    impl ProcessProbe for SwitchableProcess {
        fn process_of(&self, _window: TargetWindow) -> Option<String> {
            Some(self.0.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(Axis, i32)>>,
    }
    impl WheelEmitter for Recorder {
        fn emit(&self, axis: Axis, delta_px: i32, _target: TargetWindow) -> Result<()> {
            self.events.lock().unwrap().push((axis, delta_px));
            Ok(())
        }
    }
    impl Recorder {
        fn total(&self, axis: Axis) -> i32 {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(a, _)| *a == axis)
                .map(|(_, d)| *d)
                .sum()
        }
    }

    struct Harness {
        service: Arc<ScrollService>,
        hook: Arc<MockHookBackend>,
        emitter: Arc<Recorder>,
        shift: Arc<AtomicBool>,
        process: Arc<SwitchableProcess>,
    }

    fn harness(settings: AppSettings, process: &str) -> Harness {
        let shift = Arc::new(AtomicBool::new(false));
        let window = TargetWindow(0x1000);
        let filter = Arc::new(WheelFilter::new(
            Box::new(Keys(Arc::clone(&shift))),
            Box::new(Tray(None)),
            Box::new(Window(Some(window))),
        ));
        let hook = Arc::new(MockHookBackend::default());
        let emitter = Arc::new(Recorder::default());
        let process = Arc::new(SwitchableProcess(Mutex::new(process.to_string())));
        let service = ScrollService::new(
            settings,
            Arc::clone(&hook) as Arc<dyn MouseHookBackend>,
            filter,
            Arc::new(Window(Some(window))),
            Arc::clone(&process) as Arc<dyn ProcessProbe>,
            Arc::clone(&emitter) as Arc<dyn WheelEmitter>,
        );
        Harness {
            service,
            hook,
            emitter,
            shift,
            process,
        }
    }

    fn wheel(kind: WheelKind, delta: i32) -> RawWheel {
        RawWheel {
            kind,
            delta,
            x: 50,
            y: 60,
            injected: false,
            extra_info: 0,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    #[tokio::test]
    async fn notch_is_swallowed_and_resynthesized() {
        let h = harness(AppSettings::default(), "firefox");
        h.service.start().unwrap();

        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Swallow);
        settle().await;

        assert_eq!(h.emitter.total(Axis::Vertical), 12);
        assert_eq!(h.emitter.total(Axis::Horizontal), 0);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn disabled_settings_pass_everything_through() {
        let settings = AppSettings {
            enabled: false,
            ..Default::default()
        };
        let h = harness(settings, "firefox");
        h.service.start().unwrap();

        // The hook is not even installed while disabled.
        assert!(!h.service.is_running());
        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Forward);
        settle().await;
        assert_eq!(h.emitter.total(Axis::Vertical), 0);
    }

    #[tokio::test]
    async fn excluded_app_is_forwarded_unswallowed() {
        let settings = AppSettings {
            excluded_apps: vec!["Notepad".into()],
            ..Default::default()
        };
        let h = harness(settings, "notepad");
        h.service.start().unwrap();

        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Forward);
        settle().await;
        assert_eq!(h.emitter.total(Axis::Vertical), 0);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn shift_routes_vertical_notch_to_horizontal_axis() {
        let h = harness(AppSettings::default(), "firefox");
        h.service.start().unwrap();
        h.shift.store(true, Ordering::SeqCst);

        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Swallow);
        settle().await;

        assert_eq!(h.emitter.total(Axis::Vertical), 0);
        assert_eq!(h.emitter.total(Axis::Horizontal), 12);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn bound_profile_drives_the_engine() {
        let mut settings = AppSettings::default();
        settings.profiles.push(ScrollProfile {
            step_size_px: 16,
            ..ScrollProfile::named("Fast")
        });
        settings.app_profiles.push(AppProfileBinding {
            app_name: "firefox".into(),
            profile_name: "Fast".into(),
        });
        let h = harness(settings, "firefox");
        h.service.start().unwrap();

        h.hook.simulate(wheel(WheelKind::Vertical, 120));
        settle().await;

        assert_eq!(h.emitter.total(Axis::Vertical), 16);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn quick_notches_under_different_profiles_keep_their_steps() {
        // Two notches over two app-bound profiles inside one tick interval:
        // the first pays out step 8, the second step 16, never 16 + 16.
        let mut settings = AppSettings::default();
        settings.profiles.push(ScrollProfile {
            step_size_px: 8,
            acceleration_max: 1,
            ..ScrollProfile::named("Slow")
        });
        settings.profiles.push(ScrollProfile {
            step_size_px: 16,
            acceleration_max: 1,
            ..ScrollProfile::named("Fast")
        });
        settings.app_profiles.push(AppProfileBinding {
            app_name: "slowapp".into(),
            profile_name: "Slow".into(),
        });
        settings.app_profiles.push(AppProfileBinding {
            app_name: "fastapp".into(),
            profile_name: "Fast".into(),
        });
        let h = harness(settings, "slowapp");
        h.service.start().unwrap();

        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Swallow);
        h.process.set("fastapp");
        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Swallow);
        settle().await;

        assert_eq!(h.emitter.total(Axis::Vertical), 8 + 16);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn reverse_direction_flips_the_sign() {
        let settings = AppSettings {
            reverse_wheel_direction: true,
            ..Default::default()
        };
        let h = harness(settings, "firefox");
        h.service.start().unwrap();

        h.hook.simulate(wheel(WheelKind::Vertical, 120));
        settle().await;

        assert_eq!(h.emitter.total(Axis::Vertical), -12);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn hook_install_failure_is_surfaced_and_engine_torn_down() {
        let shift = Arc::new(AtomicBool::new(false));
        let filter = Arc::new(WheelFilter::new(
            Box::new(Keys(shift)),
            Box::new(Tray(None)),
            Box::new(Window(Some(TargetWindow(1)))),
        ));
        let hook = Arc::new(MockHookBackend::failing());
        let service = ScrollService::new(
            AppSettings::default(),
            Arc::clone(&hook) as Arc<dyn MouseHookBackend>,
            filter,
            Arc::new(Window(Some(TargetWindow(1)))),
            Arc::new(SwitchableProcess(Mutex::new("firefox".to_string()))),
            Arc::new(Recorder::default()) as Arc<dyn WheelEmitter>,
        );

        assert!(matches!(
            service.start(),
            Err(Error::HookInstallFailed(_))
        ));
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn master_toggle_drives_hook_and_engine_together() {
        let h = harness(AppSettings::default(), "firefox");
        h.service.start().unwrap();
        assert!(h.service.is_running());

        let mut disabled = AppSettings::default();
        disabled.enabled = false;
        h.service.update_settings(disabled).await;
        assert!(!h.service.is_running());
        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Forward);

        h.service.update_settings(AppSettings::default()).await;
        assert!(h.service.is_running());
        assert_eq!(h.hook.simulate(wheel(WheelKind::Vertical, 120)), HookDecision::Swallow);
        h.service.stop().await;
    }

    #[tokio::test]
    async fn settings_change_repropagates_shift_toggle() {
        let h = harness(AppSettings::default(), "firefox");
        h.service.start().unwrap();
        h.shift.store(true, Ordering::SeqCst);

        let mut no_shift = AppSettings::default();
        no_shift.shift_key_horizontal = false;
        h.service.update_settings(no_shift).await;

        h.hook.simulate(wheel(WheelKind::Vertical, 120));
        settle().await;
        // Shift held, but conversion is off: stays vertical.
        assert_eq!(h.emitter.total(Axis::Horizontal), 0);
        assert_eq!(h.emitter.total(Axis::Vertical), 12);
        h.service.stop().await;
    }
}
