use anyhow::Result;

use swiftscroll_core::AppSettings;

/// Load settings, wire the service against the real Win32 backends, and run
/// until Ctrl+C.
#[cfg(windows)]
pub async fn run() -> Result<()> {
    use std::sync::Arc;

    use tracing::{info, warn};

    use swiftscroll_core::{Error, WheelEmitter};
    use swiftscroll_hook::inject::Win32WheelEmitter;
    use swiftscroll_hook::probes::{ProcessProbe, WindowProbe};
    use swiftscroll_hook::{
        MouseHookBackend, ScrollService, WheelFilter, Win32HookBackend, Win32KeyProbe,
        Win32TrayProbe, Win32WindowProbe,
    };

    let path = AppSettings::settings_path();
    AppSettings::migrate_legacy(&path);
    let settings = AppSettings::load_or_default(&path);

    let filter = Arc::new(WheelFilter::new(
        Box::new(Win32KeyProbe),
        Box::new(Win32TrayProbe),
        Box::new(Win32WindowProbe),
    ));
    let service = ScrollService::new(
        settings,
        Arc::new(Win32HookBackend::default()) as Arc<dyn MouseHookBackend>,
        filter,
        Arc::new(Win32WindowProbe) as Arc<dyn WindowProbe>,
        Arc::new(Win32WindowProbe) as Arc<dyn ProcessProbe>,
        Arc::new(Win32WheelEmitter) as Arc<dyn WheelEmitter>,
    );

    match service.start() {
        Ok(()) => info!("SwiftScroll running; press Ctrl+C to stop"),
        // Reported once; the process stays up so autostart and the settings
        // surface keep working even without smooth scrolling.
        Err(e @ Error::HookInstallFailed(_)) => {
            warn!("{e}; continuing without smooth scrolling")
        }
        Err(e) => return Err(e.into()),
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    service.stop().await;
    Ok(())
}

#[cfg(not(windows))]
pub async fn run() -> Result<()> {
    anyhow::bail!(
        "the low-level wheel hook requires Windows; settings file would be at {}",
        AppSettings::settings_path().display()
    )
}
