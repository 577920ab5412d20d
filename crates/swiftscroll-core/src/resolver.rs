//! Effective parameter resolution.
//!
//! Given the process name under the cursor, selects the exclusion decision
//! and the parameter tuple the engine should run with. The orchestrator
//! caches the returned `profile_key` and skips re-configuring the engine
//! while it stays unchanged, so profile switching costs nothing per notch.

use tracing::debug;

use crate::engine::EngineParams;
use crate::settings::AppSettings;
use crate::Error;

/// `profile_key` sentinel for "global defaults, no profile selected".
pub const GLOBAL_PROFILE_KEY: &str = "*";

/// Outcome of resolving one process name against the current settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The core acts as a pure pass-through for this process.
    pub excluded: bool,
    /// Parameters the engine should run with.
    pub effective: EngineParams,
    /// Selected profile name, or [`GLOBAL_PROFILE_KEY`].
    pub profile_key: String,
}

/// Resolve `process_name` (image-file stem, matched case-insensitively).
///
/// A dangling profile binding falls back to global defaults; that is never
/// fatal. Master toggle, Shift-horizontal, and autostart are not part of the
/// tuple and can never be overridden per-profile.
pub fn resolve(settings: &AppSettings, process_name: &str) -> Resolution {
    if settings.is_excluded(process_name) {
        return Resolution {
            excluded: true,
            effective: EngineParams::from_globals(settings),
            profile_key: GLOBAL_PROFILE_KEY.to_string(),
        };
    }

    if let Some(profile_name) = settings.profile_name_for(process_name) {
        match settings.profile(profile_name) {
            Some(profile) => {
                return Resolution {
                    excluded: false,
                    effective: EngineParams::from_profile(profile),
                    profile_key: profile.name.clone(),
                };
            }
            None => {
                debug!(
                    "{}, using global defaults for {process_name}",
                    Error::ProfileNotFound(profile_name.to_string())
                );
            }
        }
    }

    Resolution {
        excluded: false,
        effective: EngineParams::from_globals(settings),
        profile_key: GLOBAL_PROFILE_KEY.to_string(),
    }
}
