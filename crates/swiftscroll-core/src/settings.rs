use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Name of the profile that always exists and cannot be removed.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Settings file name, stored beside the executable (portable layout).
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Allowed range for `step_size_px`.
pub const STEP_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=25;

/// A named tuple of runtime scrolling parameters.
///
/// Applied either globally or to specific processes via
/// [`AppSettings::app_profiles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollProfile {
    pub name: String,
    /// Pixels contributed by a single notch before amplification.
    #[serde(default = "default_step_size_px")]
    pub step_size_px: u32,
    /// Nominal lifetime of one notch's contribution.
    #[serde(default = "default_animation_time_ms")]
    pub animation_time_ms: u32,
    /// Inter-notch interval below which acceleration stacks.
    #[serde(default = "default_acceleration_delta_ms")]
    pub acceleration_delta_ms: u32,
    /// Maximum multiplicative cap on stacked acceleration.
    #[serde(default = "default_acceleration_max")]
    pub acceleration_max: u32,
    /// How much longer the decaying tail is than the accelerating head.
    #[serde(default = "default_tail_to_head_ratio")]
    pub tail_to_head_ratio: u32,
    #[serde(default = "default_true")]
    pub animation_easing: bool,
    #[serde(default = "default_true")]
    pub horizontal_smoothness: bool,
    #[serde(default)]
    pub reverse_wheel_direction: bool,
}

impl ScrollProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step_size_px: default_step_size_px(),
            animation_time_ms: default_animation_time_ms(),
            acceleration_delta_ms: default_acceleration_delta_ms(),
            acceleration_max: default_acceleration_max(),
            tail_to_head_ratio: default_tail_to_head_ratio(),
            animation_easing: true,
            horizontal_smoothness: true,
            reverse_wheel_direction: false,
        }
    }

    /// Clamp every parameter into its documented range.
    fn normalize(&mut self) {
        self.step_size_px = self
            .step_size_px
            .clamp(*STEP_SIZE_RANGE.start(), *STEP_SIZE_RANGE.end());
        self.animation_time_ms = self.animation_time_ms.max(1);
        self.acceleration_max = self.acceleration_max.max(1);
        self.tail_to_head_ratio = self.tail_to_head_ratio.max(1);
    }
}

/// Binds a process name to a profile name.
///
/// Kept as a list of pairs rather than a map so the settings file preserves
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProfileBinding {
    pub app_name: String,
    pub profile_name: String,
}

/// Global application state, loaded at startup and replaced atomically on
/// change. Unknown fields in the file are ignored; missing fields fall back
/// to compiled defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Master kill-switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// When true, wheel + Shift routes to the horizontal axis.
    #[serde(default = "default_true")]
    pub shift_key_horizontal: bool,

    // Global defaults, mirrored by every profile field.
    #[serde(default = "default_step_size_px")]
    pub step_size_px: u32,
    #[serde(default = "default_animation_time_ms")]
    pub animation_time_ms: u32,
    #[serde(default = "default_acceleration_delta_ms")]
    pub acceleration_delta_ms: u32,
    #[serde(default = "default_acceleration_max")]
    pub acceleration_max: u32,
    #[serde(default = "default_tail_to_head_ratio")]
    pub tail_to_head_ratio: u32,
    #[serde(default = "default_true")]
    pub animation_easing: bool,
    #[serde(default = "default_true")]
    pub horizontal_smoothness: bool,
    #[serde(default)]
    pub reverse_wheel_direction: bool,

    /// Process names (image-file stems, matched case-insensitively) for which
    /// the core acts as a pure pass-through.
    #[serde(default)]
    pub excluded_apps: Vec<String>,
    /// Ordered profile list; the first entry is always "Default".
    #[serde(default = "default_profiles")]
    pub profiles: Vec<ScrollProfile>,
    /// Process name → profile name, insertion-ordered.
    #[serde(default)]
    pub app_profiles: Vec<AppProfileBinding>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            shift_key_horizontal: true,
            step_size_px: default_step_size_px(),
            animation_time_ms: default_animation_time_ms(),
            acceleration_delta_ms: default_acceleration_delta_ms(),
            acceleration_max: default_acceleration_max(),
            tail_to_head_ratio: default_tail_to_head_ratio(),
            animation_easing: true,
            horizontal_smoothness: true,
            reverse_wheel_direction: false,
            excluded_apps: Vec::new(),
            profiles: default_profiles(),
            app_profiles: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Load from `path`, falling back to compiled defaults on any failure.
    ///
    /// A malformed or unreadable file must never take the process down; the
    /// failure is logged and defaults win.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            }
        }
    }

    /// Load and normalize settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::SettingsLoadFailed(format!("{}: {e}", path.display())))?;
        let mut settings: Self = serde_json::from_str(&content)
            .map_err(|e| Error::SettingsLoadFailed(format!("{}: {e}", path.display())))?;
        settings.normalize();
        Ok(settings)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::SettingsSaveFailed(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| Error::SettingsSaveFailed(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// The portable settings path: `settings.json` beside the executable.
    pub fn settings_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILE_NAME)
    }

    /// The pre-portable per-user location, used once for migration.
    pub fn legacy_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("SwiftScroll").join(SETTINGS_FILE_NAME))
    }

    /// On first startup, copy a settings file from the legacy per-user
    /// location into the portable location if the latter does not exist yet.
    pub fn migrate_legacy(portable: &Path) {
        if portable.exists() {
            return;
        }
        let Some(legacy) = Self::legacy_settings_path() else {
            return;
        };
        if !legacy.exists() {
            return;
        }
        match std::fs::copy(&legacy, portable) {
            Ok(_) => info!(
                "migrated settings from {} to {}",
                legacy.display(),
                portable.display()
            ),
            Err(e) => warn!("could not migrate legacy settings: {e}"),
        }
    }

    /// Enforce the data-layer invariants: parameters in range, profile names
    /// case-insensitively unique, and "Default" present in first position.
    pub fn normalize(&mut self) {
        self.step_size_px = self
            .step_size_px
            .clamp(*STEP_SIZE_RANGE.start(), *STEP_SIZE_RANGE.end());
        self.animation_time_ms = self.animation_time_ms.max(1);
        self.acceleration_max = self.acceleration_max.max(1);
        self.tail_to_head_ratio = self.tail_to_head_ratio.max(1);

        let mut seen: Vec<String> = Vec::new();
        self.profiles.retain(|p| {
            let key = p.name.to_lowercase();
            if seen.contains(&key) {
                debug!("dropping duplicate profile {:?}", p.name);
                false
            } else {
                seen.push(key);
                true
            }
        });
        for profile in &mut self.profiles {
            profile.normalize();
        }
        match self
            .profiles
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(DEFAULT_PROFILE_NAME))
        {
            Some(0) => {}
            Some(i) => {
                let default = self.profiles.remove(i);
                self.profiles.insert(0, default);
            }
            None => self
                .profiles
                .insert(0, ScrollProfile::named(DEFAULT_PROFILE_NAME)),
        }
    }

    /// Case-insensitive profile lookup.
    pub fn profile(&self, name: &str) -> Option<&ScrollProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Remove a profile by name. Removing "Default" is rejected.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        if name.eq_ignore_ascii_case(DEFAULT_PROFILE_NAME) {
            return false;
        }
        let before = self.profiles.len();
        self.profiles.retain(|p| !p.name.eq_ignore_ascii_case(name));
        self.app_profiles
            .retain(|b| !b.profile_name.eq_ignore_ascii_case(name));
        self.profiles.len() != before
    }

    /// Whether `process_name` is excluded (case-insensitive).
    pub fn is_excluded(&self, process_name: &str) -> bool {
        self.excluded_apps
            .iter()
            .any(|app| app.eq_ignore_ascii_case(process_name))
    }

    /// The profile name bound to `process_name`, if any (case-insensitive).
    pub fn profile_name_for(&self, process_name: &str) -> Option<&str> {
        self.app_profiles
            .iter()
            .find(|b| b.app_name.eq_ignore_ascii_case(process_name))
            .map(|b| b.profile_name.as_str())
    }
}

fn default_true() -> bool {
    true
}

// Compiled defaults: the "Windows Classic" preset.

fn default_step_size_px() -> u32 {
    12
}

fn default_animation_time_ms() -> u32 {
    250
}

fn default_acceleration_delta_ms() -> u32 {
    60
}

fn default_acceleration_max() -> u32 {
    6
}

fn default_tail_to_head_ratio() -> u32 {
    2
}

fn default_profiles() -> Vec<ScrollProfile> {
    vec![ScrollProfile::named(DEFAULT_PROFILE_NAME)]
}
