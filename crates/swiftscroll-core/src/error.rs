use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("mouse hook installation failed: {0}")]
    HookInstallFailed(String),

    #[error("no window under cursor at ({0}, {1})")]
    WindowLookupFailed(i32, i32),

    #[error("synthetic wheel injection failed: {0}")]
    InjectionFailed(String),

    #[error("failed to load settings: {0}")]
    SettingsLoadFailed(String),

    #[error("failed to save settings: {0}")]
    SettingsSaveFailed(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
