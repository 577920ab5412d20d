//! Autostart registration in the current-user Run key.

use anyhow::Result;

/// Value name under the Run key.
pub const PRODUCT_NAME: &str = "SwiftScroll";

#[cfg(windows)]
mod imp {
    use anyhow::{Context, Result};
    use windows_registry::CURRENT_USER;

    use super::PRODUCT_NAME;

    const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

    /// Point the Run entry at the absolute path of the running executable.
    pub fn enable() -> Result<()> {
        let exe = std::env::current_exe().context("could not resolve executable path")?;
        let key = CURRENT_USER
            .create(RUN_KEY)
            .context("could not open Run key")?;
        key.set_string(PRODUCT_NAME, exe.to_string_lossy().as_ref())
            .context("could not write Run value")?;
        Ok(())
    }

    /// Remove the Run entry. A missing value is not an error.
    pub fn disable() -> Result<()> {
        let key = CURRENT_USER
            .create(RUN_KEY)
            .context("could not open Run key")?;
        if key.get_string(PRODUCT_NAME).is_ok() {
            key.remove_value(PRODUCT_NAME)
                .context("could not delete Run value")?;
        }
        Ok(())
    }

    /// Whether the Run entry currently exists.
    pub fn is_enabled() -> Result<bool> {
        let key = CURRENT_USER
            .open(RUN_KEY)
            .context("could not open Run key")?;
        Ok(key.get_string(PRODUCT_NAME).is_ok())
    }
}

#[cfg(windows)]
pub use imp::{disable, enable, is_enabled};

#[cfg(not(windows))]
pub fn enable() -> Result<()> {
    anyhow::bail!("autostart registration requires Windows")
}

#[cfg(not(windows))]
pub fn disable() -> Result<()> {
    anyhow::bail!("autostart registration requires Windows")
}

#[cfg(not(windows))]
pub fn is_enabled() -> Result<bool> {
    anyhow::bail!("autostart registration requires Windows")
}
