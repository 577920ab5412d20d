use anyhow::{Context, Result};

use swiftscroll_core::AppSettings;

pub fn path() -> Result<()> {
    println!("{}", AppSettings::settings_path().display());
    Ok(())
}

pub fn show() -> Result<()> {
    let path = AppSettings::settings_path();
    let settings = AppSettings::load_or_default(&path);
    let json = serde_json::to_string_pretty(&settings).context("could not render settings")?;
    println!("{json}");
    Ok(())
}

pub fn reset() -> Result<()> {
    let path = AppSettings::settings_path();
    AppSettings::default().save(&path)?;
    println!("Settings reset to defaults at {}.", path.display());
    Ok(())
}
