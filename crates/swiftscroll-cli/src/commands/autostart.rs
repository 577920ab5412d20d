use anyhow::Result;

use swiftscroll_hook::autostart;

pub fn enable() -> Result<()> {
    autostart::enable()?;
    println!("Autostart enabled for {}.", autostart::PRODUCT_NAME);
    Ok(())
}

pub fn disable() -> Result<()> {
    autostart::disable()?;
    println!("Autostart disabled.");
    Ok(())
}

pub fn status() -> Result<()> {
    if autostart::is_enabled()? {
        println!("Autostart is enabled.");
    } else {
        println!("Autostart is disabled.");
    }
    Ok(())
}
