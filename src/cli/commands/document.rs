//! Whole-document commands.

use std::path::Path;

use crate::settings::Extensible;

use super::{load, save};

/// Print the settings document as it would be saved
pub fn cmd_show(path: &Path) -> anyhow::Result<()> {
    let settings = load(path)?;
    print!("{}", serde_yaml::to_string(&settings)?);
    Ok(())
}

/// Print the settings document location
pub fn cmd_path(path: &Path) -> anyhow::Result<()> {
    println!("{}", path.display());
    if !path.exists() {
        println!("(not created yet; defaults are written on first load)");
    }
    Ok(())
}

/// Set a path-valued setting and save
pub fn cmd_set_path(path: &Path, field: &str, value: &Path) -> anyhow::Result<()> {
    let mut settings = load(path)?;
    settings.set(field, value.to_path_buf())?;
    save(path, &settings)?;
    println!("{} = {}", field, settings.get(field)?);
    Ok(())
}
