//! Active service selection commands.

use std::path::Path;

use crate::settings::{ResolvedService, ServiceCategory};

use super::{load, save};

/// Select the active service and save
///
/// The selection is resolved before saving so a typo never reaches disk.
pub fn cmd_use(path: &Path, category: &str, name: &str) -> anyhow::Result<()> {
    let category: ServiceCategory = category.parse()?;
    let mut settings = load(path)?;

    settings.translator.now_using.select(category, name);
    settings.translator.active_service()?;

    save(path, &settings)?;
    println!("Now using {}/{}", category, name);
    Ok(())
}

/// Print attributes of the active service
pub fn cmd_active(path: &Path, fields: &[String]) -> anyhow::Result<()> {
    let settings = load(path)?;
    let translator = &settings.translator;

    if fields.is_empty() {
        let selection = &translator.now_using;
        println!(
            "# {}/{}",
            selection.category().unwrap_or("-"),
            selection.name().unwrap_or("-")
        );
        let document = match translator.active_service()? {
            ResolvedService::Api(service) => serde_yaml::to_string(&service.to_plain())?,
            ResolvedService::Local(entry) => serde_yaml::to_string(entry)?,
        };
        print!("{}", document);
        return Ok(());
    }

    for field in fields {
        println!("{}: {}", field, translator.now_using(field)?);
    }
    Ok(())
}
