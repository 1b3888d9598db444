//! API-based service management commands.

use anyhow::Context;
use serde::Serialize;
use serde_json::Value as Plain;
use std::path::Path;
use tracing::warn;

use crate::settings::{ServiceCategory, Settings, Value};

use super::{load, save};

/// One row of `services list`.
#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub name: String,
    pub client_type: Option<String>,
    pub base_url: Option<String>,
    pub has_key: bool,
    pub active: bool,
}

/// Summarize the `api_based` services in collection order
pub fn summarize(settings: &Settings) -> Vec<ServiceSummary> {
    let selection = &settings.translator.now_using;
    let active_category = selection.category() == Some(ServiceCategory::ApiBased.as_str());

    settings
        .translator
        .api_based
        .iter()
        .map(|(name, service)| ServiceSummary {
            name: name.to_string(),
            client_type: service.client_type().map(str::to_string),
            base_url: service.base_url().map(str::to_string),
            has_key: service.key().is_some(),
            active: active_category && selection.name() == Some(name),
        })
        .collect()
}

/// List registered services
pub fn cmd_services_list(path: &Path, format: &str) -> anyhow::Result<()> {
    let settings = load(path)?;
    let summaries = summarize(&settings);

    match format {
        "text" => {
            println!("{:<2}{:<16}{:<8}{:<5}BASE URL", "", "NAME", "CLIENT", "KEY");
            for row in &summaries {
                println!(
                    "{:<2}{:<16}{:<8}{:<5}{}",
                    if row.active { "*" } else { "" },
                    row.name,
                    row.client_type.as_deref().unwrap_or("-"),
                    if row.has_key { "yes" } else { "no" },
                    row.base_url.as_deref().unwrap_or("-"),
                );
            }
        }
        "yaml" => print!("{}", serde_yaml::to_string(&summaries)?),
        other => anyhow::bail!("Unknown format '{}', expected text or yaml", other),
    }
    Ok(())
}

/// Register a service read from a YAML file
pub fn cmd_services_add(path: &Path, file: &Path) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let plain: Plain = serde_yaml::from_str(&contents)
        .with_context(|| format!("Invalid YAML in {}", file.display()))?;

    let mut settings = load(path)?;
    let name = add_from_plain(&mut settings, plain)?;
    save(path, &settings)?;
    println!("Added service '{}'", name);
    Ok(())
}

/// Accepts a plain service mapping or a `TranslatorService` wrapper.
fn add_from_plain(settings: &mut Settings, plain: Plain) -> anyhow::Result<String> {
    let services = &mut settings.translator.api_based;
    match Value::from_plain(plain)? {
        Value::Service(service) => {
            let name = service
                .service_name()
                .context("service_name must be set")?
                .to_string();
            services.insert(name.clone(), *service);
            Ok(name)
        }
        Value::Record(data) => {
            let service = services.add_service(data)?;
            Ok(service.service_name().unwrap_or_default().to_string())
        }
        other => anyhow::bail!("Expected a service mapping, got {}", other.kind()),
    }
}

/// Remove a service by name
pub fn cmd_services_remove(path: &Path, name: &str) -> anyhow::Result<()> {
    let mut settings = load(path)?;
    settings.translator.api_based.remove_service(name)?;

    let selection = &settings.translator.now_using;
    if selection.category() == Some(ServiceCategory::ApiBased.as_str())
        && selection.name() == Some(name)
    {
        warn!("Removed the active service '{}'; select another with `use`", name);
    }

    save(path, &settings)?;
    println!("Removed service '{}'", name);
    Ok(())
}
