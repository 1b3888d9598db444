//! Test utilities and fixtures for settings-tree tests.
//!
//! # Example
//!
//! ```ignore
//! use settings_tree::test_utils::{mock_rest_service, sample_settings};
//!
//! #[test]
//! fn test_something() {
//!     let mut settings = sample_settings();
//!     settings.translator.api_based.add_service(mock_rest_service("Papago")).unwrap();
//!     // ... test logic
//! }
//! ```

use std::path::PathBuf;

use serde_json::{Map, Value as Plain};
use tempfile::TempDir;

use crate::settings::{Record, ServiceCategory, Settings};

/// Builds a plain mapping from a `json!` literal.
///
/// Panics if `plain` is not an object.
pub fn mapping(plain: Plain) -> Map<String, Plain> {
    match plain {
        Plain::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Builds a [`Record`] from a `json!` object literal.
pub fn record(plain: Plain) -> Record {
    Record::from_plain(mapping(plain)).expect("Failed to build record")
}

/// Creates the raw data for a REST service with every required field present.
///
/// `key` and `request_form` are null. Customize with [`Record::set`]:
///
/// ```ignore
/// let mut data = mock_rest_service("Papago");
/// data.set("key", "secret");
/// ```
pub fn mock_rest_service(name: &str) -> Record {
    let mut data = Record::new();
    data.set("service_name", name);
    data.set("key", None::<String>);
    data.set("request_form", None::<String>);
    data.set("client_type", "rest");
    data.set("base_url", "https://papago.example/translate");
    data
}

/// Settings with every kind of field populated.
///
/// Paths are set, a custom service named `Papago` with a `region` extra is
/// registered and selected, and one dynamic key lives at the root.
pub fn sample_settings() -> Settings {
    let mut settings = Settings {
        js_path: Some(PathBuf::from("/opt/node/bin/node")),
        work_dir: Some(PathBuf::from("/srv/work")),
        ..Settings::default()
    };

    let mut papago = mock_rest_service("Papago");
    papago.set("key", "test-key");
    papago.set("region", "kr");
    settings
        .translator
        .api_based
        .add_service(papago)
        .expect("Failed to add mock service");
    settings
        .translator
        .now_using
        .select(ServiceCategory::ApiBased, "Papago");
    settings.extras.set("theme", "dark");
    settings
}

/// A settings file location inside a fresh temporary directory.
///
/// Keep the TempDir alive for the duration of your test. The file itself
/// does not exist yet.
pub fn temp_settings_path() -> (PathBuf, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("settings.yaml");
    (path, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Value;

    #[test]
    fn test_mock_rest_service_has_required_fields() {
        let data = mock_rest_service("Papago");
        let keys: Vec<_> = data.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["service_name", "key", "request_form", "client_type", "base_url"]
        );
        assert_eq!(data.get("key"), Some(&Value::Null));
    }

    #[test]
    fn test_sample_settings_resolves_selection() {
        let settings = sample_settings();
        assert_eq!(
            settings.translator.now_using("region").unwrap(),
            Value::from("kr")
        );
        assert_eq!(settings.translator.api_based.len(), 3);
    }

    #[test]
    fn test_temp_settings_path_is_fresh() {
        let (path, _dir) = temp_settings_path();
        assert!(!path.exists());
        assert!(path.parent().unwrap().exists());
    }
}
