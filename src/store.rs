//! Settings persistence using a YAML document.
//!
//! Settings are stored in the OS-standard config directory by default:
//! - Windows: %APPDATA%\settings-tree\settings.yaml
//! - macOS: ~/Library/Application Support/settings-tree/settings.yaml
//! - Linux: ~/.config/settings-tree/settings.yaml
//!
//! The document is human-readable and editable: block style, keys in
//! declaration order, tagged wrappers for paths, timestamps and services.
//! A missing or empty document is replaced with the defaults on load.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as Plain};
use serde_yaml::Value as Yaml;
use serde_yaml::value::TaggedValue;

use crate::codec::{mapping_to_tree, tree_to_mapping};
use crate::error::{Error, Result, ResultExt};
use crate::settings::tags::{self, TAG_KEY, TypeTag, VALUE_KEY};
use crate::settings::{Extensible, Settings};

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("settings-tree"))
}

/// Get the full path to the settings document
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("settings.yaml"))
}

/// Plain mapping of a freshly constructed `T`.
pub fn default_mapping<T: Extensible>() -> Map<String, Plain> {
    tree_to_mapping(&T::default())
}

/// Load application settings, creating the document when it is missing.
pub fn load_settings(path: &Path) -> Result<Settings> {
    load(path)
}

/// Save application settings.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    save(path, settings)
}

/// Load a node of type `T` from the document at `path`.
///
/// A missing or empty document is written with the defaults of `T`, which
/// are then returned. Every failure is reported as [`Error::ConfigLoad`].
pub fn load<T: Extensible>(path: &Path) -> Result<T> {
    try_load(path).map_err(|e| match e {
        Error::ConfigLoad(_) => e,
        other => Error::config_load(other.to_string()),
    })
}

fn try_load<T: Extensible>(path: &Path) -> Result<T> {
    if !path.exists() {
        tracing::info!("No settings file at {:?}, creating defaults", path);
        return bootstrap(path);
    }

    let contents = fs::read_to_string(path).with_context(format!("reading {}", path.display()))?;
    let data = parse_document(&contents)?;
    if data.is_empty() {
        tracing::warn!("Settings file {:?} is empty, rewriting defaults", path);
        return bootstrap(path);
    }

    let node = mapping_to_tree(data)?;
    tracing::info!("Loaded settings from {:?}", path);
    Ok(node)
}

/// Write the defaults of `T` to `path` and decode them back.
fn bootstrap<T: Extensible>(path: &Path) -> Result<T> {
    let defaults = default_mapping::<T>();
    write_document(path, &defaults)?;
    mapping_to_tree(defaults)
}

/// Parse a document into its root mapping. Blank and `null` documents are
/// empty mappings.
fn parse_document(contents: &str) -> Result<Map<String, Plain>> {
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    let yaml: Yaml = serde_yaml::from_str(contents)
        .map_err(|e| Error::config_load(format!("invalid YAML: {e}")))?;
    match yaml_to_plain(yaml)? {
        Plain::Object(map) => Ok(map),
        Plain::Null => Ok(Map::new()),
        other => Err(Error::config_load(format!(
            "settings document must be a mapping, got {other}"
        ))),
    }
}

/// Convert a parsed YAML value to the plain form.
///
/// Native tags (`!Path`, `!datetime`, `!TranslatorService`) become
/// `{"__type__": ..., "value": ...}` wrappers. A tagged mapping with a
/// `value` key contributes that value as the payload; any other tagged node
/// is the payload itself.
fn yaml_to_plain(yaml: Yaml) -> Result<Plain> {
    Ok(match yaml {
        Yaml::Null => Plain::Null,
        Yaml::Bool(b) => Plain::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Plain::String(s),
        Yaml::Sequence(items) => Plain::Array(
            items
                .into_iter()
                .map(yaml_to_plain)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_plain(value)?);
            }
            Plain::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let name = tag.to_string();
            let name = name.trim_start_matches('!');
            let payload = match value {
                Yaml::Mapping(mut mapping) if mapping.len() == 1 => {
                    match mapping.remove(VALUE_KEY) {
                        Some(inner) => inner,
                        None => Yaml::Mapping(mapping),
                    }
                }
                other => other,
            };
            let payload = yaml_to_plain(payload)?;
            match TypeTag::from_name(name) {
                Some(known) => tags::wrap(known, payload),
                None => {
                    let mut map = Map::new();
                    map.insert(TAG_KEY.to_string(), Plain::String(name.to_string()));
                    map.insert(VALUE_KEY.to_string(), payload);
                    Plain::Object(map)
                }
            }
        }
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Plain {
    if let Some(i) = n.as_i64() {
        Plain::from(i)
    } else if let Some(u) = n.as_u64() {
        Plain::from(u)
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Plain::Number)
            .unwrap_or(Plain::Null)
    }
}

/// Mapping keys must be scalars; numbers and booleans are used by their text.
fn yaml_key(key: Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::config_load(format!(
            "mapping keys must be scalars, got {other:?}"
        ))),
    }
}

/// Save a node of type `T` to `path`.
///
/// Creates the parent directory if it doesn't exist.
pub fn save<T: Extensible>(path: &Path, node: &T) -> Result<()> {
    write_document(path, &tree_to_mapping(node))?;
    tracing::info!("Saved settings to {:?}", path);
    Ok(())
}

fn write_document(path: &Path, data: &Map<String, Plain>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(format!("creating {}", dir.display()))?;
    }

    let contents = serde_yaml::to_string(data).with_context("serializing settings")?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("yaml.tmp");
    fs::write(&temp_path, &contents).with_context(format!("writing {}", temp_path.display()))?;
    fs::rename(&temp_path, path).with_context(format!(
        "renaming {} to {}",
        temp_path.display(),
        path.display()
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ServiceCategory, Value};
    use crate::test_utils::{mock_rest_service, sample_settings};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn settings_file(dir: &TempDir) -> PathBuf {
        dir.path().join("nested").join("settings.yaml")
    }

    #[test]
    fn test_load_missing_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let path = settings_file(&dir);

        let settings = load_settings(&path).unwrap();
        assert!(path.exists());

        let names: Vec<_> = settings.translator.api_based.names().collect();
        assert_eq!(names, ["DeepL", "DeepSeek"]);
        for (_, service) in settings.translator.api_based.iter() {
            assert_eq!(service.key(), None);
        }
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_default_document_is_block_style_and_ordered() {
        let dir = TempDir::new().unwrap();
        let path = settings_file(&dir);
        load_settings(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let js_path = contents.find("js_path").unwrap();
        let translator = contents.find("translator:").unwrap();
        assert!(js_path < translator);
        assert!(contents.contains("__type__: TranslatorService"));
        assert!(contents.contains("  now_using:\n    category: api_based\n    name: DeepSeek\n"));
        assert!(!contents.contains("{service_name"));
    }

    #[test]
    fn test_empty_document_is_replaced_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(fs::read_to_string(&path).unwrap().contains("translator:"));
    }

    #[test]
    fn test_null_document_is_replaced_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "~\n").unwrap();
        assert_eq!(load_settings(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_empty_mapping_document_is_replaced_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "{}\n").unwrap();

        assert_eq!(load_settings(&path).unwrap(), Settings::default());
        assert!(fs::read_to_string(&path).unwrap().contains("translator:"));
    }

    #[test]
    fn test_save_then_load_is_identity() {
        let dir = TempDir::new().unwrap();
        let path = settings_file(&dir);
        let settings = sample_settings();

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();

        assert_eq!(loaded, settings);
        assert_eq!(
            loaded.translator.now_using("base_url").unwrap(),
            Value::from("https://papago.example/translate")
        );
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[test]
    fn test_save_keeps_unicode_and_extras() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut settings = Settings::default();
        settings.set("greeting", "안녕하세요").unwrap();

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.get("greeting").unwrap(), Value::from("안녕하세요"));
    }

    #[test]
    fn test_corrupt_document_is_config_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "translator: [unclosed\n").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)), "got {err:?}");
    }

    #[test]
    fn test_invalid_service_is_config_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            "translator:\n  api_based:\n    Broken:\n      \
             service_name: Broken\n      client_type: rest\n",
        )
        .unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(ref msg) if msg.contains("key")), "got {err:?}");
    }

    #[test]
    fn test_scalar_document_is_config_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "just a string\n").unwrap();
        assert!(matches!(load_settings(&path).unwrap_err(), Error::ConfigLoad(_)));
    }

    #[test]
    fn test_hand_written_document_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            r#"
work_dir:
  __type__: Path
  value: /srv/jobs
translator:
  api_based:
    Papago:
      service_name: Papago
      key: abc
      request_form: null
      client_type: rest
      base_url: https://papago.example/translate
  now_using:
    category: api_based
    name: Papago
theme: dark
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.work_dir, Some(PathBuf::from("/srv/jobs")));
        assert_eq!(settings.translator.now_using("key").unwrap(), Value::from("abc"));
        assert_eq!(settings.get("theme").unwrap(), Value::from("dark"));
        assert_eq!(settings.translator.api_based.len(), 3);
    }

    #[test]
    fn test_native_yaml_tags_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            r#"
work_dir: !Path
  value: /srv/jobs
last_opened: !datetime
  value: '2024-05-01T12:30:00+09:00'
scratch: !Path /tmp/x
translator:
  api_based:
    Papago: !TranslatorService
      value:
        service_name: Papago
        key: abc
        request_form: null
        client_type: rest
        base_url: https://papago.example/translate
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        let ts = chrono::DateTime::parse_from_rfc3339("2024-05-01T12:30:00+09:00").unwrap();
        assert_eq!(settings.work_dir, Some(PathBuf::from("/srv/jobs")));
        assert_eq!(settings.get("last_opened").unwrap(), Value::Timestamp(ts));
        assert_eq!(settings.get("scratch").unwrap(), Value::Path(PathBuf::from("/tmp/x")));
        let papago = settings.translator.api_based.get("Papago").unwrap();
        assert_eq!(papago.key(), Some("abc"));
    }

    #[test]
    fn test_unknown_native_tag_keeps_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "accent: !Color '#fff'\n").unwrap();

        let settings = load_settings(&path).unwrap();
        let accent = settings.get("accent").unwrap();
        assert_eq!(
            accent.to_plain(),
            serde_json::json!({"__type__": "Color", "value": "#fff"})
        );
    }

    #[test]
    fn test_numeric_service_key_loads_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            "translator:\n  api_based:\n    Papago:\n      service_name: Papago\n      \
             key: 12345\n      request_form: null\n      client_type: rest\n      \
             base_url: https://papago.example/translate\n",
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        let papago = settings.translator.api_based.get("Papago").unwrap();
        assert_eq!(papago.key(), Some("12345"));
    }

    #[test]
    fn test_removed_service_stays_removed_until_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut settings = load_settings(&path).unwrap();

        settings.translator.api_based.add_service(mock_rest_service("Papago")).unwrap();
        settings.translator.now_using.select(ServiceCategory::ApiBased, "Papago");
        settings.translator.api_based.remove_service("Papago").unwrap();
        assert!(settings.translator.now_using("base_url").unwrap_err().is_validation());

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        assert!(!loaded.translator.api_based.contains("Papago"));
        assert_eq!(loaded.translator.now_using.name(), Some("Papago"));
    }
}
