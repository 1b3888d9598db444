//! Tagged wrappers for values with no native document representation.
//!
//! On disk such values look like:
//!
//! ```yaml
//! work_dir:
//!   __type__: Path
//!   value: /home/me/work
//! ```
//!
//! Decoding goes through a fixed table of handlers, one per [`TypeTag`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::{Map, Value as Plain};

use super::service::ServiceDescriptor;
use crate::error::{Error, Result};

/// Key holding the tag name inside a wrapper.
pub const TAG_KEY: &str = "__type__";

/// Key holding the payload inside a wrapper.
pub const VALUE_KEY: &str = "value";

/// The closed set of tags this crate knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Path,
    Timestamp,
    TranslatorService,
}

impl TypeTag {
    /// Name written to the `__type__` key.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Path => "Path",
            TypeTag::Timestamp => "datetime",
            TypeTag::TranslatorService => "TranslatorService",
        }
    }

    /// Look up a tag by its on-disk name.
    pub fn from_name(name: &str) -> Option<Self> {
        HANDLERS
            .iter()
            .find(|handler| handler.tag.name() == name)
            .map(|handler| handler.tag)
    }
}

/// A decoded tagged value.
///
/// `Plain` carries the payload of a wrapper whose tag is not in the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Tagged {
    Path(PathBuf),
    Timestamp(DateTime<FixedOffset>),
    Service(ServiceDescriptor),
    Plain(Plain),
}

impl Tagged {
    /// Encode into a `{"__type__": ..., "value": ...}` wrapper.
    ///
    /// `Plain` payloads are returned as-is since they carry no known tag.
    pub fn encode(&self) -> Plain {
        match self {
            Tagged::Path(path) => wrap(TypeTag::Path, Plain::String(posix_absolute(path))),
            Tagged::Timestamp(ts) => wrap(TypeTag::Timestamp, Plain::String(ts.to_rfc3339())),
            Tagged::Service(service) => {
                wrap(TypeTag::TranslatorService, Plain::Object(service.to_plain()))
            }
            Tagged::Plain(plain) => plain.clone(),
        }
    }
}

type DecodeFn = fn(Plain) -> Result<Tagged>;

struct Handler {
    tag: TypeTag,
    decode: DecodeFn,
}

const HANDLERS: &[Handler] = &[
    Handler {
        tag: TypeTag::Path,
        decode: decode_path,
    },
    Handler {
        tag: TypeTag::Timestamp,
        decode: decode_timestamp,
    },
    Handler {
        tag: TypeTag::TranslatorService,
        decode: decode_service,
    },
];

/// Build a wrapper for `tag` around `payload`.
pub fn wrap(tag: TypeTag, payload: Plain) -> Plain {
    let mut map = Map::new();
    map.insert(TAG_KEY.to_string(), Plain::String(tag.name().to_string()));
    map.insert(VALUE_KEY.to_string(), payload);
    Plain::Object(map)
}

/// The tag name of a wrapper, if `map` is one.
///
/// A wrapper holds `__type__` and at most a `value` key. A mapping with any
/// other key is ordinary data, even when it carries `__type__`.
pub fn tag_name(map: &Map<String, Plain>) -> Option<&str> {
    if !map.keys().all(|key| key == TAG_KEY || key == VALUE_KEY) {
        return None;
    }
    map.get(TAG_KEY).and_then(Plain::as_str)
}

/// Whether `map` is a wrapper with a tag from the handler table.
pub fn is_known(map: &Map<String, Plain>) -> bool {
    tag_name(map).and_then(TypeTag::from_name).is_some()
}

/// Decode a wrapper.
///
/// Returns `None` when `map` carries no `__type__` key. Unknown tags decode
/// to [`Tagged::Plain`] holding the unwrapped payload.
pub fn decode(map: &Map<String, Plain>) -> Option<Result<Tagged>> {
    let name = tag_name(map)?;
    let payload = map.get(VALUE_KEY).cloned().unwrap_or(Plain::Null);
    let decoded = match HANDLERS.iter().find(|handler| handler.tag.name() == name) {
        Some(handler) => (handler.decode)(payload),
        None => Ok(Tagged::Plain(payload)),
    };
    Some(decoded)
}

/// Absolute path with forward-slash separators, whatever the host platform.
pub fn posix_absolute(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

fn decode_path(payload: Plain) -> Result<Tagged> {
    match payload {
        Plain::String(s) => Ok(Tagged::Path(PathBuf::from(s))),
        other => Err(Error::validation(format!(
            "Path payload must be a string, got {other}"
        ))),
    }
}

fn decode_timestamp(payload: Plain) -> Result<Tagged> {
    let Plain::String(s) = payload else {
        return Err(Error::validation("datetime payload must be an ISO-8601 string"));
    };
    parse_timestamp(&s).map(Tagged::Timestamp)
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts);
    }
    s.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| Error::validation(format!("invalid datetime '{s}': {e}")))
}

fn decode_service(payload: Plain) -> Result<Tagged> {
    match payload {
        Plain::Object(map) => ServiceDescriptor::from_plain(map).map(Tagged::Service),
        other => Err(Error::validation(format!(
            "TranslatorService payload must be a mapping, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mapping;
    use serde_json::json;

    #[test]
    fn test_path_wrapper_is_posix_and_absolute() {
        let encoded = Tagged::Path(PathBuf::from("/music/in")).encode();
        assert_eq!(encoded, json!({"__type__": "Path", "value": "/music/in"}));
    }

    #[test]
    fn test_relative_path_becomes_absolute() {
        let encoded = mapping(Tagged::Path(PathBuf::from("scripts")).encode());
        let value = encoded[VALUE_KEY].as_str().unwrap();
        assert!(value.starts_with('/') || value.chars().nth(1) == Some(':'));
        assert!(value.ends_with("/scripts"));
        assert!(!value.contains('\\'));
    }

    #[test]
    fn test_decode_path() {
        let map = mapping(json!({"__type__": "Path", "value": "/a/b"}));
        let decoded = decode(&map).unwrap().unwrap();
        assert_eq!(decoded, Tagged::Path(PathBuf::from("/a/b")));
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T12:30:00+09:00").unwrap();
        let encoded = mapping(Tagged::Timestamp(ts).encode());
        assert_eq!(encoded[TAG_KEY], "datetime");
        assert_eq!(decode(&encoded).unwrap().unwrap(), Tagged::Timestamp(ts));
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_timestamp("2024-05-01T12:30:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_bad_timestamp_fails() {
        let map = mapping(json!({"__type__": "datetime", "value": "yesterday"}));
        assert!(decode(&map).unwrap().unwrap_err().is_validation());
    }

    #[test]
    fn test_unknown_tag_unwraps_payload() {
        let map = mapping(json!({"__type__": "Color", "value": "#fff"}));
        assert_eq!(decode(&map).unwrap().unwrap(), Tagged::Plain(json!("#fff")));
        assert!(!is_known(&map));
    }

    #[test]
    fn test_untagged_mapping_is_not_a_wrapper() {
        let map = mapping(json!({"value": 1}));
        assert!(decode(&map).is_none());
    }

    #[test]
    fn test_extra_keys_mean_ordinary_mapping() {
        let map = mapping(json!({"__type__": "Path", "value": "/a", "note": "keep"}));
        assert_eq!(tag_name(&map), None);
        assert!(decode(&map).is_none());
        assert!(!is_known(&map));
    }

    #[test]
    fn test_bare_tag_is_a_wrapper() {
        let map = mapping(json!({"__type__": "Color"}));
        assert_eq!(tag_name(&map), Some("Color"));
        assert_eq!(decode(&map).unwrap().unwrap(), Tagged::Plain(Plain::Null));
    }

    #[test]
    fn test_service_wrapper_decodes() {
        let map = mapping(json!({
            "__type__": "TranslatorService",
            "value": {
                "service_name": "Papago",
                "key": null,
                "request_form": null,
                "client_type": "rest",
                "base_url": "https://papago.example/translate"
            }
        }));
        match decode(&map).unwrap().unwrap() {
            Tagged::Service(service) => assert_eq!(service.service_name(), Some("Papago")),
            other => panic!("expected service, got {other:?}"),
        }
    }
}
