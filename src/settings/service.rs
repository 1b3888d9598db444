//! Translation service descriptors and the `api_based` collection.

use indexmap::IndexMap;
use serde_json::{Map, Value as Plain, json};

use super::record::Record;
use super::value::Value;
use crate::error::{Error, Result};

/// Required descriptor fields, in serialization order.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "service_name",
    "key",
    "request_form",
    "client_type",
    "base_url",
];

/// Client kind for OpenAI-compatible chat APIs; requires a `model` extra.
pub const OPENAI_CLIENT: &str = "openai";

/// Client kind for plain REST endpoints.
pub const REST_CLIENT: &str = "rest";

/// Connection parameters for one external translation or LLM service.
///
/// The five required fields are typed; everything else (model, templates,
/// sampling parameters) lives in [`ServiceDescriptor::extras`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    service_name: Option<String>,
    key: Option<String>,
    request_form: Option<String>,
    client_type: Option<String>,
    base_url: Option<String>,
    extras: Record,
}

impl ServiceDescriptor {
    /// Build a descriptor from explicit required fields and extras.
    ///
    /// Fails when the client kind rule is broken.
    pub fn new(
        service_name: Option<String>,
        key: Option<String>,
        request_form: Option<String>,
        client_type: Option<String>,
        base_url: Option<String>,
        extras: Record,
    ) -> Result<Self> {
        let descriptor = Self {
            service_name,
            key,
            request_form,
            client_type,
            base_url,
            extras,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Split a flat record into required fields and extras.
    ///
    /// Every required key must be present; `null` counts as present.
    /// Numbers are kept as their text, so `key: 12345` reads as `"12345"`.
    pub fn from_mapping(mut data: Record) -> Result<Self> {
        let mut required: [Option<String>; 5] = Default::default();
        for (slot, name) in required.iter_mut().zip(REQUIRED_FIELDS) {
            let value = data
                .remove(name)
                .ok_or_else(|| Error::validation(format!("'{name}' field is required")))?;
            *slot = required_string(name, value)?;
        }
        let [service_name, key, request_form, client_type, base_url] = required;
        Self::new(service_name, key, request_form, client_type, base_url, data)
    }

    /// [`ServiceDescriptor::from_mapping`] over a plain mapping.
    pub fn from_plain(map: Map<String, Plain>) -> Result<Self> {
        Self::from_mapping(Record::from_plain(map)?)
    }

    fn validate(&self) -> Result<()> {
        if self.client_type.as_deref() == Some(OPENAI_CLIENT) && !self.extras.contains("model") {
            return Err(Error::validation("OpenAI client requires 'model' field"));
        }
        Ok(())
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn request_form(&self) -> Option<&str> {
        self.request_form.as_deref()
    }

    pub fn client_type(&self) -> Option<&str> {
        self.client_type.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn extras(&self) -> &Record {
        &self.extras
    }

    /// Read any field; non-required names come from the extras.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.required_slot(name) {
            Some(slot) => Ok(Value::from(slot.clone())),
            None => self
                .extras
                .get(name)
                .cloned()
                .ok_or_else(|| Error::not_found("service descriptor", name)),
        }
    }

    /// Write any field; non-required names go to the extras.
    ///
    /// Required fields accept strings, numbers or null. The client kind rule is
    /// checked again after the write and the write is undone on failure.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if REQUIRED_FIELDS.contains(&name) {
            let new = required_string(name, value)?;
            let previous = self.required_slot_mut(name).map(|slot| std::mem::replace(slot, new));
            if let Err(e) = self.validate() {
                if let (Some(slot), Some(previous)) = (self.required_slot_mut(name), previous) {
                    *slot = previous;
                }
                return Err(e);
            }
        } else {
            self.extras.set(name, value);
        }
        Ok(())
    }

    /// Required fields first, then extras; required keys win on collision.
    pub fn to_plain(&self) -> Map<String, Plain> {
        let mut map = Map::new();
        for name in REQUIRED_FIELDS {
            let value = self
                .required_slot(name)
                .and_then(Clone::clone)
                .map(Plain::String)
                .unwrap_or(Plain::Null);
            map.insert(name.to_string(), value);
        }
        for (key, value) in self.extras.iter() {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.to_plain());
            }
        }
        map
    }

    fn required_slot(&self, name: &str) -> Option<&Option<String>> {
        match name {
            "service_name" => Some(&self.service_name),
            "key" => Some(&self.key),
            "request_form" => Some(&self.request_form),
            "client_type" => Some(&self.client_type),
            "base_url" => Some(&self.base_url),
            _ => None,
        }
    }

    fn required_slot_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "service_name" => Some(&mut self.service_name),
            "key" => Some(&mut self.key),
            "request_form" => Some(&mut self.request_form),
            "client_type" => Some(&mut self.client_type),
            "base_url" => Some(&mut self.base_url),
            _ => None,
        }
    }
}

fn required_string(name: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(Error::validation(format!(
            "'{name}' must be a string or null, got {}",
            other.kind()
        ))),
    }
}

// ============================================================================
// Built-in presets
// ============================================================================

const DEEPSEEK_SYSTEM_PROMPT: &str = r#"
                Translate following texts to Korean. Answer in "Speaker: Text" format.
                Don't compress conversations arbitrarily. The "Speaker: Text" pair I provide and the "Speaker: Text" pair in the response must match."#;

/// Plain mappings for the built-in service presets, in insertion order.
pub fn default_service_mappings() -> Vec<(&'static str, Plain)> {
    vec![
        (
            "DeepL",
            json!({
                "service_name": "DeepL",
                "key": null,
                "request_form": "placeholder",
                "client_type": REST_CLIENT,
                "base_url": "https://api-free.deepl.com/v2/translate",
                "headers_template": {
                    "Authorization": "DeepL-Auth-Key {api_key}"
                },
                "data_template": {
                    "target_lang": "KO"
                }
            }),
        ),
        (
            "DeepSeek",
            json!({
                "service_name": "DeepSeek",
                "key": null,
                "request_form": null,
                "client_type": OPENAI_CLIENT,
                "base_url": "https://api.deepseek.com",
                "model": "deepseek-chat",
                "temperature": 1.2,
                "system_prompt": DEEPSEEK_SYSTEM_PROMPT,
                "headers_template": {},
                "data_template": {}
            }),
        ),
    ]
}

// ============================================================================
// Service collection
// ============================================================================

/// Services reachable over an API, keyed by name.
///
/// A fresh collection always holds the built-in presets.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiServices {
    services: IndexMap<String, ServiceDescriptor>,
}

impl Default for ApiServices {
    fn default() -> Self {
        let services = default_service_mappings()
            .into_iter()
            .map(|(name, plain)| {
                let Plain::Object(map) = plain else {
                    unreachable!("built-in preset is a mapping");
                };
                let service = ServiceDescriptor::from_plain(map).expect("built-in preset is valid");
                (name.to_string(), service)
            })
            .collect();
        Self { services }
    }
}

impl ApiServices {
    /// A collection with no entries at all, presets included.
    pub fn empty() -> Self {
        Self {
            services: IndexMap::new(),
        }
    }

    /// Overlay stored entries on top of the presets.
    ///
    /// Entries may be tagged `TranslatorService` wrappers or bare mappings.
    pub fn from_plain(map: Map<String, Plain>) -> Result<Self> {
        let mut collection = Self::default();
        for (name, entry) in map {
            let service = match Value::from_plain(entry)? {
                Value::Service(service) => *service,
                Value::Record(record) => ServiceDescriptor::from_mapping(record)?,
                other => {
                    return Err(Error::validation(format!(
                        "service '{name}' must be a mapping, got {}",
                        other.kind()
                    )));
                }
            };
            collection.services.insert(name, service);
        }
        Ok(collection)
    }

    /// Tagged wrapper per entry.
    pub fn to_plain(&self) -> Map<String, Plain> {
        self.services
            .iter()
            .map(|(name, service)| (name.clone(), Value::from(service.clone()).to_plain()))
            .collect()
    }

    /// Add a service from a flat mapping, keyed by its `service_name`.
    ///
    /// An existing service with the same name is replaced.
    pub fn add_service(&mut self, data: Record) -> Result<&ServiceDescriptor> {
        let service = ServiceDescriptor::from_mapping(data)?;
        let name = service
            .service_name()
            .map(str::to_string)
            .ok_or_else(|| Error::validation("'service_name' must be set to add a service"))?;
        Ok(self.insert(name, service))
    }

    /// Store `service` under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        service: ServiceDescriptor,
    ) -> &ServiceDescriptor {
        let (index, _) = self.services.insert_full(name.into(), service);
        &self.services[index]
    }

    pub fn remove_service(&mut self, name: &str) -> Result<ServiceDescriptor> {
        self.services
            .shift_remove(name)
            .ok_or_else(|| Error::not_found("api_based services", name))
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ServiceDescriptor> {
        self.services.get_mut(name)
    }

    /// Strict lookup.
    pub fn lookup(&self, name: &str) -> Result<&ServiceDescriptor> {
        self.services
            .get(name)
            .ok_or_else(|| Error::not_found("api_based services", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceDescriptor)> {
        self.services.iter().map(|(name, service)| (name.as_str(), service))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
