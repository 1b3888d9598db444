//! The `now_using` selector.
//!
//! A [`Selection`] names a service by `(category, name)` and resolves it on
//! demand against the [`Translator`] that owns both the selection and the
//! service collections. It stores only the two selector fields and an
//! identifier of its owner, never the resolved service.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value as Plain};

use super::Translator;
use super::schema::Field;
use super::service::ServiceDescriptor;
use super::value::Value;
use crate::error::{Error, Result};

/// Category used when none is set.
pub const DEFAULT_CATEGORY: &str = "api_based";

/// Service name used when none is set.
pub const DEFAULT_SERVICE: &str = "DeepSeek";

/// Where a selection looks its service up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    /// `translator.api_based`
    ApiBased,
    /// `translator.local_llm.models`
    LocalLlm,
}

impl ServiceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCategory::ApiBased => "api_based",
            ServiceCategory::LocalLlm => "local_llm",
        }
    }
}

impl FromStr for ServiceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "api_based" => Ok(Self::ApiBased),
            "local_llm" => Ok(Self::LocalLlm),
            _ => Err(Error::validation(format!("Invalid service category: {s}"))),
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a [`Translator`], used as the selection's back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslatorId(u64);

impl TranslatorId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A service found by resolving a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedService<'a> {
    Api(&'a ServiceDescriptor),
    /// Local model entries are opaque to this layer
    Local(&'a Value),
}

impl ResolvedService<'_> {
    /// Read one attribute of the resolved service.
    pub fn get(&self, field: &str) -> Result<Value> {
        match self {
            ResolvedService::Api(service) => service.get(field),
            ResolvedService::Local(Value::Service(service)) => service.get(field),
            ResolvedService::Local(Value::Record(record)) => record.field(field).cloned(),
            ResolvedService::Local(other) => Err(Error::not_found(
                format!("local model entry ({})", other.kind()),
                field,
            )),
        }
    }
}

/// `(category, name)` selector for the active translation service.
#[derive(Debug, Clone)]
pub struct Selection {
    category: Option<String>,
    name: Option<String>,
    parent: Option<TranslatorId>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.name == other.name
    }
}

impl Selection {
    /// Unset selector fields fall back to `api_based` / `DeepSeek`.
    ///
    /// The selection is detached until a [`Translator`] adopts it.
    pub fn new(category: Option<String>, name: Option<String>) -> Self {
        Self {
            category: category.or_else(|| Some(DEFAULT_CATEGORY.to_string())),
            name: name.or_else(|| Some(DEFAULT_SERVICE.to_string())),
            parent: None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Point at `(category, name)` in one go.
    pub fn select(&mut self, category: ServiceCategory, name: impl Into<String>) {
        self.category = Some(category.as_str().to_string());
        self.name = Some(name.into());
    }

    pub fn parent(&self) -> Option<TranslatorId> {
        self.parent
    }

    pub(crate) fn attach(&mut self, parent: TranslatorId) {
        self.parent = Some(parent);
    }

    /// Dynamic write. Only `category` and `name` are assignable.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let slot = match field {
            "category" => &mut self.category,
            "name" => &mut self.name,
            other => return Err(Error::ImmutableField(other.to_string())),
        };
        *slot = match value.into() {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => {
                return Err(Error::validation(format!(
                    "selection {field} must be a string or null, got {}",
                    other.kind()
                )));
            }
        };
        Ok(())
    }

    /// Find the selected service in `translator`'s collections.
    pub fn resolve<'a>(&self, translator: &'a Translator) -> Result<ResolvedService<'a>> {
        if self.parent != Some(translator.id()) {
            return Err(Error::validation("Parent translator reference not set"));
        }
        let (Some(category), Some(name)) = (self.category.as_deref(), self.name.as_deref()) else {
            return Err(Error::validation(
                "Translation service not set. Please set category and name first.",
            ));
        };
        match category.parse::<ServiceCategory>()? {
            ServiceCategory::ApiBased => translator
                .api_based
                .get(name)
                .map(ResolvedService::Api)
                .ok_or_else(|| {
                    Error::validation(format!("Service '{name}' not found in api_based services"))
                }),
            ServiceCategory::LocalLlm => translator
                .local_llm
                .models
                .get(name)
                .map(ResolvedService::Local)
                .ok_or_else(|| {
                    Error::validation(format!("Service '{name}' not found in local_llm services"))
                }),
        }
    }

    /// Read `field` through the selection.
    ///
    /// `category` and `name` are answered by the selection itself; any other
    /// field is read from the resolved service.
    pub fn resolve_and_get(&self, translator: &Translator, field: &str) -> Result<Value> {
        match field {
            "category" => Ok(Value::from(self.category.clone())),
            "name" => Ok(Value::from(self.name.clone())),
            _ => self.resolve(translator)?.get(field),
        }
    }
}

impl Field for Selection {
    /// `{category, name}` only; the resolved service is never written.
    fn encode(&self) -> Plain {
        let mut map = Map::new();
        map.insert("category".to_string(), Value::from(self.category.clone()).to_plain());
        map.insert("name".to_string(), Value::from(self.name.clone()).to_plain());
        Plain::Object(map)
    }

    fn decode(plain: Plain) -> Result<Self> {
        let map = match plain {
            Plain::Object(map) => map,
            Plain::Null => return Ok(Self::default()),
            other => {
                return Err(Error::validation(format!(
                    "now_using must be a mapping, got {other}"
                )));
            }
        };
        let selector = |key: &str| -> Result<Option<String>> {
            match map.get(key) {
                None | Some(Plain::Null) => Ok(None),
                Some(Plain::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(Error::validation(format!(
                    "now_using.{key} must be a string, got {other}"
                ))),
            }
        };
        Ok(Self::new(selector("category")?, selector("name")?))
    }
}
