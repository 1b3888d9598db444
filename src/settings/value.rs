//! Dynamic values stored in records and extra fields.
//!
//! [`Value`] has no plain-mapping variant: every nested mapping is a
//! [`Record`], at any depth. Conversion from the plain form
//! ([`serde_json::Value`]) is the single place where that rule is applied.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value as Plain};

use super::record::Record;
use super::service::ServiceDescriptor;
use super::tags::{self, Tagged};
use crate::error::Result;

/// A dynamically typed settings value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Filesystem path, tagged `Path` on disk
    Path(PathBuf),
    /// Point in time, tagged `datetime` on disk
    Timestamp(DateTime<FixedOffset>),
    List(Vec<Value>),
    Record(Record),
    /// Service descriptor, tagged `TranslatorService` on disk
    Service(Box<ServiceDescriptor>),
}

impl Value {
    /// Convert a plain value, wrapping every mapping as a [`Record`] and
    /// decoding known tagged wrappers.
    pub fn from_plain(plain: Plain) -> Result<Self> {
        Ok(match plain {
            Plain::Null => Value::Null,
            Plain::Bool(b) => Value::Bool(b),
            Plain::Number(n) => Value::Number(n),
            Plain::String(s) => Value::String(s),
            Plain::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_plain)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Plain::Object(map) => match tags::decode(&map) {
                Some(decoded) if tags::is_known(&map) => Value::from_tagged(decoded?)?,
                _ => Value::Record(Record::from_plain(map)?),
            },
        })
    }

    /// Convert a decoded wrapper into a value.
    pub fn from_tagged(tagged: Tagged) -> Result<Self> {
        Ok(match tagged {
            Tagged::Path(path) => Value::Path(path),
            Tagged::Timestamp(ts) => Value::Timestamp(ts),
            Tagged::Service(service) => Value::Service(Box::new(service)),
            Tagged::Plain(plain) => Value::from_plain(plain)?,
        })
    }

    /// Convert back to the plain form, re-tagging paths, timestamps and
    /// services.
    pub fn to_plain(&self) -> Plain {
        match self {
            Value::Null => Plain::Null,
            Value::Bool(b) => Plain::Bool(*b),
            Value::Number(n) => Plain::Number(n.clone()),
            Value::String(s) => Plain::String(s.clone()),
            Value::Path(path) => Tagged::Path(path.clone()).encode(),
            Value::Timestamp(ts) => Tagged::Timestamp(*ts).encode(),
            Value::List(items) => Plain::Array(items.iter().map(Value::to_plain).collect()),
            Value::Record(record) => Plain::Object(record.to_plain()),
            Value::Service(service) => Tagged::Service((**service).clone()).encode(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceDescriptor> {
        match self {
            Value::Service(service) => Some(service),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::Timestamp(_) => "datetime",
            Value::List(_) => "list",
            Value::Record(_) => "mapping",
            Value::Service(_) => "service",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no document representation and become null.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Value::Path(path)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<ServiceDescriptor> for Value {
    fn from(service: ServiceDescriptor) -> Self {
        Value::Service(Box::new(service))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Path(path) => write!(f, "{}", path.display()),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            other => write!(f, "{}", other.to_plain()),
        }
    }
}
