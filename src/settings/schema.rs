//! Typed records with declared fields plus an open side mapping.
//!
//! A settings node declares a fixed set of fields (see [`Extensible::FIELDS`])
//! and keeps every other name in its extras [`Record`]. Declared fields are
//! converted to and from the plain form through [`Field`], which is also how
//! a dynamic write to a declared name reaches the typed struct field.

use std::path::PathBuf;

use serde_json::Value as Plain;

use super::record::Record;
use super::tags::{self, Tagged};
use super::value::Value;
use crate::error::{Error, Result};

/// A type that can sit in a declared field.
pub trait Field: Sized {
    /// Plain form written by the serializer.
    fn encode(&self) -> Plain;

    /// Rebuild the field from its plain form.
    fn decode(plain: Plain) -> Result<Self>;
}

/// A schema-declared record that also accepts undeclared names.
pub trait Extensible: Default {
    /// Type name used in error messages.
    const TYPE_NAME: &'static str;

    /// Declared, serialized fields in declaration order.
    const FIELDS: &'static [&'static str];

    fn extras(&self) -> &Record;

    fn extras_mut(&mut self) -> &mut Record;

    /// Plain form of a declared field. `None` for undeclared names.
    fn encode_field(&self, name: &str) -> Option<Plain>;

    /// Decode `plain` into the declared field `name`.
    ///
    /// Returns `Ok(false)` when `name` is not declared.
    fn decode_field(&mut self, name: &str, plain: Plain) -> Result<bool>;

    /// Runs once after decoding, before dynamic fields are assigned.
    fn finish(&mut self) {}

    fn is_declared(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }

    /// Read a field.
    ///
    /// Declared fields come back as a detached snapshot; change them through
    /// the struct or [`Extensible::set`].
    fn get(&self, name: &str) -> Result<Value> {
        match self.encode_field(name) {
            Some(plain) => Value::from_plain(plain),
            None => self.get_dynamic(name).cloned(),
        }
    }

    /// Write a field.
    ///
    /// Declared names go through typed assignment and fail with a validation
    /// error on a type mismatch; anything else lands in the extras.
    fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if Self::is_declared(name) {
            self.decode_field(name, value.to_plain())
                .map_err(|e| Error::validation(format!("{}.{name}: {e}", Self::TYPE_NAME)))?;
            self.finish();
        } else {
            self.extras_mut().set(name, value);
        }
        Ok(())
    }

    /// Read an undeclared field.
    fn get_dynamic(&self, name: &str) -> Result<&Value> {
        self.extras()
            .get(name)
            .ok_or_else(|| Error::not_found(Self::TYPE_NAME, name))
    }

    /// Remove an undeclared field.
    fn remove_dynamic(&mut self, name: &str) -> Result<Value> {
        self.extras_mut()
            .remove(name)
            .ok_or_else(|| Error::not_found(Self::TYPE_NAME, name))
    }
}

/// Every declared [`Extensible`] node is itself a field of its parent.
pub(crate) fn encode_node<T: Extensible>(node: &T) -> Plain {
    Plain::Object(crate::codec::tree_to_mapping(node))
}

pub(crate) fn decode_node<T: Extensible>(plain: Plain) -> Result<T> {
    match plain {
        Plain::Object(map) => match tags::tag_name(&map) {
            Some(tag) => Err(Error::validation(format!(
                "{} must be a mapping, got a '{tag}' wrapper",
                T::TYPE_NAME
            ))),
            None => crate::codec::mapping_to_tree(map),
        },
        Plain::Null => Ok(T::default()),
        other => Err(Error::validation(format!(
            "{} must be a mapping, got {other}",
            T::TYPE_NAME
        ))),
    }
}

impl Field for Option<PathBuf> {
    fn encode(&self) -> Plain {
        match self {
            Some(path) => Tagged::Path(path.clone()).encode(),
            None => Plain::Null,
        }
    }

    fn decode(plain: Plain) -> Result<Self> {
        match plain {
            Plain::Null => Ok(None),
            Plain::String(s) => Ok(Some(PathBuf::from(s))),
            Plain::Object(map) => match tags::decode(&map) {
                Some(decoded) => match decoded? {
                    Tagged::Path(path) => Ok(Some(path)),
                    Tagged::Plain(Plain::String(s)) => Ok(Some(PathBuf::from(s))),
                    other => Err(Error::validation(format!("expected a path, got {other:?}"))),
                },
                None => Err(Error::validation("expected a path, got an untagged mapping")),
            },
            other => Err(Error::validation(format!("expected a path, got {other}"))),
        }
    }
}

impl Field for Record {
    fn encode(&self) -> Plain {
        Plain::Object(self.to_plain())
    }

    fn decode(plain: Plain) -> Result<Self> {
        match plain {
            Plain::Object(map) => Record::from_plain(map),
            Plain::Null => Ok(Record::new()),
            other => Err(Error::validation(format!("expected a mapping, got {other}"))),
        }
    }
}
