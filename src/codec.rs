//! Conversion between settings nodes and plain mappings.
//!
//! The plain form is what gets written to disk: nested mappings, scalars and
//! `{"__type__": ..., "value": ...}` wrappers for paths, timestamps and
//! service descriptors.

use serde_json::{Map, Value as Plain};
use tracing::debug;

use crate::error::Result;
use crate::settings::Extensible;
use crate::settings::tags::{self, VALUE_KEY};
use crate::settings::value::Value;

/// Declared fields in declaration order, then the node's dynamic fields.
pub fn tree_to_mapping<T: Extensible>(node: &T) -> Map<String, Plain> {
    let mut map = Map::new();
    for &name in T::FIELDS {
        if let Some(plain) = node.encode_field(name) {
            map.insert(name.to_string(), plain);
        }
    }
    for (key, value) in node.extras().iter() {
        map.insert(key.clone(), value.to_plain());
    }
    map
}

/// Build a node from a plain mapping.
///
/// Declared keys are decoded into their typed fields, a wrapper with an
/// unknown tag is unwrapped to its payload first. Undeclared keys are
/// assigned afterwards through [`Extensible::set`].
pub fn mapping_to_tree<T: Extensible>(data: Map<String, Plain>) -> Result<T> {
    let mut node = T::default();
    let mut dynamic = Vec::new();

    for (key, plain) in data {
        if !T::is_declared(&key) {
            dynamic.push((key, plain));
            continue;
        }
        let plain = unwrap_unknown_tag(plain);
        node.decode_field(&key, plain)?;
    }
    node.finish();

    for (key, plain) in dynamic {
        debug!(node = T::TYPE_NAME, key = %key, "assigning dynamic field");
        node.set(&key, Value::from_plain(plain)?)?;
    }
    Ok(node)
}

fn unwrap_unknown_tag(plain: Plain) -> Plain {
    match plain {
        Plain::Object(mut map) if tags::tag_name(&map).is_some() && !tags::is_known(&map) => {
            map.remove(VALUE_KEY).unwrap_or(Plain::Null)
        }
        other => other,
    }
}
