//! The in-memory settings tree.
//!
//! ```text
//! Settings
//! ├── js_path / js_scripts_path / work_dir   (optional paths)
//! └── translator: Translator
//!     ├── api_based: ApiServices             (name → ServiceDescriptor)
//!     ├── local_llm: LocalModels             (models: opaque Record)
//!     └── now_using: Selection               (category, name) → service
//! ```
//!
//! Every node also carries an extras [`Record`] for names outside its
//! schema, so hand-edited documents keep unknown keys across a save.

pub mod record;
pub mod schema;
pub mod selection;
pub mod service;
pub mod tags;
pub mod value;

use std::path::PathBuf;

use serde::{Serialize, Serializer};
use serde_json::Value as Plain;

pub use record::Record;
pub use schema::{Extensible, Field};
pub use selection::{ResolvedService, Selection, ServiceCategory, TranslatorId};
pub use service::{ApiServices, ServiceDescriptor};
pub use tags::{Tagged, TypeTag};
pub use value::Value;

use crate::error::{Error, Result};
use schema::{decode_node, encode_node};

// ============================================================================
// Local models
// ============================================================================

/// Locally hosted model groupings. Entries are opaque to this layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalModels {
    pub models: Record,
    pub extras: Record,
}

impl Extensible for LocalModels {
    const TYPE_NAME: &'static str = "LLMSettings";
    const FIELDS: &'static [&'static str] = &["models"];

    fn extras(&self) -> &Record {
        &self.extras
    }

    fn extras_mut(&mut self) -> &mut Record {
        &mut self.extras
    }

    fn encode_field(&self, name: &str) -> Option<Plain> {
        match name {
            "models" => Some(self.models.encode()),
            _ => None,
        }
    }

    fn decode_field(&mut self, name: &str, plain: Plain) -> Result<bool> {
        match name {
            "models" => self.models = Record::decode(plain)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Field for LocalModels {
    fn encode(&self) -> Plain {
        encode_node(self)
    }

    fn decode(plain: Plain) -> Result<Self> {
        decode_node(plain)
    }
}

// ============================================================================
// Translator
// ============================================================================

/// Translator configuration: service presets, local models and the active
/// selection.
///
/// The translator owns `now_using` and wires it to itself on construction,
/// decoding and cloning. A [`Selection`] moved in from elsewhere must go
/// through [`Translator::set_now_using`] or it will not resolve.
#[derive(Debug)]
pub struct Translator {
    pub api_based: ApiServices,
    pub local_llm: LocalModels,
    pub now_using: Selection,
    pub extras: Record,
    id: TranslatorId,
}

impl Translator {
    pub fn new() -> Self {
        Self::from_parts(ApiServices::default(), LocalModels::default(), Selection::default())
    }

    pub fn from_parts(
        api_based: ApiServices,
        local_llm: LocalModels,
        now_using: Selection,
    ) -> Self {
        let mut translator = Self {
            api_based,
            local_llm,
            now_using,
            extras: Record::new(),
            id: TranslatorId::next(),
        };
        translator.now_using.attach(translator.id);
        translator
    }

    pub fn id(&self) -> TranslatorId {
        self.id
    }

    /// Replace the selection and wire it to this translator.
    pub fn set_now_using(&mut self, mut selection: Selection) {
        selection.attach(self.id);
        self.now_using = selection;
    }

    /// Read an attribute of the currently selected service.
    pub fn now_using(&self, field: &str) -> Result<Value> {
        self.now_using.resolve_and_get(self, field)
    }

    /// The currently selected service.
    pub fn active_service(&self) -> Result<ResolvedService<'_>> {
        self.now_using.resolve(self)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Translator {
    /// The clone gets its own identity and its selection points at it.
    fn clone(&self) -> Self {
        let mut translator = Self::from_parts(
            self.api_based.clone(),
            self.local_llm.clone(),
            self.now_using.clone(),
        );
        translator.extras = self.extras.clone();
        translator
    }
}

impl PartialEq for Translator {
    fn eq(&self, other: &Self) -> bool {
        self.api_based == other.api_based
            && self.local_llm == other.local_llm
            && self.now_using == other.now_using
            && self.extras == other.extras
    }
}

impl Extensible for Translator {
    const TYPE_NAME: &'static str = "Translator";
    const FIELDS: &'static [&'static str] = &["api_based", "local_llm", "now_using"];

    fn extras(&self) -> &Record {
        &self.extras
    }

    fn extras_mut(&mut self) -> &mut Record {
        &mut self.extras
    }

    fn encode_field(&self, name: &str) -> Option<Plain> {
        match name {
            "api_based" => Some(Plain::Object(self.api_based.to_plain())),
            "local_llm" => Some(self.local_llm.encode()),
            "now_using" => Some(self.now_using.encode()),
            _ => None,
        }
    }

    fn decode_field(&mut self, name: &str, plain: Plain) -> Result<bool> {
        match name {
            "api_based" => {
                self.api_based = match plain {
                    Plain::Object(map) => ApiServices::from_plain(map)?,
                    Plain::Null => ApiServices::default(),
                    other => {
                        return Err(Error::validation(format!(
                            "api_based must be a mapping, got {other}"
                        )));
                    }
                }
            }
            "local_llm" => self.local_llm = LocalModels::decode(plain)?,
            "now_using" => self.now_using = Selection::decode(plain)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(&mut self) {
        self.now_using.attach(self.id);
    }
}

impl Field for Translator {
    fn encode(&self) -> Plain {
        encode_node(self)
    }

    fn decode(plain: Plain) -> Result<Self> {
        decode_node(plain)
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Application settings root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Path to the script runtime
    ///
    /// Relative paths are resolved against the current directory when saved.
    pub js_path: Option<PathBuf>,
    /// Directory holding user scripts, saved absolute like `js_path`
    pub js_scripts_path: Option<PathBuf>,
    /// Working directory for translation jobs, saved absolute like `js_path`
    pub work_dir: Option<PathBuf>,
    pub translator: Translator,
    pub extras: Record,
}

impl Extensible for Settings {
    const TYPE_NAME: &'static str = "Settings";
    const FIELDS: &'static [&'static str] =
        &["js_path", "js_scripts_path", "work_dir", "translator"];

    fn extras(&self) -> &Record {
        &self.extras
    }

    fn extras_mut(&mut self) -> &mut Record {
        &mut self.extras
    }

    fn encode_field(&self, name: &str) -> Option<Plain> {
        match name {
            "js_path" => Some(self.js_path.encode()),
            "js_scripts_path" => Some(self.js_scripts_path.encode()),
            "work_dir" => Some(self.work_dir.encode()),
            "translator" => Some(self.translator.encode()),
            _ => None,
        }
    }

    fn decode_field(&mut self, name: &str, plain: Plain) -> Result<bool> {
        match name {
            "js_path" => self.js_path = Field::decode(plain)?,
            "js_scripts_path" => self.js_scripts_path = Field::decode(plain)?,
            "work_dir" => self.work_dir = Field::decode(plain)?,
            "translator" => self.translator = Translator::decode(plain)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        crate::codec::tree_to_mapping(self).serialize(serializer)
    }
}
