//! Settings Tree - a dynamic, YAML-backed application settings model.
//!
//! The tree mixes schema-declared fields with arbitrary keys added at run
//! time. It holds translation service descriptors and a `now_using` selection
//! that reads through to the active service, and it persists to a
//! human-editable YAML document.
//!
//! ```ignore
//! use settings_tree::{store, Extensible};
//!
//! let mut settings = store::load_settings(path)?;
//! println!("{}", settings.translator.now_using("base_url")?);
//! settings.set("theme", "dark")?;
//! store::save_settings(path, &settings)?;
//! ```

pub mod cli;
pub mod codec;
pub mod error;
pub mod settings;
pub mod store;
#[cfg(test)]
pub mod test_utils;

pub use error::{Error, Result};
pub use settings::{
    ApiServices, Extensible, LocalModels, Record, Selection, ServiceCategory, ServiceDescriptor,
    Settings, Translator, Value,
};
