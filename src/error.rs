//! Error types for the settings model.
//!
//! Library modules return [`Error`] through the [`Result`] alias, while the
//! CLI uses `anyhow` for convenient propagation.
//!
//! # Taxonomy
//!
//! - [`Error::NotFound`]: a key, dynamic field or service name is absent
//! - [`Error::Validation`]: a service descriptor breaks its field contract,
//!   or a selection cannot be resolved
//! - [`Error::ImmutableField`]: assignment to a selection field other than
//!   `category` / `name`
//! - [`Error::ConfigLoad`]: anything that went wrong while loading the
//!   settings document; the only error `load` surfaces
//!
//! # Example
//!
//! ```ignore
//! use settings_tree::error::{Error, Result};
//!
//! fn base_url(settings: &Settings) -> Result<Value> {
//!     settings.translator.now_using("base_url")
//! }
//! ```

/// Settings result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level settings error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key or attribute absent
    #[error("'{name}' not found in {scope}")]
    NotFound { scope: String, name: String },

    /// Field contract or selection resolution failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Direct assignment to a read-through attribute
    #[error("Cannot set '{0}' directly on a selection; only 'category' and 'name' are assignable")]
    ImmutableField(String),

    /// Failure while reading or parsing the settings document
    #[error("Error loading settings: {0}")]
    ConfigLoad(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document serialization error
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config load error.
    pub fn config_load(message: impl Into<String>) -> Self {
        Self::ConfigLoad(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a not-found error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether this error (or the error it wraps) is a validation error.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_yaml::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Serialize(e).context(ctx))
    }
}
