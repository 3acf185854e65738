//! # tipsync-schema
//!
//! Registry adapter for the element-model registry of a distribution network.
//!
//! Element models (switches, fuses, transformers, busbars, ...) only reveal
//! their field set once instantiated with the ambient project settings. This
//! crate instantiates every registered model with an explicit
//! [`ProjectSettings`] value and captures the result as an immutable
//! [`Schema`] snapshot: element type code → ordered field codes.

pub mod loader;
pub mod model;
pub mod registry;
pub mod settings;

pub use loader::RegistryLoader;
pub use model::{ElementDefinition, ElementModel, FieldCode, FieldDefinition, FieldKind, TypeCode};
pub use registry::{ElementRegistry, Schema, schema_of};
pub use settings::ProjectSettings;

use thiserror::Error;

/// Errors raised while deriving a schema from the element-model registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("element type '{type_code}' could not be instantiated: {reason}")]
    Instantiation { type_code: String, reason: String },

    #[error("element type '{type_code}' declares field '{field_code}' more than once")]
    DuplicateField {
        type_code: String,
        field_code: String,
    },

    #[error("element type '{type_code}' is registered more than once")]
    DuplicateType { type_code: String },

    #[error("invalid registry definition: {0}")]
    InvalidFormat(String),

    #[error("IO error reading '{path}': {message}")]
    Io { path: String, message: String },
}

impl RegistryError {
    /// Build an instantiation error for a model that rejected the settings.
    pub fn instantiation(type_code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            type_code: type_code.into(),
            reason: reason.into(),
        }
    }

    /// Build a duplicate-field error.
    pub fn duplicate_field(type_code: impl Into<String>, field_code: impl Into<String>) -> Self {
        Self::DuplicateField {
            type_code: type_code.into(),
            field_code: field_code.into(),
        }
    }

    /// Build a duplicate-type error.
    pub fn duplicate_type(type_code: impl Into<String>) -> Self {
        Self::DuplicateType {
            type_code: type_code.into(),
        }
    }

    /// Element type code the error refers to, if any.
    pub fn type_code(&self) -> Option<&str> {
        match self {
            Self::Instantiation { type_code, .. }
            | Self::DuplicateField { type_code, .. }
            | Self::DuplicateType { type_code } => Some(type_code),
            Self::InvalidFormat(_) | Self::Io { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
