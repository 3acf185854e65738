#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # tipsync-catalog
//!
//! Help-text catalog store, drift detection and stub regeneration.
//!
//! The catalog maps element type → field → help text. This crate loads it
//! from its persisted literal form, compares it with the live [`Schema`]
//! derived by `tipsync-schema`, and produces a non-destructive regenerated
//! catalog in which every live field has an entry.
//!
//! ## Example Usage
//!
//! ```rust
//! use tipsync_catalog::{diff, load, regenerate, serialize};
//! use tipsync_schema::Schema;
//!
//! let schema = Schema::new().with_type("switch", ["ref", "closed"]);
//! let catalog = load(r#"{ "switch": { "ref": "identifier", }, }"#).unwrap();
//!
//! let drift = diff(&catalog, &schema);
//! assert_eq!(drift.undocumented_for("switch"), ["closed"]);
//!
//! let regenerated = regenerate(&catalog, &schema);
//! assert_eq!(regenerated.get("switch", "ref"), Some("identifier"));
//! assert_eq!(regenerated.get("switch", "closed"), Some(""));
//! assert!(serialize(&regenerated).contains("\"closed\": \"\","));
//! ```

pub mod catalog;
pub mod drift;
pub mod literal;
pub mod regenerate;
pub mod reporter;
pub mod store;

pub use catalog::{Catalog, HelpText};
pub use drift::{DriftReport, DriftSummary, diff};
pub use literal::{CatalogDocument, LiteralWriter, parse_literal};
pub use regenerate::regenerate;
pub use reporter::{DriftReporter, ReportFormat};
pub use store::{CatalogFormat, CatalogStore, KeyOrder};

use thiserror::Error;
use tipsync_schema::Schema;

/// Errors raised while reading or writing a persisted catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogFormatError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("element type '{type_code}' appears more than once (line {line})")]
    DuplicateType { type_code: String, line: usize },

    #[error("field '{field_code}' appears more than once in element type '{type_code}' (line {line})")]
    DuplicateField {
        type_code: String,
        field_code: String,
        line: usize,
    },

    #[error("malformed entry '{key}' at line {line}: {reason}")]
    MalformedEntry {
        key: String,
        line: usize,
        reason: String,
    },

    #[error("invalid {format} catalog: {message}")]
    Document { format: CatalogFormat, message: String },

    #[error("failed to serialize catalog as {format}: {message}")]
    Serialize { format: CatalogFormat, message: String },
}

impl CatalogFormatError {
    /// Create a syntax error at a source position
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a malformed-entry error for the given key
    pub fn malformed(key: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            key: key.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Source line the error points at, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. }
            | Self::DuplicateType { line, .. }
            | Self::DuplicateField { line, .. }
            | Self::MalformedEntry { line, .. } => Some(*line),
            Self::Document { .. } | Self::Serialize { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogFormatError>;

/// Parse a catalog in the persisted literal notation
///
/// # Errors
///
/// Returns a [`CatalogFormatError`] on key collisions or malformed entries.
pub fn load(source: &str) -> Result<Catalog> {
    CatalogStore::new().load(source)
}

/// Render a catalog in the persisted literal notation, insertion order
pub fn serialize(catalog: &Catalog) -> String {
    LiteralWriter::new().write(catalog)
}

/// Result of one synchronization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub drift: DriftReport,
    pub regenerated: Catalog,
}

impl SyncOutcome {
    /// Whether regeneration changed anything compared to `original`
    pub fn changes(&self, original: &Catalog) -> bool {
        &self.regenerated != original
    }
}

/// Diff the catalog against the schema and regenerate it in one pass
pub fn synchronize(catalog: &Catalog, schema: &Schema) -> SyncOutcome {
    SyncOutcome {
        drift: diff(catalog, schema),
        regenerated: regenerate(catalog, schema),
    }
}
