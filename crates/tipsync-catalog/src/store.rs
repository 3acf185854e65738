//! Catalog store: load and serialize the persisted catalog

use crate::catalog::Catalog;
use crate::literal::{CatalogDocument, LiteralWriter, parse_literal};
use crate::{CatalogFormatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Persisted notation of a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFormat {
    /// Hand-edited nested mapping literal
    #[default]
    Literal,
    Yaml,
    Json,
}

impl CatalogFormat {
    /// Pick the format from a file extension; unknown extensions are literal
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            Some("json") => Self::Json,
            _ => Self::Literal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown catalog format '{other}'")),
        }
    }
}

/// Order of element types and fields in serialized output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Keep insertion order (registry order after regeneration)
    #[default]
    Insertion,
    /// Sort types and fields lexicographically
    Lexicographic,
}

/// Loads and serializes catalogs in a configured format
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStore {
    format: CatalogFormat,
    order: KeyOrder,
    writer: LiteralWriter,
}

impl CatalogStore {
    /// Create a store for the literal notation with default layout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: CatalogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_order(mut self, order: KeyOrder) -> Self {
        self.order = order;
        self
    }

    /// Name the literal is bound to when serialized (literal format only)
    pub fn with_binding(mut self, binding: Option<String>) -> Self {
        self.writer.binding = binding;
        self
    }

    /// Spaces per nesting level (literal format only)
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.writer.indent = indent;
        self
    }

    pub fn format(&self) -> CatalogFormat {
        self.format
    }

    pub fn binding(&self) -> Option<&str> {
        self.writer.binding.as_deref()
    }

    /// Parse persisted catalog text
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogFormatError`] on key collisions or malformed entries.
    pub fn load(&self, source: &str) -> Result<Catalog> {
        self.load_document(source).map(|doc| doc.catalog)
    }

    /// Parse persisted catalog text, keeping the literal's binding name
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogFormatError`] on key collisions or malformed entries.
    pub fn load_document(&self, source: &str) -> Result<CatalogDocument> {
        let doc = match self.format {
            CatalogFormat::Literal => parse_literal(source)?,
            CatalogFormat::Yaml => CatalogDocument {
                binding: None,
                catalog: self.load_yaml(source)?,
            },
            CatalogFormat::Json => CatalogDocument {
                binding: None,
                catalog: serde_json::from_str(source).map_err(|e| self.document_error(e))?,
            },
        };
        debug!(
            "Loaded {} catalog with {} element types and {} fields",
            self.format,
            doc.catalog.len(),
            doc.catalog.field_count()
        );
        Ok(doc)
    }

    /// Render a catalog in the configured format and order
    ///
    /// # Errors
    ///
    /// Returns [`CatalogFormatError::Serialize`] if the YAML or JSON encoder fails.
    pub fn serialize(&self, catalog: &Catalog) -> Result<String> {
        let sorted;
        let catalog = match self.order {
            KeyOrder::Insertion => catalog,
            KeyOrder::Lexicographic => {
                sorted = catalog.sorted();
                &sorted
            }
        };

        match self.format {
            CatalogFormat::Literal => Ok(self.writer.write(catalog)),
            CatalogFormat::Yaml => {
                serde_yaml::to_string(catalog).map_err(|e| self.serialize_error(e))
            }
            CatalogFormat::Json => serde_json::to_string_pretty(catalog)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| self.serialize_error(e)),
        }
    }

    /// Plain YAML scalars deserialize into any string, so help texts are
    /// checked on the parsed value before conversion.
    fn load_yaml(&self, source: &str) -> Result<Catalog> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(|e| self.document_error(e))?;
        if value.is_null() {
            return Ok(Catalog::new());
        }

        if let Some(types) = value.as_mapping() {
            for (type_code, fields) in types {
                let Some(fields) = fields.as_mapping() else {
                    continue;
                };
                for (field_code, text) in fields {
                    if !text.is_string() {
                        return Err(self.document_error(format!(
                            "non-string help text for field {} of element type {}",
                            yaml_key(field_code),
                            yaml_key(type_code)
                        )));
                    }
                }
            }
        }

        serde_yaml::from_value(value).map_err(|e| self.document_error(e))
    }

    fn document_error(&self, e: impl fmt::Display) -> CatalogFormatError {
        CatalogFormatError::Document {
            format: self.format,
            message: e.to_string(),
        }
    }

    fn serialize_error(&self, e: impl fmt::Display) -> CatalogFormatError {
        CatalogFormatError::Serialize {
            format: self.format,
            message: e.to_string(),
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key.as_str() {
        Some(key) => format!("'{key}'"),
        None => format!("{key:?}"),
    }
}
