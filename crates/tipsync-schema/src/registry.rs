//! Element registry and schema snapshots

use crate::model::{ElementModel, FieldCode, TypeCode};
use crate::settings::ProjectSettings;
use crate::{RegistryError, Result};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, trace};

/// Registry of live element models, in registration order
#[derive(Default)]
pub struct ElementRegistry {
    models: Vec<Box<dyn ElementModel>>,
}

impl ElementRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Register a model
    pub fn register(&mut self, model: impl ElementModel + 'static) {
        self.models.push(Box::new(model));
    }

    /// Builder-style register
    pub fn with_model(mut self, model: impl ElementModel + 'static) -> Self {
        self.register(model);
        self
    }

    /// Check if a model with the given type code is registered
    pub fn contains(&self, type_code: &str) -> bool {
        self.models.iter().any(|m| m.type_code() == type_code)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn models(&self) -> &[Box<dyn ElementModel>] {
        &self.models
    }
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.models.iter().map(|m| m.type_code()))
            .finish()
    }
}

/// Immutable snapshot of the live schema: element type → ordered field codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    types: IndexMap<TypeCode, IndexSet<FieldCode>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element type with its fields. Repeated field codes collapse
    /// into one; use [`schema_of`] to reject them instead.
    pub fn with_type<I, S>(mut self, type_code: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types
            .entry(type_code.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Field codes of an element type, in declaration order
    pub fn fields(&self, type_code: &str) -> Option<&IndexSet<FieldCode>> {
        self.types.get(type_code)
    }

    pub fn contains_type(&self, type_code: &str) -> bool {
        self.types.contains_key(type_code)
    }

    pub fn contains_field(&self, type_code: &str, field_code: &str) -> bool {
        self.types
            .get(type_code)
            .is_some_and(|fields| fields.contains(field_code))
    }

    /// Element type codes, in registry order
    pub fn type_codes(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<FieldCode>)> {
        self.types.iter().map(|(code, fields)| (code.as_str(), fields))
    }

    /// Number of element types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total number of (type, field) pairs
    pub fn field_count(&self) -> usize {
        self.types.values().map(IndexSet::len).sum()
    }
}

/// Derive the schema of every registered model under the given settings.
///
/// # Errors
///
/// Fails on the first model that cannot be instantiated, that declares a
/// field code twice, or whose type code was already registered. No partial
/// schema is returned.
pub fn schema_of(registry: &ElementRegistry, settings: &ProjectSettings) -> Result<Schema> {
    let mut types: IndexMap<TypeCode, IndexSet<FieldCode>> = IndexMap::new();

    for model in registry.models() {
        let type_code = model.type_code();
        if types.contains_key(type_code) {
            return Err(RegistryError::duplicate_type(type_code));
        }

        let declared = model.instantiate(settings)?;
        trace!("Instantiated {} with {} fields", type_code, declared.len());

        let mut fields = IndexSet::with_capacity(declared.len());
        for field in declared {
            if fields.contains(&field) {
                return Err(RegistryError::duplicate_field(type_code, field));
            }
            fields.insert(field);
        }

        types.insert(type_code.to_string(), fields);
    }

    let schema = Schema { types };
    debug!(
        "Derived schema with {} element types and {} fields",
        schema.len(),
        schema.field_count()
    );
    Ok(schema)
}
