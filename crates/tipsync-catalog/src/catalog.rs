//! In-memory help-text catalog

use indexmap::IndexMap;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tipsync_schema::{FieldCode, TypeCode};

/// Help text shown for one field. May be empty and may carry simple markup
/// (`<b>`, `<p>`); the catalog never interprets it.
pub type HelpText = String;

/// Field code → help text for one element type
pub type FieldTexts = IndexMap<FieldCode, HelpText>;

/// Two-level mapping: element type → field → help text.
///
/// Insertion order is kept for deterministic output, but equality ignores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    types: IndexMap<TypeCode, FieldTexts>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper adding an element type with its entries
    pub fn with_type<I, F, T>(mut self, type_code: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let fields = self.types.entry(type_code.into()).or_default();
        for (field, text) in entries {
            fields.insert(field.into(), text.into());
        }
        self
    }

    /// Help text of a field
    pub fn get(&self, type_code: &str, field_code: &str) -> Option<&str> {
        self.types
            .get(type_code)
            .and_then(|fields| fields.get(field_code))
            .map(String::as_str)
    }

    /// All entries of an element type
    pub fn fields(&self, type_code: &str) -> Option<&FieldTexts> {
        self.types.get(type_code)
    }

    pub fn contains_type(&self, type_code: &str) -> bool {
        self.types.contains_key(type_code)
    }

    pub fn contains_field(&self, type_code: &str, field_code: &str) -> bool {
        self.types
            .get(type_code)
            .is_some_and(|fields| fields.contains_key(field_code))
    }

    /// Add an element type without entries. Returns `false` if it already
    /// existed, in which case nothing changes.
    pub fn insert_type(&mut self, type_code: impl Into<String>) -> bool {
        match self.types.entry(type_code.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(FieldTexts::new());
                true
            }
        }
    }

    /// Insert or replace the help text of a field, creating the element
    /// type when needed. Returns the previous text.
    pub fn insert(
        &mut self,
        type_code: impl Into<String>,
        field_code: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<HelpText> {
        self.types
            .entry(type_code.into())
            .or_default()
            .insert(field_code.into(), text.into())
    }

    /// Entries for an element type, created empty when absent
    pub(crate) fn fields_mut(&mut self, type_code: &str) -> &mut FieldTexts {
        self.types.entry(type_code.to_string()).or_default()
    }

    /// Element type codes, in insertion order
    pub fn type_codes(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldTexts)> {
        self.types.iter().map(|(code, fields)| (code.as_str(), fields))
    }

    /// Number of element types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total number of field entries
    pub fn field_count(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }

    /// Entries whose help text is empty or whitespace only
    pub fn blank_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().flat_map(|(type_code, fields)| {
            fields
                .iter()
                .filter(|(_, text)| text.trim().is_empty())
                .map(move |(field, _)| (type_code, field.as_str()))
        })
    }

    /// Copy with element types and fields sorted lexicographically
    pub fn sorted(&self) -> Catalog {
        let mut types = self.types.clone();
        types.sort_keys();
        for fields in types.values_mut() {
            fields.sort_keys();
        }
        Catalog { types }
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// Rejects repeated keys that a plain map deserializer would silently merge
struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = Catalog;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping from element type to field help texts")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Catalog, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut catalog = Catalog::new();
        while let Some(type_code) = map.next_key::<String>()? {
            if catalog.contains_type(&type_code) {
                return Err(de::Error::custom(format!(
                    "element type '{type_code}' appears more than once"
                )));
            }
            let fields = map.next_value_seed(FieldTextsSeed {
                type_code: &type_code,
            })?;
            catalog.types.insert(type_code, fields);
        }
        Ok(catalog)
    }
}

struct FieldTextsSeed<'a> {
    type_code: &'a str,
}

impl<'de> DeserializeSeed<'de> for FieldTextsSeed<'_> {
    type Value = FieldTexts;

    fn deserialize<D>(self, deserializer: D) -> Result<FieldTexts, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for FieldTextsSeed<'_> {
    type Value = FieldTexts;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a mapping from field code to help text for element type '{}'",
            self.type_code
        )
    }

    fn visit_map<A>(self, mut map: A) -> Result<FieldTexts, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = FieldTexts::new();
        while let Some(field_code) = map.next_key::<String>()? {
            if fields.contains_key(&field_code) {
                return Err(de::Error::custom(format!(
                    "field '{field_code}' appears more than once in element type '{}'",
                    self.type_code
                )));
            }
            let text: String = map.next_value()?;
            fields.insert(field_code, text);
        }
        Ok(fields)
    }
}
