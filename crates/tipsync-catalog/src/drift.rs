//! Drift detection between the catalog and the live schema

use crate::catalog::Catalog;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tipsync_schema::{FieldCode, Schema, TypeCode};
use tracing::debug;

/// Differences between a catalog and a schema.
///
/// Per-type maps only hold types with at least one entry. Identifiers are
/// kept in schema (or catalog) order; renderers sort them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    /// Types defined by the schema but absent from the catalog
    pub new_types: Vec<TypeCode>,
    /// Schema fields with no catalog entry, per type (new types included)
    pub undocumented: IndexMap<TypeCode, Vec<FieldCode>>,
    /// Catalog types the schema no longer defines
    pub stale_types: Vec<TypeCode>,
    /// Catalog fields the schema no longer defines, for types still in the schema
    pub stale_fields: IndexMap<TypeCode, Vec<FieldCode>>,
    /// Schema fields whose catalog entry is empty
    pub blank: IndexMap<TypeCode, Vec<FieldCode>>,
}

/// Counts of every drift category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriftSummary {
    pub new_types: usize,
    pub undocumented_fields: usize,
    pub stale_types: usize,
    pub stale_fields: usize,
    pub blank_fields: usize,
}

impl fmt::Display for DriftSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "new types: {}, undocumented fields: {}, stale types: {}, stale fields: {}, blank fields: {}",
            self.new_types,
            self.undocumented_fields,
            self.stale_types,
            self.stale_fields,
            self.blank_fields
        )
    }
}

impl DriftReport {
    /// Whether any live field or type lacks a catalog entry
    pub fn has_missing(&self) -> bool {
        !self.new_types.is_empty() || !self.undocumented.is_empty()
    }

    /// Whether the catalog holds entries the schema no longer defines
    pub fn has_stale(&self) -> bool {
        !self.stale_types.is_empty() || !self.stale_fields.is_empty()
    }

    pub fn has_blank(&self) -> bool {
        !self.blank.is_empty()
    }

    /// No missing and no stale entries; blank entries do not count as drift
    pub fn is_in_sync(&self) -> bool {
        !self.has_missing() && !self.has_stale()
    }

    pub fn undocumented_for(&self, type_code: &str) -> &[FieldCode] {
        self.undocumented.get(type_code).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn stale_fields_for(&self, type_code: &str) -> &[FieldCode] {
        self.stale_fields.get(type_code).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn blank_for(&self, type_code: &str) -> &[FieldCode] {
        self.blank.get(type_code).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_new_type(&self, type_code: &str) -> bool {
        self.new_types.iter().any(|t| t == type_code)
    }

    pub fn is_stale_type(&self, type_code: &str) -> bool {
        self.stale_types.iter().any(|t| t == type_code)
    }

    pub fn summary(&self) -> DriftSummary {
        fn total(map: &IndexMap<TypeCode, Vec<FieldCode>>) -> usize {
            map.values().map(Vec::len).sum()
        }

        DriftSummary {
            new_types: self.new_types.len(),
            undocumented_fields: total(&self.undocumented),
            stale_types: self.stale_types.len(),
            stale_fields: total(&self.stale_fields),
            blank_fields: total(&self.blank),
        }
    }

    /// Every type code mentioned by the report, sorted and deduplicated
    pub fn type_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .new_types
            .iter()
            .chain(&self.stale_types)
            .chain(self.undocumented.keys())
            .chain(self.stale_fields.keys())
            .chain(self.blank.keys())
            .map(String::as_str)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

/// Compare a catalog against the live schema. Total and pure.
pub fn diff(catalog: &Catalog, schema: &Schema) -> DriftReport {
    let mut report = DriftReport::default();

    for (type_code, fields) in schema.iter() {
        let Some(documented) = catalog.fields(type_code) else {
            report.new_types.push(type_code.to_string());
            if !fields.is_empty() {
                report
                    .undocumented
                    .insert(type_code.to_string(), fields.iter().cloned().collect());
            }
            continue;
        };

        let mut undocumented = Vec::new();
        let mut blank = Vec::new();
        for field in fields {
            match documented.get(field) {
                None => undocumented.push(field.clone()),
                Some(text) if text.trim().is_empty() => blank.push(field.clone()),
                Some(_) => {}
            }
        }

        let stale: Vec<FieldCode> = documented
            .keys()
            .filter(|field| !fields.contains(field.as_str()))
            .cloned()
            .collect();

        if !undocumented.is_empty() {
            report.undocumented.insert(type_code.to_string(), undocumented);
        }
        if !blank.is_empty() {
            report.blank.insert(type_code.to_string(), blank);
        }
        if !stale.is_empty() {
            report.stale_fields.insert(type_code.to_string(), stale);
        }
    }

    report.stale_types = catalog
        .type_codes()
        .filter(|type_code| !schema.contains_type(type_code))
        .map(str::to_string)
        .collect();

    debug!("Drift: {}", report.summary());
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undocumented_field() {
        let schema = Schema::new().with_type("switch", ["ref", "closed"]);
        let catalog = Catalog::new().with_type("switch", [("ref", "identifier")]);

        let drift = diff(&catalog, &schema);

        assert_eq!(drift.undocumented_for("switch"), ["closed"]);
        assert!(drift.new_types.is_empty());
        assert!(!drift.has_stale());
        assert!(drift.has_missing());
    }

    #[test]
    fn test_stale_type() {
        let schema = Schema::new().with_type("fuse", ["Un"]);
        let catalog = Catalog::new()
            .with_type("fuse", [("Un", "x")])
            .with_type("relay", [("ref", "y")]);

        let drift = diff(&catalog, &schema);

        assert_eq!(drift.stale_types, vec!["relay"]);
        assert!(!drift.has_missing());
        assert!(drift.stale_fields.is_empty());
        assert!(!drift.is_in_sync());
    }

    #[test]
    fn test_new_type_lists_all_its_fields() {
        let schema = Schema::new()
            .with_type("fuse", ["Un"])
            .with_type("contactor", ["In"]);
        let catalog = Catalog::new().with_type("fuse", [("Un", "x")]);

        let drift = diff(&catalog, &schema);

        assert_eq!(drift.new_types, vec!["contactor"]);
        assert_eq!(drift.undocumented_for("contactor"), ["In"]);
        assert!(drift.is_new_type("contactor"));
    }

    #[test]
    fn test_stale_and_blank_fields() {
        let schema = Schema::new().with_type("line", ["ref", "length", "R"]);
        let catalog = Catalog::new().with_type(
            "line",
            [("ref", "Name"), ("length", ""), ("R", " "), ("X0", "old")],
        );

        let drift = diff(&catalog, &schema);

        assert_eq!(drift.stale_fields_for("line"), ["X0"]);
        assert_eq!(drift.blank_for("line"), ["length", "R"]);
        assert!(drift.undocumented.is_empty());
        assert!(drift.has_blank());
    }

    #[test]
    fn test_in_sync() {
        let schema = Schema::new().with_type("busbar", ["Un"]);
        let catalog = Catalog::new().with_type("busbar", [("Un", "Nominal voltage")]);

        let drift = diff(&catalog, &schema);
        assert!(drift.is_in_sync());
        assert_eq!(drift, DriftReport::default());
    }

    #[test]
    fn test_new_type_without_fields_is_not_undocumented() {
        let schema = Schema::new().with_type("node", Vec::<String>::new());
        let drift = diff(&Catalog::new(), &schema);

        assert_eq!(drift.new_types, vec!["node"]);
        assert!(drift.undocumented.is_empty());
        assert!(drift.has_missing());
    }

    #[test]
    fn test_summary_and_type_codes() {
        let schema = Schema::new()
            .with_type("switch", ["ref", "closed"])
            .with_type("contactor", ["In", "Un"]);
        let catalog = Catalog::new()
            .with_type("switch", [("ref", ""), ("old", "x")])
            .with_type("relay", [("ref", "y")]);

        let drift = diff(&catalog, &schema);
        let summary = drift.summary();

        assert_eq!(
            summary,
            DriftSummary {
                new_types: 1,
                undocumented_fields: 3,
                stale_types: 1,
                stale_fields: 1,
                blank_fields: 1,
            }
        );
        assert_eq!(drift.type_codes(), vec!["contactor", "relay", "switch"]);
    }
}
