//! Drift reporter

use crate::Result;
use crate::catalog::Catalog;
use crate::drift::DriftReport;
use crate::store::CatalogStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;

/// Output format of the drift report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// Machine-readable JSON document
    Json,
}

/// Renders drift reports and regenerated catalogs
#[derive(Debug, Clone, Default)]
pub struct DriftReporter {
    format: ReportFormat,
    store: CatalogStore,
}

impl DriftReporter {
    /// Create a text reporter emitting the literal catalog notation
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Store used by [`DriftReporter::emit`]
    pub fn with_store(mut self, store: CatalogStore) -> Self {
        self.store = store;
        self
    }

    /// Render a drift report. Identifiers are sorted lexicographically.
    pub fn report(&self, drift: &DriftReport) -> String {
        match self.format {
            ReportFormat::Text => render_text(drift),
            ReportFormat::Json => render_json(drift),
        }
    }

    /// Render a catalog in its persisted form
    ///
    /// # Errors
    ///
    /// Propagates serialization failures from the catalog store.
    pub fn emit(&self, catalog: &Catalog) -> Result<String> {
        self.store.serialize(catalog)
    }
}

fn sorted(fields: &[String]) -> Vec<&str> {
    let mut fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    fields.sort_unstable();
    fields
}

fn render_text(drift: &DriftReport) -> String {
    let mut out = String::new();

    if drift.is_in_sync() {
        out.push_str("catalog is in sync with the element registry\n");
    }

    for type_code in drift.type_codes() {
        if drift.is_new_type(type_code) {
            let _ = writeln!(out, "{type_code} (new type)");
        } else if drift.is_stale_type(type_code) {
            let _ = writeln!(out, "{type_code} (stale type)");
        } else {
            let _ = writeln!(out, "{type_code}");
        }

        for (label, fields) in [
            ("undocumented", drift.undocumented_for(type_code)),
            ("stale", drift.stale_fields_for(type_code)),
            ("blank", drift.blank_for(type_code)),
        ] {
            if !fields.is_empty() {
                let _ = writeln!(
                    out,
                    "  {label} ({}): {}",
                    fields.len(),
                    sorted(fields).join(", ")
                );
            }
        }
    }

    let _ = writeln!(out, "summary: {}", drift.summary());
    out
}

fn render_json(drift: &DriftReport) -> String {
    let by_type = |map: &indexmap::IndexMap<String, Vec<String>>| {
        let mut entries: Vec<(&str, Vec<&str>)> = map
            .iter()
            .map(|(type_code, fields)| (type_code.as_str(), sorted(fields)))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(type_code, fields)| (type_code.to_string(), json!(fields)))
            .collect::<serde_json::Map<_, _>>()
    };

    let document = json!({
        "in_sync": drift.is_in_sync(),
        "summary": drift.summary(),
        "new_types": sorted(&drift.new_types),
        "undocumented": by_type(&drift.undocumented),
        "stale_types": sorted(&drift.stale_types),
        "stale_fields": by_type(&drift.stale_fields),
        "blank": by_type(&drift.blank),
    });
    format!("{document:#}\n")
}
