//! Stub generation: merge the live schema into the catalog

use crate::catalog::{Catalog, FieldTexts};
use tipsync_schema::Schema;
use tracing::debug;

/// Produce a catalog holding an entry for every live (type, field) pair.
///
/// Missing entries get an empty help text. Existing entries, empty or not,
/// are copied unchanged, and entries the schema no longer defines are kept
/// so they can be reviewed by hand. Types follow schema order with stale
/// types appended; within a type, schema fields come first and stale fields
/// follow in their original order.
pub fn regenerate(catalog: &Catalog, schema: &Schema) -> Catalog {
    let mut regenerated = Catalog::new();
    let mut stubs = 0usize;

    for (type_code, fields) in schema.iter() {
        let existing = catalog.fields(type_code);
        let entries = regenerated.fields_mut(type_code);

        for field in fields {
            let text = existing.and_then(|e| e.get(field)).cloned();
            if text.is_none() {
                stubs += 1;
            }
            entries.insert(field.clone(), text.unwrap_or_default());
        }

        if let Some(existing) = existing {
            copy_missing(existing, entries);
        }
    }

    for (type_code, fields) in catalog.iter() {
        if !schema.contains_type(type_code) {
            copy_missing(fields, regenerated.fields_mut(type_code));
        }
    }

    debug!(
        "Regenerated catalog: {} element types, {} fields, {} new stubs",
        regenerated.len(),
        regenerated.field_count(),
        stubs
    );
    regenerated
}

fn copy_missing(from: &FieldTexts, into: &mut FieldTexts) {
    for (field, text) in from {
        if !into.contains_key(field) {
            into.insert(field.clone(), text.clone());
        }
    }
}
