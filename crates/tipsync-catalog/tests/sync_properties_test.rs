//! Property tests for catalog synchronization
//!
//! Catalogs and schemas are generated from overlapping pools of element
//! type and field codes mixed with arbitrary identifiers, so every run
//! covers authored, missing and stale entries together. Help texts include
//! quotes, backslashes, line breaks, comment markers and YAML indicators.

use proptest::prelude::*;
use tipsync_catalog::{
    Catalog, CatalogFormat, CatalogStore, KeyOrder, diff, load, regenerate, serialize,
};
use tipsync_schema::Schema;

const TYPE_CODES: &[&str] = &["switch", "fuse", "relay", "busbar", "line"];
const FIELD_CODES: &[&str] = &["ref", "In", "Un", "closed", "curve"];

/// Characters that stress the literal, YAML and JSON encoders
const TRICKY: &str = r#"[a-zA-Z0-9 <>/#:,;={}\[\]"'\\\n\t~!&*?|%@-]"#;

fn code_strategy(pool: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(pool).prop_map(String::from),
        1 => prop::string::string_regex(&format!("{TRICKY}{{0,8}}")).unwrap(),
    ]
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => prop::sample::select(&["", "   ", "~", "null", "true", "16", "- item"][..])
            .prop_map(String::from),
        4 => prop::string::string_regex(&format!("{TRICKY}{{0,24}}")).unwrap(),
    ]
}

fn catalog_strategy() -> impl Strategy<Value = Catalog> {
    prop::collection::vec(
        (
            code_strategy(TYPE_CODES),
            prop::collection::vec((code_strategy(FIELD_CODES), text_strategy()), 0..5),
        ),
        0..5,
    )
    .prop_map(|types| {
        types
            .into_iter()
            .fold(Catalog::new(), |catalog, (type_code, entries)| {
                catalog.with_type(type_code, entries)
            })
    })
}

fn schema_strategy() -> impl Strategy<Value = Schema> {
    prop::collection::vec(
        (
            code_strategy(TYPE_CODES),
            prop::collection::vec(code_strategy(FIELD_CODES), 0..5),
        ),
        0..5,
    )
    .prop_map(|types| {
        types
            .into_iter()
            .fold(Schema::new(), |schema, (type_code, fields)| {
                schema.with_type(type_code, fields)
            })
    })
}

fn format_strategy() -> impl Strategy<Value = CatalogFormat> {
    prop::sample::select(&[CatalogFormat::Literal, CatalogFormat::Yaml, CatalogFormat::Json][..])
}

fn order_strategy() -> impl Strategy<Value = KeyOrder> {
    prop::sample::select(&[KeyOrder::Insertion, KeyOrder::Lexicographic][..])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn regenerate_is_idempotent(catalog in catalog_strategy(), schema in schema_strategy()) {
        let once = regenerate(&catalog, &schema);
        let twice = regenerate(&once, &schema);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(serialize(&once), serialize(&twice));
    }

    #[test]
    fn regenerate_never_alters_authored_text(
        catalog in catalog_strategy(),
        schema in schema_strategy(),
    ) {
        let regenerated = regenerate(&catalog, &schema);
        for (type_code, fields) in schema.iter() {
            for field in fields {
                if let Some(text) = catalog.get(type_code, field) {
                    prop_assert_eq!(regenerated.get(type_code, field), Some(text));
                }
            }
        }
    }

    #[test]
    fn regenerate_covers_every_schema_key(
        catalog in catalog_strategy(),
        schema in schema_strategy(),
    ) {
        let regenerated = regenerate(&catalog, &schema);
        for (type_code, fields) in schema.iter() {
            prop_assert!(regenerated.contains_type(type_code));
            for field in fields {
                prop_assert!(regenerated.contains_field(type_code, field));
            }
        }

        let drift = diff(&regenerated, &schema);
        prop_assert!(drift.undocumented.is_empty());
        prop_assert!(drift.new_types.is_empty());
    }

    #[test]
    fn regenerate_preserves_stale_entries(
        catalog in catalog_strategy(),
        schema in schema_strategy(),
    ) {
        let regenerated = regenerate(&catalog, &schema);
        for (type_code, fields) in catalog.iter() {
            prop_assert!(regenerated.contains_type(type_code));
            for (field, text) in fields {
                prop_assert_eq!(regenerated.get(type_code, field), Some(text.as_str()));
            }
        }

        let before = diff(&catalog, &schema);
        let after = diff(&regenerated, &schema);
        prop_assert_eq!(before.stale_types, after.stale_types);
        prop_assert_eq!(before.stale_fields, after.stale_fields);
    }

    #[test]
    fn regenerate_adds_only_empty_stubs(
        catalog in catalog_strategy(),
        schema in schema_strategy(),
    ) {
        let regenerated = regenerate(&catalog, &schema);
        prop_assert_eq!(
            regenerated.field_count(),
            catalog.field_count() + diff(&catalog, &schema).summary().undocumented_fields
        );
        for (type_code, fields) in regenerated.iter() {
            for (field, text) in fields {
                if !catalog.contains_field(type_code, field) {
                    prop_assert_eq!(text.as_str(), "");
                }
            }
        }
    }

    #[test]
    fn every_format_round_trips(
        catalog in catalog_strategy(),
        format in format_strategy(),
        order in order_strategy(),
    ) {
        let store = CatalogStore::new()
            .with_format(format)
            .with_order(order)
            .with_binding(Some("tooltips".to_string()));
        let text = store.serialize(&catalog).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reloaded = store.load(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&reloaded, &catalog, "{} {:?}\n{}", format, order, text);

        let literal = load(&serialize(&catalog)).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(literal, catalog);
    }
}

#[test]
fn switch_missing_closed_field() {
    let schema = Schema::new().with_type("switch", ["ref", "closed"]);
    let catalog = Catalog::new().with_type("switch", [("ref", "identifier")]);

    let drift = diff(&catalog, &schema);
    assert_eq!(drift.undocumented_for("switch"), ["closed"]);
    assert!(drift.new_types.is_empty());
    assert!(drift.stale_types.is_empty());
    assert!(drift.stale_fields.is_empty());

    let expected = Catalog::new().with_type("switch", [("ref", "identifier"), ("closed", "")]);
    assert_eq!(regenerate(&catalog, &schema), expected);
}

#[test]
fn relay_removed_from_registry() {
    let schema = Schema::new().with_type("fuse", ["Un"]);
    let catalog = Catalog::new()
        .with_type("fuse", [("Un", "x")])
        .with_type("relay", [("ref", "y")]);

    let drift = diff(&catalog, &schema);
    assert_eq!(drift.stale_types, vec!["relay"]);
    assert!(!drift.has_missing());

    let regenerated = regenerate(&catalog, &schema);
    assert_eq!(regenerated.fields("relay"), catalog.fields("relay"));
    assert_eq!(regenerated.fields("fuse"), catalog.fields("fuse"));
}

#[test]
fn contactor_added_to_registry() {
    let schema = Schema::new()
        .with_type("fuse", ["Un"])
        .with_type("contactor", ["In"]);
    let catalog = Catalog::new().with_type("fuse", [("Un", "x")]);

    let drift = diff(&catalog, &schema);
    assert_eq!(drift.new_types, vec!["contactor"]);
    assert_eq!(drift.undocumented_for("contactor"), ["In"]);

    let regenerated = regenerate(&catalog, &schema);
    assert_eq!(regenerated.fields("contactor").map(|f| f.len()), Some(1));
    assert_eq!(regenerated.get("contactor", "In"), Some(""));
}
