//! Registry definition loader
//!
//! Reads a declarative description of the element models from YAML or JSON
//! and turns it into an [`ElementRegistry`] of [`ElementDefinition`]s.

use crate::model::{ElementDefinition, FieldDefinition, FieldKind};
use crate::registry::ElementRegistry;
use crate::{RegistryError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, trace};

/// Serializable registry format for loading from files
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    element_types: Vec<ElementFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementFile {
    code: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    fields: Vec<FieldFile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldFile {
    /// Bare field code, a text field
    Code(String),
    Detailed(FieldDetail),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDetail {
    code: String,
    #[serde(default)]
    kind: FieldKind,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    enabled_by: Option<String>,
}

impl From<FieldFile> for FieldDefinition {
    fn from(file: FieldFile) -> Self {
        match file {
            FieldFile::Code(code) => FieldDefinition::new(code),
            FieldFile::Detailed(detail) => {
                let mut field = FieldDefinition::new(detail.code).with_kind(detail.kind);
                field.unit = detail.unit;
                field.choices = detail.choices;
                field.enabled_by = detail.enabled_by;
                field
            }
        }
    }
}

/// Loader for registry definition files
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryLoader;

impl RegistryLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a registry from a file; `.json` files are read as JSON,
    /// anything else as YAML.
    pub fn load_from_file(&self, path: &Path) -> Result<ElementRegistry> {
        trace!("Loading registry definition from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if path.extension().is_some_and(|e| e == "json") {
            self.load_from_json(&content)
        } else {
            self.load_from_yaml(&content)
        }
    }

    /// Load a registry from a YAML string
    pub fn load_from_yaml(&self, yaml: &str) -> Result<ElementRegistry> {
        let file: RegistryFile = serde_yaml::from_str(yaml)
            .map_err(|e| RegistryError::InvalidFormat(format!("YAML parse error: {e}")))?;
        Ok(self.convert_registry_file(file))
    }

    /// Load a registry from a JSON string
    pub fn load_from_json(&self, json: &str) -> Result<ElementRegistry> {
        let file: RegistryFile = serde_json::from_str(json)
            .map_err(|e| RegistryError::InvalidFormat(format!("JSON parse error: {e}")))?;
        Ok(self.convert_registry_file(file))
    }

    /// Duplicates are kept as declared so that `schema_of` can report them.
    fn convert_registry_file(&self, file: RegistryFile) -> ElementRegistry {
        let mut registry = ElementRegistry::new();

        for element in file.element_types {
            let definition = ElementDefinition {
                type_code: element.code,
                description: element.description,
                fields: element.fields.into_iter().map(Into::into).collect(),
                requires: element.requires,
            };
            registry.register(definition);
        }

        debug!("Loaded registry with {} element models", registry.len());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::schema_of;
    use crate::settings::ProjectSettings;

    const REGISTRY_YAML: &str = r#"
element_types:
  - code: switch
    description: Load-break switch
    fields:
      - ref
      - code: closed
        kind: boolean
  - code: line
    requires: [frequency]
    fields:
      - ref
      - code: length
        kind: float
        unit: km
      - code: T_op
        kind: float
        unit: degC
        enabled_by: thermal
"#;

    #[test]
    fn test_load_from_yaml() {
        let registry = RegistryLoader::new().load_from_yaml(REGISTRY_YAML).unwrap();
        assert_eq!(registry.len(), 2);

        let settings = ProjectSettings::new().with("frequency", "50");
        let schema = schema_of(&registry, &settings).unwrap();

        let line: Vec<_> = schema.fields("line").unwrap().iter().collect();
        assert_eq!(line, vec!["ref", "length"]);
        assert!(schema.contains_field("switch", "closed"));
    }

    #[test]
    fn test_ambient_settings_drive_instantiation() {
        let registry = RegistryLoader::new().load_from_yaml(REGISTRY_YAML).unwrap();

        let err = schema_of(&registry, &ProjectSettings::new()).unwrap_err();
        assert_eq!(err.type_code(), Some("line"));

        let settings = ProjectSettings::new()
            .with("frequency", "50")
            .with("thermal", "yes");
        let schema = schema_of(&registry, &settings).unwrap();
        assert!(schema.contains_field("line", "T_op"));
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"element_types": [{"code": "fuse", "fields": ["ref", {"code": "In", "kind": "float", "unit": "A"}]}]}"#;
        let registry = RegistryLoader::new().load_from_json(json).unwrap();

        let schema = schema_of(&registry, &ProjectSettings::new()).unwrap();
        assert!(schema.contains_field("fuse", "In"));
    }

    #[test]
    fn test_duplicate_field_survives_loading() {
        let yaml = "element_types:\n  - code: fuse\n    fields: [In, In]\n";
        let registry = RegistryLoader::new().load_from_yaml(yaml).unwrap();

        let err = schema_of(&registry, &ProjectSettings::new()).unwrap_err();
        assert_eq!(err, RegistryError::duplicate_field("fuse", "In"));
    }

    #[test]
    fn test_malformed_registry_is_rejected() {
        let result = RegistryLoader::new().load_from_yaml("element_types: 42");
        assert!(matches!(result, Err(RegistryError::InvalidFormat(_))));

        let result = RegistryLoader::new().load_from_yaml("element_types:\n  - fields: [a]\n");
        assert!(matches!(result, Err(RegistryError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = RegistryLoader::new().load_from_file(Path::new("/nonexistent/registry.yaml"));
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }
}
