//! Element model definitions

use crate::settings::ProjectSettings;
use crate::{RegistryError, Result};
use serde::{Deserialize, Serialize};

/// Identifier of a network element kind (`fuse`, `transformer`, ...)
pub type TypeCode = String;

/// Identifier of one configurable attribute of an element type
pub type FieldCode = String;

/// A live element model that can be instantiated to reveal its fields.
///
/// Implementations must not mutate shared state; the adapter may
/// instantiate a model any number of times.
pub trait ElementModel {
    /// Element type code of this model
    fn type_code(&self) -> &str;

    /// Instantiate the model with the ambient settings and return the field
    /// codes it declares, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Instantiation`] when the model cannot be
    /// built from the given settings.
    fn instantiate(&self, settings: &ProjectSettings) -> Result<Vec<FieldCode>>;
}

/// Value kind of a field, used by the GUI for editing and by the registry
/// file for documentation purposes only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
    Choice,
}

/// Definition of a single field of an element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub code: FieldCode,
    pub kind: FieldKind,
    pub unit: Option<String>,
    /// Allowed values of a [`FieldKind::Choice`] field
    pub choices: Vec<String>,
    /// Project setting flag that must be enabled for the field to exist
    pub enabled_by: Option<String>,
}

impl FieldDefinition {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind: FieldKind::Text,
            unit: None,
            choices: Vec::new(),
            enabled_by: None,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = FieldKind::Choice;
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn enabled_by(mut self, setting: impl Into<String>) -> Self {
        self.enabled_by = Some(setting.into());
        self
    }

    /// Whether the field exists under the given settings
    pub fn is_enabled(&self, settings: &ProjectSettings) -> bool {
        self.enabled_by
            .as_deref()
            .is_none_or(|setting| settings.flag(setting))
    }
}

/// Declarative element model, as read from a registry definition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDefinition {
    pub type_code: TypeCode,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    /// Project settings that must be present to instantiate the model
    pub requires: Vec<String>,
}

impl ElementDefinition {
    pub fn new(type_code: impl Into<String>) -> Self {
        Self {
            type_code: type_code.into(),
            description: None,
            fields: Vec::new(),
            requires: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add plain text fields by code
    pub fn with_fields<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(codes.into_iter().map(FieldDefinition::new));
        self
    }

    pub fn requires(mut self, setting: impl Into<String>) -> Self {
        self.requires.push(setting.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ElementModel for ElementDefinition {
    fn type_code(&self) -> &str {
        &self.type_code
    }

    fn instantiate(&self, settings: &ProjectSettings) -> Result<Vec<FieldCode>> {
        let missing = self
            .requires
            .iter()
            .find(|key| !settings.contains(key.as_str()));
        if let Some(missing) = missing {
            return Err(RegistryError::instantiation(
                &self.type_code,
                format!("missing project setting '{missing}'"),
            ));
        }

        Ok(self
            .fields
            .iter()
            .filter(|field| field.is_enabled(settings))
            .map(|field| field.code.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cable() -> ElementDefinition {
        ElementDefinition::new("cable")
            .requires("frequency")
            .with_fields(["ref", "length", "R"])
            .with_field(
                FieldDefinition::new("T_max")
                    .with_kind(FieldKind::Float)
                    .with_unit("degC")
                    .enabled_by("thermal"),
            )
    }

    #[test]
    fn test_instantiate_returns_fields_in_declaration_order() {
        let settings = ProjectSettings::new().with("frequency", "50");
        let fields = cable().instantiate(&settings).unwrap();
        assert_eq!(fields, vec!["ref", "length", "R"]);
    }

    #[test]
    fn test_optional_field_follows_setting_flag() {
        let settings = ProjectSettings::new()
            .with("frequency", "50")
            .with("thermal", "true");
        let fields = cable().instantiate(&settings).unwrap();
        assert_eq!(fields.last().map(String::as_str), Some("T_max"));
    }

    #[test]
    fn test_missing_required_setting_fails() {
        let err = cable().instantiate(&ProjectSettings::new()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::instantiation("cable", "missing project setting 'frequency'")
        );
    }

    #[test]
    fn test_choices_imply_choice_kind() {
        let field = FieldDefinition::new("state").with_choices(["open", "closed"]);
        assert_eq!(field.kind, FieldKind::Choice);
        assert_eq!(field.choices, vec!["open", "closed"]);
    }

    #[test]
    fn test_field_kind_deserializes_from_snake_case() {
        let kind: FieldKind = serde_yaml::from_str("boolean").unwrap();
        assert_eq!(kind, FieldKind::Boolean);
    }
}
