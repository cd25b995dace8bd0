//! Declarations and persisted state
//!
//! A [`Declaration`] is decoded from a configuration, plan or prior-state
//! blob against a [`Schema`]. Every attribute of the schema is present after
//! decoding (absent ones become `null`) and attributes the schema does not
//! know are rejected.

use super::error::ValidationError;
use super::schema::{Role, Schema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder printed instead of sensitive values
pub const REDACTED: &str = "<sensitive>";

/// Where a blob came from, which decides how strictly roles are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationSource {
    /// Written by the user: required inputs must be set, computed outputs must not
    Config,
    /// Planned by the host: required inputs must be set, computed outputs may
    /// carry prior values and are ignored
    Plan,
    /// Previously persisted state: shape and types only
    State,
}

/// Decoded attribute set for one resource instance
#[derive(Clone)]
pub struct Declaration {
    schema: &'static Schema,
    values: BTreeMap<String, Value>,
}

impl Declaration {
    /// A declaration with every attribute null
    pub fn empty(schema: &'static Schema) -> Self {
        let values = schema
            .attribute_names()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        Self { schema, values }
    }

    /// Decode and validate a JSON object against the schema.
    /// All violations are collected rather than stopping at the first.
    pub fn decode(
        schema: &'static Schema,
        blob: &Value,
        source: DeclarationSource,
    ) -> Result<Self, Vec<ValidationError>> {
        let empty = Map::new();
        let object = match blob {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(vec![ValidationError::new(
                    "(root)",
                    format!("expected a JSON object, got {}", json_kind(other)),
                )])
            }
        };

        let mut errors = Vec::new();

        for key in object.keys() {
            if schema.attribute(key).is_none() {
                errors.push(ValidationError::new(key.as_str(), "unknown attribute"));
            }
        }

        let mut declaration = Self::empty(schema);
        for spec in schema.describe() {
            let value = object.get(&spec.name).cloned().unwrap_or(Value::Null);

            if !value.is_null() && !spec.scalar_type.matches(&value) {
                errors.push(ValidationError::new(
                    spec.name.as_str(),
                    format!(
                        "expected {}, got {}",
                        spec.scalar_type.as_str(),
                        json_kind(&value)
                    ),
                ));
                continue;
            }

            match (source, spec.role) {
                (DeclarationSource::Config, Role::ComputedOutput) if !value.is_null() => {
                    errors.push(ValidationError::new(
                        spec.name.as_str(),
                        "computed attribute cannot be set in configuration",
                    ));
                    continue;
                }
                (DeclarationSource::Config | DeclarationSource::Plan, Role::RequiredInput)
                    if value.is_null() =>
                {
                    errors.push(ValidationError::new(
                        spec.name.as_str(),
                        "required attribute is missing",
                    ));
                    continue;
                }
                _ => {}
            }

            declaration.values.insert(spec.name.clone(), value);
        }

        if errors.is_empty() {
            Ok(declaration)
        } else {
            Err(errors)
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of an attribute, `None` when null or not a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Non-empty string value, or a validation error naming the attribute
    pub fn require_str(&self, name: &str) -> Result<&str, ValidationError> {
        match self.get_str(name) {
            Some(s) if !s.is_empty() => Ok(s),
            Some(_) => Err(ValidationError::new(name, "must not be empty")),
            None => Err(ValidationError::new(name, "required attribute is missing")),
        }
    }

    /// Set an attribute the schema declares
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidationError> {
        let Some(spec) = self.schema.attribute(name) else {
            return Err(ValidationError::new(name, "unknown attribute"));
        };
        let value = value.into();
        if !value.is_null() && !spec.scalar_type.matches(&value) {
            return Err(ValidationError::new(
                name,
                format!("expected {}, got {}", spec.scalar_type.as_str(), json_kind(&value)),
            ));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Freeze into the state handed back to the host
    pub fn into_state(self) -> PersistedState {
        PersistedState {
            schema: self.schema,
            values: self.values,
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(redacted(self.schema, &self.values))
            .finish()
    }
}

/// Attributes written back after a successful operation
#[derive(Clone)]
pub struct PersistedState {
    schema: &'static Schema,
    values: BTreeMap<String, Value>,
}

impl PersistedState {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Compact JSON, attributes sorted by name
    pub fn to_json_string(&self) -> String {
        Value::Object(self.values.clone().into_iter().collect()).to_string()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone().into_iter().collect())
    }
}

impl PartialEq for PersistedState {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl fmt::Debug for PersistedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(redacted(self.schema, &self.values))
            .finish()
    }
}

fn redacted<'a>(
    schema: &'a Schema,
    values: &'a BTreeMap<String, Value>,
) -> impl Iterator<Item = (&'a String, Value)> + 'a {
    values.iter().map(move |(name, value)| {
        let sensitive = schema.attribute(name).map(|a| a.sensitive).unwrap_or(false);
        if sensitive && !value.is_null() {
            (name, Value::String(REDACTED.to_string()))
        } else {
            (name, value.clone())
        }
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::schema::{provider_schema, video_data_source_schema, video_resource_schema};
    use serde_json::json;

    #[test]
    fn test_missing_attributes_become_null() {
        let decl = Declaration::decode(
            video_data_source_schema(),
            &json!({"id": "abc"}),
            DeclarationSource::Config,
        )
        .unwrap();
        assert_eq!(decl.get_str("id"), Some("abc"));
        assert_eq!(decl.get("statistics"), Some(&Value::Null));
        assert_eq!(
            decl.values.len(),
            video_data_source_schema().describe().len()
        );
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let errors = Declaration::decode(
            video_resource_schema(),
            &json!({"id": "a", "title": "t", "description": "d", "tags": "x"}),
            DeclarationSource::State,
        )
        .unwrap_err();
        assert_eq!(errors, vec![ValidationError::new("tags", "unknown attribute")]);
    }

    #[test]
    fn test_config_rejects_computed_and_missing_required() {
        let errors = Declaration::decode(
            video_resource_schema(),
            &json!({"id": "a", "res": "x"}),
            DeclarationSource::Config,
        )
        .unwrap_err();
        let attrs: Vec<_> = errors.iter().map(|e| e.attribute.as_str()).collect();
        assert!(attrs.contains(&"title"));
        assert!(attrs.contains(&"description"));
        assert!(attrs.contains(&"res"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_plan_tolerates_computed() {
        let decl = Declaration::decode(
            video_resource_schema(),
            &json!({"id": "a", "title": "t", "description": "d", "res": "prior"}),
            DeclarationSource::Plan,
        )
        .unwrap();
        assert_eq!(decl.get_str("res"), Some("prior"));
    }

    #[test]
    fn test_state_allows_missing_required() {
        let decl = Declaration::decode(
            video_resource_schema(),
            &json!({"id": "a"}),
            DeclarationSource::State,
        )
        .unwrap();
        assert!(decl.get_str("title").is_none());
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let errors = Declaration::decode(
            video_resource_schema(),
            &json!({"id": 42, "title": "t", "description": "d"}),
            DeclarationSource::Config,
        )
        .unwrap_err();
        assert_eq!(errors[0].reason, "expected string, got number");
    }

    #[test]
    fn test_non_object_rejected() {
        let errors =
            Declaration::decode(video_resource_schema(), &json!([1]), DeclarationSource::State)
                .unwrap_err();
        assert_eq!(errors[0].attribute, "(root)");
    }

    #[test]
    fn test_require_str_rejects_empty() {
        let mut decl = Declaration::empty(video_resource_schema());
        assert!(decl.require_str("id").is_err());
        decl.set("id", "").unwrap();
        assert_eq!(decl.require_str("id").unwrap_err().reason, "must not be empty");
    }

    #[test]
    fn test_set_unknown_attribute() {
        let mut decl = Declaration::empty(video_resource_schema());
        assert!(decl.set("statistics", "x").is_err());
    }

    #[test]
    fn test_sensitive_values_redacted_in_debug() {
        let decl = Declaration::decode(
            provider_schema(),
            &json!({"access_token": "ya29.secret"}),
            DeclarationSource::Config,
        )
        .unwrap();
        let rendered = format!("{:?}", decl);
        assert!(!rendered.contains("ya29"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn test_state_json_is_sorted() {
        let mut decl = Declaration::empty(video_resource_schema());
        decl.set("title", "t").unwrap();
        decl.set("id", "a").unwrap();
        let state = decl.into_state();
        assert_eq!(
            state.to_json_string(),
            r#"{"description":null,"id":"a","res":null,"title":"t"}"#
        );
    }
}
