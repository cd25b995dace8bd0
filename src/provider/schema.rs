//! Schema Descriptor - load attribute sets from JSON
//!
//! The provider, resource and data source schemas are embedded JSON compiled
//! into the binary and parsed once into a process-wide registry.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded schema JSON (compiled into the binary)
const SCHEMA_FILE: &str = include_str!("../schemas/youtube.json");

/// Type name of the provider itself
pub const PROVIDER_TYPE_NAME: &str = "youtube";

/// Suffix shared by the video resource and the video data source
pub const VIDEO: &str = "video";

/// Full type name as seen by the host (`youtube_video`)
pub fn type_name(suffix: &str) -> String {
    format!("{}_{}", PROVIDER_TYPE_NAME, suffix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    String,
    Bool,
    Number,
}

impl ScalarType {
    /// Whether a non-null JSON value has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Number => "number",
        }
    }
}

/// Mutability class of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Caller must supply it
    RequiredInput,
    /// Caller may supply it
    OptionalInput,
    /// Filled in from the remote side; caller must not supply it
    ComputedOutput,
}

/// Attribute definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub scalar_type: ScalarType,
    pub role: Role,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub description: String,
}

impl AttributeSpec {
    pub fn is_computed(&self) -> bool {
        self.role == Role::ComputedOutput
    }
}

/// Schema definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub description: String,
    pub attributes: Vec<AttributeSpec>,
}

impl Schema {
    /// Every attribute, in declaration order
    pub fn describe(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn computed_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.is_computed())
    }
}

/// Root structure of schemas/youtube.json
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRegistry {
    pub provider: Schema,
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
    #[serde(default)]
    pub data_sources: HashMap<String, Schema>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// Get the schema registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static SchemaRegistry {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(SCHEMA_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded schema JSON: {}", e))
    })
}

pub fn provider_schema() -> &'static Schema {
    &get_registry().provider
}

/// Get a resource schema by suffix (`video`)
pub fn resource_schema(suffix: &str) -> Option<&'static Schema> {
    get_registry().resources.get(suffix)
}

/// Get a data source schema by suffix (`video`)
pub fn data_source_schema(suffix: &str) -> Option<&'static Schema> {
    get_registry().data_sources.get(suffix)
}

/// The partially-mutable projection managed by the video resource
pub fn video_resource_schema() -> &'static Schema {
    resource_schema(VIDEO).unwrap_or_else(|| panic!("embedded schema lacks resource {}", VIDEO))
}

/// The read-only projection served by the video data source
pub fn video_data_source_schema() -> &'static Schema {
    data_source_schema(VIDEO)
        .unwrap_or_else(|| panic!("embedded schema lacks data source {}", VIDEO))
}
