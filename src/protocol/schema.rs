use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter types understood by the function-calling backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    Unspecified,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// JSON-Schema-like description of a function parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: ParamType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Primitive format hint (`enum`, `int64`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ParameterSchema>,

    /// Names of required properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ParameterSchema {
    pub fn of(kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self {
            kind: ParamType::Object,
            ..Default::default()
        }
    }

    /// String restricted to a fixed set of values
    pub fn enumeration(description: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            kind: ParamType::String,
            description: Some(description.into()),
            format: Some("enum".to_string()),
            enum_values: Some(values),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: ParameterSchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_required(mut self, names: Vec<String>) -> Self {
        self.required = Some(names);
        self
    }
}

/// One extractable operation offered to the function-calling backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Conventionally `update_<field identifier>`
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl FunctionDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}
