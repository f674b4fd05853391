//! Projection of function calls onto form fields.
//!
//! Function definitions named `update_<identifier>` each drive one form
//! field. Confirmed calls set a field's value, pending drafts set it
//! tentatively (flagged as draft), and manual edits from the form layer are
//! type-checked against the field's parameter schema before being stored.

use crate::drafts::{DraftStatus, FunctionArgs, FunctionCall, FunctionDraft};
use crate::error::ClientError;
use crate::protocol::{to_camel_case, FunctionDefinition, ParamType};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

const UPDATE_PREFIX: &str = "update_";

/// A form field value and whether it is only a tentative (draft) value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub value: Value,
    pub draft: bool,
}

/// `update_party_size` → `party_size`
pub fn field_identifier(function_name: &str) -> Option<&str> {
    function_name
        .strip_prefix(UPDATE_PREFIX)
        .filter(|identifier| !identifier.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: ParamType,
    pub options: Option<Vec<String>>,
}

/// Field identifiers and their expected value types
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: BTreeMap<String, FieldSpec>,
}

impl FieldCatalog {
    pub fn from_definitions(definitions: &[FunctionDefinition]) -> Self {
        let mut fields = BTreeMap::new();

        for definition in definitions {
            let Some(identifier) = field_identifier(&definition.name) else {
                continue;
            };

            let properties = &definition.parameters.properties;
            let schema = properties
                .get(identifier)
                .or_else(|| properties.values().next());

            fields.insert(
                identifier.to_string(),
                FieldSpec {
                    kind: schema.map(|s| s.kind).unwrap_or_default(),
                    options: schema.and_then(|s| s.enum_values.clone()),
                },
            );
        }

        Self { fields }
    }

    pub fn get(&self, identifier: &str) -> Option<&FieldSpec> {
        self.fields.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.fields.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Check a raw manual value and normalize it to the field's type.
    ///
    /// Numeric and boolean fields accept their string spellings ("4",
    /// "true"). `null` clears any field.
    pub fn validate(&self, identifier: &str, raw: Value) -> Result<Value, ClientError> {
        let spec = self
            .get(identifier)
            .ok_or_else(|| ClientError::validation(identifier, "unknown field"))?;

        if raw.is_null() {
            return Ok(raw);
        }

        let reject = |expected: &str| {
            ClientError::validation(identifier, format!("expected {}, got {}", expected, raw))
        };

        match spec.kind {
            ParamType::String => {
                let Value::String(text) = &raw else {
                    return Err(reject("a string"));
                };
                if let Some(options) = &spec.options {
                    if !options.iter().any(|o| o == text) {
                        return Err(ClientError::validation(
                            identifier,
                            format!("'{}' is not one of: {}", text, options.join(", ")),
                        ));
                    }
                }
                Ok(raw)
            }
            ParamType::Number => match &raw {
                Value::Number(_) => Ok(raw),
                Value::String(text) => text
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| reject("a number")),
                _ => Err(reject("a number")),
            },
            ParamType::Integer => match &raw {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw),
                Value::String(text) => text
                    .trim()
                    .parse::<i64>()
                    .map(|n| Value::Number(n.into()))
                    .map_err(|_| reject("an integer")),
                _ => Err(reject("an integer")),
            },
            ParamType::Boolean => match &raw {
                Value::Bool(_) => Ok(raw),
                Value::String(text) => match text.trim() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(reject("a boolean")),
                },
                _ => Err(reject("a boolean")),
            },
            ParamType::Array if !raw.is_array() => Err(reject("an array")),
            ParamType::Object if !raw.is_object() => Err(reject("an object")),
            _ => Ok(raw),
        }
    }
}

/// The value a call carries for `identifier`.
///
/// Looks up the identifier (in either casing), then falls back to the first
/// argument other than `id`.
pub fn argument_value(identifier: &str, args: &FunctionArgs) -> Option<Value> {
    args.get(identifier)
        .or_else(|| args.get(&to_camel_case(identifier)))
        .or_else(|| {
            args.iter()
                .find(|(key, _)| key.as_str() != "id")
                .map(|(_, value)| value)
        })
        .cloned()
}

/// Set the fields driven by a confirmed batch
pub fn apply_confirmed(
    fields: &mut BTreeMap<String, FieldValue>,
    catalog: &FieldCatalog,
    batch: &[FunctionCall],
) {
    for call in batch {
        let Some(identifier) = field_identifier(&call.name).filter(|id| catalog.contains(id)) else {
            continue;
        };

        if let Some(value) = argument_value(identifier, &call.args) {
            fields.insert(identifier.to_string(), FieldValue { value, draft: false });
        }
    }
}

/// Set the fields driven by pending drafts, flagged as draft values
pub fn apply_drafts(
    fields: &mut BTreeMap<String, FieldValue>,
    catalog: &FieldCatalog,
    drafts: &[FunctionDraft],
) {
    for draft in drafts
        .iter()
        .filter(|d| d.status == DraftStatus::PendingConfirmation)
    {
        let Some(identifier) = field_identifier(&draft.name).filter(|id| catalog.contains(id)) else {
            continue;
        };

        match argument_value(identifier, &draft.args) {
            Some(value) if !value.is_null() => {
                fields.insert(identifier.to_string(), FieldValue { value, draft: true });
            }
            _ => {}
        }
    }
}

/// Confirmed argument count of a batch, ignoring `id` arguments
pub fn count_updates(batch: &[FunctionCall]) -> usize {
    batch
        .iter()
        .map(|call| call.args.keys().filter(|key| key.as_str() != "id").count())
        .sum()
}
