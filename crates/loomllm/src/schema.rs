use loomcore::{Record, StructuredOutputError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field type of a compiled record schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Text,
    Int,
    Float,
    Bool,
    Sequence(Box<FieldType>),
    Record(RecordSchema),
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSpec {
    field_type: FieldType,
    required: bool,
}

/// A typed record definition compiled from a JSON-Schema-like
/// `{properties, required}` document.
///
/// Fields not listed in `required` are optional: absent values validate and
/// are filled with `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    fields: BTreeMap<String, FieldSpec>,
    raw: Value,
}

impl RecordSchema {
    pub fn from_json_schema(schema: &Value) -> Result<Self, StructuredOutputError> {
        let obj = schema
            .as_object()
            .ok_or_else(|| StructuredOutputError::InvalidSchema("schema must be an object".into()))?;

        let properties = obj
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let required: Vec<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut fields = BTreeMap::new();
        for (name, field_schema) in &properties {
            fields.insert(
                name.clone(),
                FieldSpec {
                    field_type: Self::field_type(field_schema)?,
                    required: required.contains(&name.as_str()),
                },
            );
        }

        Ok(Self {
            fields,
            raw: schema.clone(),
        })
    }

    fn field_type(field_schema: &Value) -> Result<FieldType, StructuredOutputError> {
        let json_type = field_schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string");

        Ok(match json_type {
            "string" => FieldType::Text,
            "integer" => FieldType::Int,
            "number" => FieldType::Float,
            "boolean" => FieldType::Bool,
            "array" => {
                let items = field_schema
                    .get("items")
                    .map(Self::field_type)
                    .transpose()?
                    .unwrap_or(FieldType::Text);
                FieldType::Sequence(Box::new(items))
            }
            "object" => FieldType::Record(Self::from_json_schema(field_schema)?),
            other => {
                return Err(StructuredOutputError::InvalidSchema(format!(
                    "unsupported field type: {other}"
                )))
            }
        })
    }

    /// The original JSON schema document, used for prompt injection and
    /// provider-native structured modes.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a record in place. Required fields must be present with the
    /// right type; absent optional fields are filled with `null`.
    pub fn validate(&self, record: &mut Record) -> Result<(), StructuredOutputError> {
        for (name, spec) in &self.fields {
            match record.get_mut(name) {
                Some(value) if value.is_null() && !spec.required => {}
                Some(value) => Self::check_type(name, value, &spec.field_type)?,
                None if spec.required => {
                    return Err(StructuredOutputError::MissingField(name.clone()))
                }
                None => {
                    record.insert(name.clone(), Value::Null);
                }
            }
        }
        Ok(())
    }

    fn check_type(name: &str, value: &mut Value, expected: &FieldType) -> Result<(), StructuredOutputError> {
        let mismatch = |expected: &str| StructuredOutputError::WrongType {
            field: name.to_string(),
            expected: expected.to_string(),
        };

        match expected {
            FieldType::Text if value.is_string() => Ok(()),
            FieldType::Text => Err(mismatch("string")),
            FieldType::Int if value.as_i64().is_some() || value.as_u64().is_some() => Ok(()),
            FieldType::Int => Err(mismatch("integer")),
            FieldType::Float if value.is_number() => Ok(()),
            FieldType::Float => Err(mismatch("number")),
            FieldType::Bool if value.is_boolean() => Ok(()),
            FieldType::Bool => Err(mismatch("boolean")),
            FieldType::Sequence(items) => match value.as_array_mut() {
                Some(array) => {
                    for item in array {
                        Self::check_type(name, item, items)?;
                    }
                    Ok(())
                }
                None => Err(mismatch("array")),
            },
            FieldType::Record(nested) => match value.as_object_mut() {
                Some(obj) => nested.validate(obj),
                None => Err(mismatch("object")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> RecordSchema {
        RecordSchema::from_json_schema(&json!({
            "required": ["a"],
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "integer"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn required_present_validates_and_optional_defaults_null() {
        let mut record = json!({"a": "hello"}).as_object().unwrap().clone();
        schema().validate(&mut record).unwrap();
        assert_eq!(record["b"], Value::Null);
    }

    #[test]
    fn missing_required_fails() {
        let mut record = json!({"b": 2}).as_object().unwrap().clone();
        let err = schema().validate(&mut record).unwrap_err();
        assert!(matches!(err, StructuredOutputError::MissingField(f) if f == "a"));
    }

    #[test]
    fn wrong_type_fails() {
        let mut record = json!({"a": "x", "b": "not an int"}).as_object().unwrap().clone();
        let err = schema().validate(&mut record).unwrap_err();
        assert!(matches!(err, StructuredOutputError::WrongType { field, .. } if field == "b"));
    }

    #[test]
    fn nested_objects_and_sequences() {
        let schema = RecordSchema::from_json_schema(&json!({
            "required": ["tags", "meta"],
            "properties": {
                "tags": {"type": "array", "items": {"type": "string"}},
                "meta": {
                    "type": "object",
                    "required": ["score"],
                    "properties": {"score": {"type": "number"}}
                }
            }
        }))
        .unwrap();

        let mut ok = json!({"tags": ["x", "y"], "meta": {"score": 0.5}})
            .as_object()
            .unwrap()
            .clone();
        schema.validate(&mut ok).unwrap();

        let mut bad = json!({"tags": ["x", 3], "meta": {"score": 0.5}})
            .as_object()
            .unwrap()
            .clone();
        assert!(schema.validate(&mut bad).is_err());

        let mut bad_nested = json!({"tags": [], "meta": {}}).as_object().unwrap().clone();
        assert!(schema.validate(&mut bad_nested).is_err());
    }
}
