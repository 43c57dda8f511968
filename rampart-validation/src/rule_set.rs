// Named bundles of field rules

use crate::{Field, FieldOutcome, SchemaError};
use indexmap::IndexMap;
use rampart_core::{FieldFailure, codes};
use serde_json::{Map, Value};

/// Values and failures produced by one rule-set over one payload.
///
/// In single mode `values` is an object; in many mode it is an array with
/// one object per input record, and every failure path starts with the
/// record index.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub values: Value,
    pub errors: Vec<FieldFailure>,
}

/// A named validation unit: an ordered set of fields.
///
/// Unknown input keys are ignored.
///
/// ```
/// use rampart_validation::{Field, Rule, RuleSet};
/// use serde_json::json;
///
/// let pet = RuleSet::new("Pet")
///     .field("name", Field::new(Rule::string()).required())
///     .field("age", Rule::integer());
///
/// let partial = pet.load(&json!({"name": "rex", "age": "3", "extra": true}), false);
/// assert_eq!(partial.values, json!({"name": "rex", "age": 3}));
/// assert!(partial.errors.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    fields: IndexMap<String, Field>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field; a repeated name replaces the earlier declaration.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.insert(name.into(), field.into());
        self
    }

    /// Add a field, rejecting repeated names.
    pub fn try_field(
        mut self,
        name: impl Into<String>,
        field: impl Into<Field>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(SchemaError::DuplicateField {
                rule_set: self.name,
                field: name,
            });
        }
        self.fields.insert(name, field.into());
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of required fields, in declaration order.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.required)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Validate one record or, with `many`, a list of records.
    pub fn load(&self, raw: &Value, many: bool) -> Partial {
        if !many {
            return match raw {
                Value::Object(record) => {
                    let (values, errors) = self.load_record(record);
                    Partial {
                        values: Value::Object(values),
                        errors,
                    }
                }
                _ => Partial {
                    values: Value::Object(Map::new()),
                    errors: vec![invalid_input()],
                },
            };
        }

        let Value::Array(records) = raw else {
            return Partial {
                values: Value::Array(Vec::new()),
                errors: vec![invalid_input()],
            };
        };

        let mut values = Vec::with_capacity(records.len());
        let mut errors = Vec::new();
        for (index, record) in records.iter().enumerate() {
            match record {
                Value::Object(record) => {
                    let (record_values, record_errors) = self.load_record(record);
                    values.push(Value::Object(record_values));
                    errors.extend(record_errors.into_iter().map(|f| f.under(index)));
                }
                _ => {
                    values.push(Value::Object(Map::new()));
                    errors.push(invalid_input().under(index));
                }
            }
        }
        Partial {
            values: Value::Array(values),
            errors,
        }
    }

    fn load_record(&self, record: &Map<String, Value>) -> (Map<String, Value>, Vec<FieldFailure>) {
        let mut values = Map::new();
        let mut errors = Vec::new();
        for (name, field) in &self.fields {
            match field.load(name, record.get(name)) {
                FieldOutcome::Value(v) => {
                    values.insert(field.output_key(name).to_string(), v);
                }
                FieldOutcome::Missing => {}
                FieldOutcome::Failed(failures) => errors.extend(failures),
            }
        }
        (values, errors)
    }
}

fn invalid_input() -> FieldFailure {
    FieldFailure::schema(codes::TYPE, "Invalid input type.")
}
