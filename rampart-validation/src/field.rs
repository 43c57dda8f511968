// Field declarations

use crate::Rule;
use rampart_core::{FieldFailure, codes};
use serde_json::Value;

/// A named entry in a [`RuleSet`](crate::RuleSet): the rule plus presence handling.
///
/// ```
/// use rampart_validation::{Field, Rule};
/// use serde_json::json;
///
/// let limit = Field::new(Rule::integer())
///     .default(json!(20))
///     .description("Page size")
///     .example(json!(50));
/// assert!(!limit.required);
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    pub rule: Rule,
    pub required: bool,
    pub allow_none: bool,
    /// Value used when the field is absent; not validated
    pub default: Option<Value>,
    /// Output key, when different from the input key
    pub attribute: Option<String>,
    pub example: Option<Value>,
    pub description: Option<String>,
}

/// Result of loading one field from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Value(Value),
    Missing,
    Failed(Vec<FieldFailure>),
}

impl Field {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            required: false,
            allow_none: false,
            default: None,
            attribute: None,
            example: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Load the value under a different key, e.g. header `xsrf` into `csrf`.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    pub fn example(mut self, value: impl Into<Value>) -> Self {
        self.example = Some(value.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn output_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.attribute.as_deref().unwrap_or(name)
    }

    /// Validate the field `name` given its raw value, if present.
    pub fn load(&self, name: &str, raw: Option<&Value>) -> FieldOutcome {
        match raw {
            None => match (&self.default, self.required) {
                (Some(default), _) => FieldOutcome::Value(default.clone()),
                (None, true) => FieldOutcome::Failed(vec![FieldFailure::new(name, codes::REQUIRED)]),
                (None, false) => FieldOutcome::Missing,
            },
            Some(Value::Null) if self.allow_none => FieldOutcome::Value(Value::Null),
            Some(Value::Null) => FieldOutcome::Failed(vec![FieldFailure::new(name, codes::NOT_NULL)]),
            Some(value) => match self.rule.deserialize(value) {
                Ok(v) => FieldOutcome::Value(v),
                Err(failure) => FieldOutcome::Failed(failure.at(name)),
            },
        }
    }
}

impl From<Rule> for Field {
    fn from(rule: Rule) -> Self {
        Field::new(rule)
    }
}
