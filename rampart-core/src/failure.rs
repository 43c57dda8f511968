// Field failure records

use crate::Location;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key used for failures that concern the whole payload rather than one field.
pub const SCHEMA_KEY: &str = "_schema";

/// Machine-readable failure codes reported by field rules.
pub mod codes {
    pub const REQUIRED: &str = "FieldRequiredException";
    pub const NOT_NULL: &str = "FieldNotNullException";
    pub const TYPE: &str = "FieldTypeException";
    pub const MAX_LENGTH: &str = "FieldMaxLengthException";
    pub const VALIDATOR_FAILED: &str = "FieldValidatorFailedException";
    pub const EMAIL: &str = "FieldEmailTypeException";
    pub const URL: &str = "FieldUrlTypeException";
    pub const DATE: &str = "FieldDateTypeException";
    pub const DATE_TIME: &str = "FieldDateTimeTypeException";
    pub const FUTURE_DATE_TIME: &str = "FieldFutureDateTimeTypeException";
    pub const SCHEMA_FIELDS: &str = "SchemaFieldsException";
    pub const METHOD_NOT_ALLOWED: &str = "MethodNotAllowedException";
}

/// One step in the path from the payload root to a failing field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    fn to_value(&self) -> Value {
        match self {
            PathSegment::Key(key) => Value::String(key.clone()),
            PathSegment::Index(index) => Value::from(*index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single rule failure, addressed by its path inside the validated payload.
///
/// The last segment is the failing field; any earlier segments are the
/// parents it is nested under (record index in many-mode, nested rule-set key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub path: Vec<PathSegment>,
    pub reason: String,
    pub message: String,
}

impl FieldFailure {
    pub fn new(field: impl Into<PathSegment>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            path: vec![field.into()],
            message: default_message(&reason).to_string(),
            reason,
        }
    }

    /// Failure for the payload as a whole.
    pub fn schema(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![PathSegment::Key(SCHEMA_KEY.to_string())],
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Nest this failure under a parent segment.
    pub fn under(mut self, parent: impl Into<PathSegment>) -> Self {
        self.path.insert(0, parent.into());
        self
    }

    /// Failing field name, the last path segment.
    pub fn field(&self) -> String {
        self.path
            .last()
            .map(|s| s.to_string())
            .unwrap_or_else(|| SCHEMA_KEY.to_string())
    }

    /// Field path joined with dots (`items.0.name`).
    pub fn dotted(&self) -> String {
        self.path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Stamp the failure with its location and validating domain.
    pub fn into_reason(self, location: Location, domain: &str) -> FailureReason {
        let field = self.field();
        let location_id = match self.path.len() {
            0 | 1 => Value::from(0),
            n => self.path[n - 2].to_value(),
        };
        let parent = match self.path.len() {
            0 | 1 => None,
            n => Some(
                self.path[..n - 1]
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("."),
            ),
        };

        FailureReason {
            location: field,
            location_id,
            location_type: location.location_type().to_string(),
            domain: domain.to_lowercase(),
            reason: self.reason,
            message: self.message,
            parent,
        }
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dotted(), self.reason)
    }
}

/// Default human message for a failure code.
pub fn default_message(reason: &str) -> &'static str {
    match reason {
        codes::REQUIRED => "Missing data for required field.",
        codes::NOT_NULL => "Field may not be null.",
        codes::TYPE => "Invalid type.",
        codes::MAX_LENGTH => "Longer than maximum length.",
        codes::EMAIL => "Not a valid email address.",
        codes::URL => "Not a valid URL.",
        codes::DATE => "Not a valid date.",
        codes::DATE_TIME => "Not a valid datetime.",
        codes::FUTURE_DATE_TIME => "Datetime must be in the future.",
        _ => "Invalid value.",
    }
}

/// Wire record describing why one field failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReason {
    /// Failing field key
    pub location: String,
    /// Parent key or record index; `0` for top-level fields
    pub location_id: Value,
    /// Lower-cased location category (`body`, `viewarg`, ..., or `schema`)
    pub location_type: String,
    /// Lower-cased name of the validating endpoint
    pub domain: String,
    pub reason: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl FailureReason {
    /// Wire form of the record, built field by field.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("location".to_string(), Value::String(self.location.clone()));
        map.insert("locationId".to_string(), self.location_id.clone());
        map.insert("locationType".to_string(), Value::String(self.location_type.clone()));
        map.insert("domain".to_string(), Value::String(self.domain.clone()));
        map.insert("reason".to_string(), Value::String(self.reason.clone()));
        map.insert("message".to_string(), Value::String(self.message.clone()));
        if let Some(parent) = &self.parent {
            map.insert("parent".to_string(), Value::String(parent.clone()));
        }
        Value::Object(map)
    }

    /// Override the location type, e.g. `schema` for cross-field failures.
    pub fn with_location_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_type = location_type.into();
        self
    }
}

/// Build the nested `field -> [codes]` map carried in `error.reason`.
///
/// Failures nested under a parent produce nested objects keyed by parent.
pub fn reason_map(failures: &[FieldFailure]) -> Value {
    let mut root = Value::Object(Default::default());
    for failure in failures {
        let mut cursor = &mut root;
        let depth = failure.path.len();
        for (i, segment) in failure.path.iter().enumerate() {
            let key = segment.to_string();
            let Value::Object(map) = cursor else { break };
            if i + 1 == depth {
                let entry = map.entry(key).or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(list) = entry {
                    list.push(Value::String(failure.reason.clone()));
                }
                break;
            }
            let next = map
                .entry(key)
                .or_insert_with(|| Value::Object(Default::default()));
            if !next.is_object() {
                *next = Value::Object(Default::default());
            }
            cursor = next;
        }
    }
    root
}

/// Failures grouped by their top-level key, in first-seen order.
pub fn group_by_key(failures: Vec<FieldFailure>) -> IndexMap<String, Vec<FieldFailure>> {
    let mut grouped: IndexMap<String, Vec<FieldFailure>> = IndexMap::new();
    for failure in failures {
        let key = failure
            .path
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| SCHEMA_KEY.to_string());
        grouped.entry(key).or_default().push(failure);
    }
    grouped
}
