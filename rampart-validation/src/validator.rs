// Validation aggregation across rule-sets

use crate::RuleSet;
use rampart_core::{ClientError, FieldFailure, Location, PathSegment};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Merged result of every rule-set that applies to one location.
///
/// A field never appears in both `values` and `errors`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub values: Value,
    pub errors: Vec<FieldFailure>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Raise the outcome as a client error for `location`.
    pub fn into_result(self, location: Location, domain: &str) -> Result<Value, ClientError> {
        if self.errors.is_empty() {
            Ok(self.values)
        } else {
            Err(ClientError::schema_validation(location, domain, self.errors))
        }
    }
}

/// Run each rule-set against `raw` and merge the partials.
///
/// Values are last-write-wins per field, merged element-wise by index when
/// `raw` is a list. Failures accumulate, so a field flagged by two rule-sets
/// carries both reasons.
pub fn aggregate(raw: &Value, rule_sets: &[Arc<RuleSet>]) -> ValidationOutcome {
    let many = raw.is_array();
    let mut values = if many {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    };
    let mut errors = Vec::new();
    let mut failed = Vec::new();

    for rule_set in rule_sets {
        let partial = rule_set.load(raw, many);
        merge_values(&mut values, partial.values);
        failed.extend(partial.errors.iter().filter_map(|f| failed_slot(rule_set, f)));
        errors.extend(partial.errors);
    }

    drop_failed_fields(&mut values, &failed);
    ValidationOutcome { values, errors }
}

/// Aggregate and raise a location-tagged error on any failure.
pub fn validate(
    location: Location,
    domain: &str,
    raw: &Value,
    rule_sets: &[Arc<RuleSet>],
) -> Result<Value, ClientError> {
    aggregate(raw, rule_sets).into_result(location, domain)
}

fn merge_values(into: &mut Value, from: Value) {
    match (into, from) {
        (Value::Object(target), Value::Object(source)) => target.extend(source),
        (Value::Array(target), Value::Array(source)) => {
            if target.is_empty() {
                *target = source;
                return;
            }
            for (index, record) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(existing) => merge_values(existing, record),
                    None => target.push(record),
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Output slot of a failed field: record index in many-mode, input key and
/// the key the field writes to after any `attribute` rename.
struct FailedSlot {
    index: Option<usize>,
    input: String,
    output: String,
}

fn failed_slot(rule_set: &RuleSet, failure: &FieldFailure) -> Option<FailedSlot> {
    let (index, key) = match failure.path.as_slice() {
        [PathSegment::Index(index), PathSegment::Key(key), ..] => (Some(*index), key),
        [PathSegment::Key(key), ..] => (None, key),
        _ => return None,
    };
    let output = rule_set
        .get(key)
        .map(|field| field.output_key(key).to_string())
        .unwrap_or_else(|| key.clone());
    Some(FailedSlot {
        index,
        input: key.clone(),
        output,
    })
}

fn drop_failed_fields(values: &mut Value, failed: &[FailedSlot]) {
    for slot in failed {
        let record = match (slot.index, &mut *values) {
            (None, Value::Object(map)) => map,
            (Some(index), Value::Array(records)) => match records.get_mut(index) {
                Some(Value::Object(record)) => record,
                _ => continue,
            },
            _ => continue,
        };
        record.shift_remove(&slot.input);
        record.shift_remove(&slot.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Rule};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rampart_core::codes;
    use serde_json::json;

    fn class_wide() -> Arc<RuleSet> {
        Arc::new(
            RuleSet::new("Body")
                .field("name", Field::new(Rule::string()).required())
                .field("tag", Rule::string()),
        )
    }

    fn method_specific() -> Arc<RuleSet> {
        Arc::new(
            RuleSet::new("Post.Body")
                .field("age", Rule::integer())
                .field("tag", Rule::slug()),
        )
    }

    #[test]
    fn test_union_of_disjoint_fields() {
        let outcome = aggregate(
            &json!({"name": "rex", "age": "4", "tag": "good dog"}),
            &[class_wide(), method_specific()],
        );
        assert!(outcome.is_valid());
        assert_eq!(outcome.values, json!({"name": "rex", "tag": "good-dog", "age": 4}));
    }

    #[test]
    fn test_errors_accumulate_per_field() {
        let strict = Arc::new(RuleSet::new("Strict").field("name", Field::new(Rule::Email).required()));
        let outcome = aggregate(&json!({"name": ""}), &[class_wide(), strict]);
        let reasons: Vec<_> = outcome.errors.iter().map(|f| f.reason.as_str()).collect();
        assert_eq!(reasons, vec![codes::REQUIRED, codes::REQUIRED]);
        assert_eq!(outcome.values, json!({}));
    }

    #[test]
    fn test_failed_field_removed_from_values() {
        let lenient = Arc::new(RuleSet::new("Lenient").field("age", Rule::string()));
        let outcome = aggregate(&json!({"name": "rex", "age": "x"}), &[lenient, method_specific()]);
        assert_eq!(outcome.values, json!({}));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_many_mode_merges_by_index() {
        let outcome = aggregate(
            &json!([{"name": "a", "age": 1}, {"name": "b", "age": "x"}]),
            &[class_wide(), method_specific()],
        );
        assert_eq!(outcome.values, json!([{"name": "a", "age": 1}, {"name": "b"}]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].dotted(), "1.age");
    }

    #[test]
    fn test_validate_raises_location_error() {
        let err = validate(Location::Query, "Pets", &json!({}), &[class_wide()]).unwrap_err();
        assert_eq!(err.location, Some(Location::Query));
        assert_eq!(err.errors[0].location, "name");
        assert_eq!(err.errors[0].location_type, "query");
        assert_eq!(err.errors[0].domain, "pets");
    }

    proptest! {
        #[test]
        fn prop_idempotent_and_union(name in "[a-z]{1,12}", age in 0i64..200, tag in "[a-z]{1,8}") {
            let raw = json!({"name": name, "age": age, "tag": tag});
            let rule_sets = [class_wide(), method_specific()];

            let first = aggregate(&raw, &rule_sets);
            let second = aggregate(&raw, &rule_sets);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.is_valid());
            prop_assert_eq!(&first.values["name"], &json!(name));
            prop_assert_eq!(&first.values["age"], &json!(age));
            prop_assert_eq!(&first.values["tag"], &json!(tag));
        }

        #[test]
        fn prop_values_and_errors_disjoint(age in "[a-z0-9]{0,4}", name in "[a-z]{0,3}") {
            let raw = json!({"name": name, "age": age});
            let outcome = aggregate(&raw, &[class_wide(), method_specific()]);
            let values = outcome.values.as_object().cloned().unwrap_or_default();
            for failure in &outcome.errors {
                prop_assert!(!values.contains_key(&failure.field()));
            }
        }
    }
}
