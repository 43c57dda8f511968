//! JSON schema definitions derived from rule-sets

use crate::spec::Schema;
use rampart_validation::{Field, InputKind, Rule, RuleSet};
use std::sync::Arc;

/// Schema describing the values a rule accepts.
pub fn rule_schema(rule: &Rule) -> Schema {
    let (schema_type, format) = rule.openapi_type();
    let mut schema = Schema {
        schema_type: Some(schema_type.to_string()),
        format: format.map(str::to_string),
        ..Default::default()
    };

    match rule {
        Rule::Str {
            min_length,
            max_length,
            ..
        } => {
            schema.min_length = Some(*min_length);
            schema.max_length = Some(*max_length);
        }
        Rule::Integer { min, max } => {
            schema.minimum = min.map(|v| v as f64);
            schema.maximum = max.map(|v| v as f64);
        }
        Rule::Float { min, max } => {
            schema.minimum = *min;
            schema.maximum = *max;
        }
        Rule::Pattern { regex, .. } => schema.pattern = Some(regex.as_str().to_string()),
        Rule::List { inner, .. } => schema.items = Some(Box::new(rule_schema(inner))),
        Rule::Nested { rule_set, many } => {
            let nested = rule_set_schema(rule_set);
            if *many {
                schema.items = Some(Box::new(nested));
            } else {
                schema = nested;
            }
        }
        Rule::OneOf(choices) => schema.enum_values = Some(choices.clone()),
        Rule::ContainsOnly(choices) => {
            schema.items = Some(Box::new(Schema {
                schema_type: Some("string".to_string()),
                enum_values: Some(choices.clone()),
                ..Default::default()
            }))
        }
        Rule::Function {
            input: InputKind::List,
            ..
        } => {
            schema.items = Some(Box::new(Schema {
                schema_type: Some("string".to_string()),
                ..Default::default()
            }))
        }
        _ => {}
    }
    schema
}

/// Rule schema plus the field's default, example and description.
pub fn field_schema(field: &Field) -> Schema {
    let mut schema = rule_schema(&field.rule);
    schema.default = field.default.clone();
    schema.example = field.example.clone();
    schema.description = field.description.clone();
    if field.allow_none {
        schema.nullable = Some(true);
    }
    schema
}

/// Object schema for a rule-set, keyed by input field names.
pub fn rule_set_schema(rule_set: &RuleSet) -> Schema {
    Schema {
        schema_type: Some("object".to_string()),
        properties: Some(
            rule_set
                .fields()
                .map(|(name, field)| (name.to_string(), field_schema(field)))
                .collect(),
        ),
        required: rule_set
            .required_fields()
            .into_iter()
            .map(str::to_string)
            .collect(),
        ..Default::default()
    }
}

/// One object schema covering every rule-set that applies to a location.
pub fn merged_schema(rule_sets: &[Arc<RuleSet>]) -> Schema {
    let mut merged = Schema {
        schema_type: Some("object".to_string()),
        ..Default::default()
    };
    for rule_set in rule_sets {
        merged.merge(rule_set_schema(rule_set));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_rules() {
        let schema = rule_schema(&Rule::integer_range(Some(1), Some(10)));
        assert_eq!(schema.schema_type.as_deref(), Some("integer"));
        assert_eq!(schema.minimum, Some(1.0));
        assert_eq!(schema.maximum, Some(10.0));

        let schema = rule_schema(&Rule::Email);
        assert_eq!(schema.format.as_deref(), Some("email"));
    }

    #[test]
    fn test_list_and_choices() {
        let schema = rule_schema(&Rule::list(Rule::one_of(["a", "b"])));
        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        let items = schema.items.unwrap();
        assert_eq!(items.enum_values, Some(vec![json!("a"), json!("b")]));
    }

    #[test]
    fn test_nested_rule_sets() {
        let address = RuleSet::new("Address").field("city", Field::new(Rule::string()).required());
        let schema = rule_schema(&Rule::nested_many(address));
        let items = schema.items.unwrap();
        assert_eq!(items.schema_type.as_deref(), Some("object"));
        assert_eq!(items.required, vec!["city"]);
    }

    #[test]
    fn test_field_metadata() {
        let field = Field::new(Rule::integer())
            .default(20)
            .example(50)
            .description("Page size")
            .allow_none();
        let schema = field_schema(&field);
        assert_eq!(schema.default, Some(json!(20)));
        assert_eq!(schema.example, Some(json!(50)));
        assert_eq!(schema.description.as_deref(), Some("Page size"));
        assert_eq!(schema.nullable, Some(true));
    }

    #[test]
    fn test_merged_schema() {
        let a = Arc::new(RuleSet::new("A").field("name", Field::new(Rule::string()).required()));
        let b = Arc::new(RuleSet::new("B").field("age", Rule::integer()).field("name", Rule::slug()));
        let schema = merged_schema(&[a, b]);
        let props = schema.properties.unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(schema.required, vec!["name"]);
    }
}
