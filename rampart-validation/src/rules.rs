// Field rule primitives

use crate::{RuleSet, SchemaError, validators};
use rampart_core::{FieldFailure, PathSegment, codes};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Custom conversion: returns the converted value or a failure code.
pub type RuleFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Expected JSON input for a [`Rule::Function`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    String,
    List,
    Dict,
    Any,
}

impl InputKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            InputKind::String => value.is_string(),
            InputKind::List => value.is_array(),
            InputKind::Dict => value.is_object(),
            InputKind::Any => true,
        }
    }
}

/// Conversion and checks applied to one field value.
///
/// Every rule turns a raw value into its validated form or reports a failure
/// code. Query and header values arrive as strings, so numeric and boolean
/// rules also accept their string spelling.
#[derive(Clone)]
pub enum Rule {
    Str {
        min_length: usize,
        max_length: usize,
        replace_space: bool,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Email,
    Url,
    Uuid,
    Date,
    DateTime,
    FutureDateTime,
    List {
        inner: Box<Rule>,
        allow_empty: bool,
        remove_duplicates: bool,
    },
    Dict {
        allow_empty: bool,
    },
    Nested {
        rule_set: Arc<RuleSet>,
        many: bool,
    },
    Pattern {
        regex: Regex,
        code: String,
    },
    OneOf(Vec<Value>),
    ContainsOnly(Vec<Value>),
    Function {
        input: InputKind,
        func: RuleFn,
    },
}

/// Failure reported by a rule, before it is attached to a field path.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleFailure {
    Code(String),
    /// Failures from a nested rule-set, relative to the field
    Nested(Vec<FieldFailure>),
}

impl RuleFailure {
    fn code(code: &str) -> Self {
        RuleFailure::Code(code.to_string())
    }

    /// Anchor the failure at a path segment.
    pub fn at(self, segment: impl Into<PathSegment>) -> Vec<FieldFailure> {
        let segment = segment.into();
        match self {
            RuleFailure::Code(code) => vec![FieldFailure::new(segment, code)],
            RuleFailure::Nested(failures) => failures
                .into_iter()
                .map(|f| f.under(segment.clone()))
                .collect(),
        }
    }
}

type Checked = Result<Value, RuleFailure>;

impl Rule {
    /// String of 1 to 5000 characters.
    pub fn string() -> Self {
        Rule::Str {
            min_length: 1,
            max_length: 5000,
            replace_space: false,
        }
    }

    pub fn string_between(min_length: usize, max_length: usize) -> Self {
        Rule::Str {
            min_length,
            max_length,
            replace_space: false,
        }
    }

    /// String with spaces replaced by `-`, for slugs.
    pub fn slug() -> Self {
        Rule::Str {
            min_length: 1,
            max_length: 5000,
            replace_space: true,
        }
    }

    pub fn integer() -> Self {
        Rule::Integer { min: None, max: None }
    }

    pub fn integer_range(min: Option<i64>, max: Option<i64>) -> Self {
        Rule::Integer { min, max }
    }

    pub fn float() -> Self {
        Rule::Float { min: None, max: None }
    }

    pub fn list(inner: Rule) -> Self {
        Rule::List {
            inner: Box::new(inner),
            allow_empty: false,
            remove_duplicates: false,
        }
    }

    pub fn dict() -> Self {
        Rule::Dict { allow_empty: false }
    }

    pub fn nested(rule_set: impl Into<Arc<RuleSet>>) -> Self {
        Rule::Nested {
            rule_set: rule_set.into(),
            many: false,
        }
    }

    pub fn nested_many(rule_set: impl Into<Arc<RuleSet>>) -> Self {
        Rule::Nested {
            rule_set: rule_set.into(),
            many: true,
        }
    }

    /// String matching `pattern`; mismatches report `code`.
    pub fn pattern(pattern: &str, code: impl Into<String>) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidRule {
            field: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Rule::Pattern {
            regex,
            code: code.into(),
        })
    }

    pub fn one_of<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Rule::OneOf(choices.into_iter().map(Into::into).collect())
    }

    pub fn contains_only<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Rule::ContainsOnly(choices.into_iter().map(Into::into).collect())
    }

    pub fn function<F>(input: InputKind, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Rule::Function {
            input,
            func: Arc::new(func),
        }
    }

    /// Allow an empty list or dict.
    pub fn allow_empty(mut self) -> Self {
        match &mut self {
            Rule::List { allow_empty, .. } | Rule::Dict { allow_empty } => *allow_empty = true,
            _ => {}
        }
        self
    }

    /// Drop repeated list entries, keeping first occurrences.
    pub fn remove_duplicates(mut self) -> Self {
        if let Rule::List {
            remove_duplicates, ..
        } = &mut self
        {
            *remove_duplicates = true;
        }
        self
    }

    /// OpenAPI `type` and optional `format` for the rule.
    pub fn openapi_type(&self) -> (&'static str, Option<&'static str>) {
        match self {
            Rule::Str { .. } | Rule::Pattern { .. } => ("string", None),
            Rule::Integer { .. } => ("integer", Some("int32")),
            Rule::Float { .. } => ("number", Some("float")),
            Rule::Boolean => ("boolean", None),
            Rule::Email => ("string", Some("email")),
            Rule::Url => ("string", Some("url")),
            Rule::Uuid => ("string", Some("uuid")),
            Rule::Date => ("string", Some("date")),
            Rule::DateTime | Rule::FutureDateTime => ("string", Some("date-time")),
            Rule::List { .. } | Rule::ContainsOnly(_) => ("array", None),
            Rule::Nested { many: true, .. } => ("array", None),
            Rule::Dict { .. } | Rule::Nested { .. } => ("object", None),
            Rule::OneOf(choices) => match choices.first() {
                Some(Value::Number(n)) if n.is_i64() || n.is_u64() => ("integer", None),
                Some(Value::Number(_)) => ("number", None),
                Some(Value::Bool(_)) => ("boolean", None),
                _ => ("string", None),
            },
            Rule::Function { input, .. } => match input {
                InputKind::List => ("array", None),
                InputKind::Dict => ("object", None),
                InputKind::String | InputKind::Any => ("string", None),
            },
        }
    }

    /// Convert a present, non-null value.
    pub fn deserialize(&self, value: &Value) -> Checked {
        match self {
            Rule::Str {
                min_length,
                max_length,
                replace_space,
            } => {
                let s = check_str(value, *min_length, *max_length)?;
                Ok(Value::String(if *replace_space {
                    s.replace(' ', "-")
                } else {
                    s.to_string()
                }))
            }
            Rule::Integer { min, max } => {
                let n = as_i64(value).ok_or_else(|| RuleFailure::code(codes::TYPE))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(RuleFailure::code(codes::VALIDATOR_FAILED));
                }
                Ok(Value::from(n))
            }
            Rule::Float { min, max } => {
                let n = as_f64(value).ok_or_else(|| RuleFailure::code(codes::TYPE))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(RuleFailure::code(codes::VALIDATOR_FAILED));
                }
                Ok(Value::from(n))
            }
            Rule::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) => parse_bool_or_type(s),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => Err(RuleFailure::code(codes::TYPE)),
                },
                _ => Err(RuleFailure::code(codes::TYPE)),
            },
            Rule::Email => {
                let s = check_str(value, 1, 5000)?;
                if !validators::is_email(s) {
                    return Err(RuleFailure::code(codes::EMAIL));
                }
                Ok(Value::String(s.to_string()))
            }
            Rule::Url => {
                let s = check_str(value, 1, 5000)?;
                if !validators::is_url(s) {
                    return Err(RuleFailure::code(codes::URL));
                }
                Ok(Value::String(s.to_string()))
            }
            Rule::Uuid => {
                let s = check_str(value, 1, 5000)?;
                if !validators::is_uuid(s) {
                    return Err(RuleFailure::code(codes::VALIDATOR_FAILED));
                }
                Ok(Value::String(s.to_ascii_lowercase()))
            }
            Rule::Date => {
                let s = check_str(value, 1, 5000)?;
                validators::parse_date(s)
                    .map(|d| Value::String(validators::format_date(&d)))
                    .ok_or_else(|| RuleFailure::code(codes::DATE))
            }
            Rule::DateTime => {
                let s = check_str(value, 1, 5000)?;
                validators::parse_datetime(s)
                    .map(|dt| Value::String(validators::format_datetime(&dt)))
                    .ok_or_else(|| RuleFailure::code(codes::DATE_TIME))
            }
            Rule::FutureDateTime => {
                let s = check_str(value, 1, 5000)?;
                match validators::parse_datetime(s) {
                    Some(dt) if dt > chrono::Utc::now() => {
                        Ok(Value::String(validators::format_datetime(&dt)))
                    }
                    _ => Err(RuleFailure::code(codes::FUTURE_DATE_TIME)),
                }
            }
            Rule::List {
                inner,
                allow_empty,
                remove_duplicates,
            } => deserialize_list(inner, value, *allow_empty, *remove_duplicates),
            Rule::Dict { allow_empty } => match value {
                Value::Object(map) if map.is_empty() && !allow_empty => {
                    Err(RuleFailure::code(codes::VALIDATOR_FAILED))
                }
                Value::Object(_) => Ok(value.clone()),
                _ => Err(RuleFailure::code(codes::VALIDATOR_FAILED)),
            },
            Rule::Nested { rule_set, many } => {
                if *many && !value.is_array() {
                    return Err(RuleFailure::code(codes::TYPE));
                }
                let partial = rule_set.load(value, *many);
                if partial.errors.is_empty() {
                    Ok(partial.values)
                } else {
                    Err(RuleFailure::Nested(partial.errors))
                }
            }
            Rule::Pattern { regex, code } => {
                let s = check_str(value, 0, usize::MAX)?;
                if regex.is_match(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(RuleFailure::Code(code.clone()))
                }
            }
            Rule::OneOf(choices) => {
                if choices.iter().any(|c| loosely_equal(c, value)) {
                    Ok(value.clone())
                } else {
                    Err(RuleFailure::code(codes::VALIDATOR_FAILED))
                }
            }
            Rule::ContainsOnly(choices) => {
                let items = split_list(value);
                if items
                    .iter()
                    .all(|item| choices.iter().any(|c| loosely_equal(c, item)))
                {
                    Ok(Value::Array(items))
                } else {
                    Err(RuleFailure::code(codes::VALIDATOR_FAILED))
                }
            }
            Rule::Function { input, func } => {
                if !input.accepts(value) {
                    return Err(RuleFailure::code(codes::VALIDATOR_FAILED));
                }
                match func(value) {
                    Ok(out) if is_falsy(&out) => Err(RuleFailure::code(codes::VALIDATOR_FAILED)),
                    Ok(out) => Ok(out),
                    Err(code) => Err(RuleFailure::Code(code)),
                }
            }
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Str {
                min_length,
                max_length,
                replace_space,
            } => f
                .debug_struct("Str")
                .field("min_length", min_length)
                .field("max_length", max_length)
                .field("replace_space", replace_space)
                .finish(),
            Rule::Integer { min, max } => f
                .debug_struct("Integer")
                .field("min", min)
                .field("max", max)
                .finish(),
            Rule::Float { min, max } => f
                .debug_struct("Float")
                .field("min", min)
                .field("max", max)
                .finish(),
            Rule::Boolean => f.write_str("Boolean"),
            Rule::Email => f.write_str("Email"),
            Rule::Url => f.write_str("Url"),
            Rule::Uuid => f.write_str("Uuid"),
            Rule::Date => f.write_str("Date"),
            Rule::DateTime => f.write_str("DateTime"),
            Rule::FutureDateTime => f.write_str("FutureDateTime"),
            Rule::List {
                inner,
                allow_empty,
                remove_duplicates,
            } => f
                .debug_struct("List")
                .field("inner", inner)
                .field("allow_empty", allow_empty)
                .field("remove_duplicates", remove_duplicates)
                .finish(),
            Rule::Dict { allow_empty } => f
                .debug_struct("Dict")
                .field("allow_empty", allow_empty)
                .finish(),
            Rule::Nested { rule_set, many } => f
                .debug_struct("Nested")
                .field("rule_set", &rule_set.name())
                .field("many", many)
                .finish(),
            Rule::Pattern { regex, code } => f
                .debug_struct("Pattern")
                .field("regex", &regex.as_str())
                .field("code", code)
                .finish(),
            Rule::OneOf(choices) => f.debug_tuple("OneOf").field(choices).finish(),
            Rule::ContainsOnly(choices) => f.debug_tuple("ContainsOnly").field(choices).finish(),
            Rule::Function { input, .. } => f
                .debug_struct("Function")
                .field("input", input)
                .finish_non_exhaustive(),
        }
    }
}

fn check_str(value: &Value, min: usize, max: usize) -> Result<&str, RuleFailure> {
    let Value::String(s) = value else {
        return Err(RuleFailure::code(codes::TYPE));
    };
    let len = s.chars().count();
    if len < min {
        return Err(RuleFailure::code(codes::REQUIRED));
    }
    if len > max {
        return Err(RuleFailure::code(codes::MAX_LENGTH));
    }
    Ok(s)
}

fn parse_bool_or_type(s: &str) -> Checked {
    validators::parse_bool(s)
        .map(Value::Bool)
        .ok_or_else(|| RuleFailure::code(codes::TYPE))
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Arrays pass through; strings split on commas; other scalars become a single item.
fn split_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => s.split(',').map(|p| Value::String(p.to_string())).collect(),
        other => vec![other.clone()],
    }
}

fn deserialize_list(inner: &Rule, value: &Value, allow_empty: bool, remove_duplicates: bool) -> Checked {
    if value.is_object() {
        return Err(RuleFailure::code(codes::VALIDATOR_FAILED));
    }
    let items = split_list(value);
    if items.is_empty() {
        return if allow_empty {
            Ok(Value::Array(items))
        } else {
            Err(RuleFailure::code(codes::VALIDATOR_FAILED))
        };
    }

    let mut out = Vec::with_capacity(items.len());
    let mut failures = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match inner.deserialize(item) {
            Ok(v) => out.push(v),
            Err(failure) => failures.extend(failure.at(index)),
        }
    }
    if !failures.is_empty() {
        return Err(RuleFailure::Nested(failures));
    }

    if remove_duplicates {
        let mut seen = HashSet::new();
        out.retain(|v| seen.insert(v.to_string()));
    }
    Ok(Value::Array(out))
}

/// Choice comparison that lets `"3"` from a query string match `3`.
fn loosely_equal(choice: &Value, value: &Value) -> bool {
    if choice == value {
        return true;
    }
    match (choice, value) {
        (Value::Number(_) | Value::Bool(_), Value::String(s)) => choice.to_string() == *s,
        _ => false,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}
