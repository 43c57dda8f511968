//! Rule-set registry for one endpoint
//!
//! A [`Schema`] maps `(method, location)` to rule-sets through an explicit
//! registration API. Class-wide rule-sets apply to every method; method
//! rule-sets apply to one. Both run when present, class-wide first.
//!
//! ```
//! use rampart_core::{HttpMethod, Location};
//! use rampart_validation::{Field, Rule, RuleSet, Schema};
//!
//! let schema = Schema::builder("Pets")
//!     .location(Location::Query, RuleSet::new("Query").field("limit", Rule::integer()))
//!     .method(
//!         HttpMethod::Post,
//!         Location::Body,
//!         RuleSet::new("Body").field("name", Field::new(Rule::string()).required()),
//!     )
//!     .build();
//!
//! assert_eq!(schema.resolve(HttpMethod::Get, Location::Query).unwrap().len(), 1);
//! assert!(schema.resolve(HttpMethod::Get, Location::Body).is_err());
//! ```

use crate::{DeclaredType, RuleSet, SchemaError};
use indexmap::IndexMap;
use rampart_core::{FieldFailure, HttpMethod, Location};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Cross-field check run once over the merged arguments.
pub type PostValidate =
    Arc<dyn Fn(&Map<String, Value>) -> Result<(), Vec<FieldFailure>> + Send + Sync>;

/// Rule-sets registered for one endpoint.
#[derive(Clone)]
pub struct Schema {
    name: String,
    class_wide: IndexMap<Location, Arc<RuleSet>>,
    by_method: IndexMap<(HttpMethod, Location), Arc<RuleSet>>,
    post_validate: Option<PostValidate>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                name: name.into(),
                class_wide: IndexMap::new(),
                by_method: IndexMap::new(),
                post_validate: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rule-sets for `location` under `method`, class-wide first.
    pub fn resolve(
        &self,
        method: HttpMethod,
        location: Location,
    ) -> Result<Vec<Arc<RuleSet>>, SchemaError> {
        let found = self.lookup(method, location);
        if found.is_empty() {
            return Err(SchemaError::MissingRuleSet {
                schema: self.name.clone(),
                method,
                location,
            });
        }
        Ok(found)
    }

    /// Like [`resolve`](Self::resolve) but empty instead of failing.
    pub fn lookup(&self, method: HttpMethod, location: Location) -> Vec<Arc<RuleSet>> {
        self.class_wide
            .get(&location)
            .into_iter()
            .chain(self.by_method.get(&(method, location)))
            .cloned()
            .collect()
    }

    pub fn class_wide(&self, location: Location) -> Option<&Arc<RuleSet>> {
        self.class_wide.get(&location)
    }

    pub fn method_specific(&self, method: HttpMethod, location: Location) -> Option<&Arc<RuleSet>> {
        self.by_method.get(&(method, location))
    }

    pub fn post_validate(&self) -> Option<&PostValidate> {
        self.post_validate.as_ref()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("class_wide", &self.class_wide.keys().collect::<Vec<_>>())
            .field("by_method", &self.by_method.keys().collect::<Vec<_>>())
            .field("post_validate", &self.post_validate.is_some())
            .finish()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Register a class-wide rule-set; a second call for the same location replaces it.
    pub fn location(mut self, location: Location, rule_set: impl Into<Arc<RuleSet>>) -> Self {
        self.schema.class_wide.insert(location, rule_set.into());
        self
    }

    /// Register a rule-set that applies only to `method`.
    pub fn method(
        mut self,
        method: HttpMethod,
        location: Location,
        rule_set: impl Into<Arc<RuleSet>>,
    ) -> Self {
        self.schema
            .by_method
            .insert((method, location), rule_set.into());
        self
    }

    pub fn post_validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<(), Vec<FieldFailure>> + Send + Sync + 'static,
    {
        self.schema.post_validate = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

#[derive(Debug, Clone)]
struct GlobalBinding {
    rule_sets: Vec<Arc<RuleSet>>,
    declared_type: Option<DeclaredType>,
}

/// Rule-sets shared by a group of endpoints.
///
/// A global binding applies to an endpoint method only when the method does
/// not declare that location itself.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    bindings: IndexMap<Location, GlobalBinding>,
}

impl GlobalArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a rule-set to `location`. Repeated binds stack.
    pub fn bind(self, location: Location, rule_set: impl Into<Arc<RuleSet>>) -> Self {
        self.bind_as(location, rule_set, None)
    }

    /// Bind a rule-set whose raw values are extracted as lists.
    pub fn bind_list(self, location: Location, rule_set: impl Into<Arc<RuleSet>>) -> Self {
        self.bind_as(location, rule_set, Some(DeclaredType::List))
    }

    fn bind_as(
        mut self,
        location: Location,
        rule_set: impl Into<Arc<RuleSet>>,
        declared_type: Option<DeclaredType>,
    ) -> Self {
        let binding = self
            .bindings
            .entry(location)
            .or_insert_with(|| GlobalBinding {
                rule_sets: Vec::new(),
                declared_type: None,
            });
        binding.rule_sets.push(rule_set.into());
        if declared_type.is_some() {
            binding.declared_type = declared_type;
        }
        self
    }

    pub fn locations(&self) -> Vec<Location> {
        self.bindings.keys().copied().collect()
    }

    pub fn rule_sets(&self, location: Location) -> Vec<Arc<RuleSet>> {
        self.bindings
            .get(&location)
            .map(|b| b.rule_sets.clone())
            .unwrap_or_default()
    }

    pub fn declared_type(&self, location: Location) -> Option<DeclaredType> {
        self.bindings.get(&location).and_then(|b| b.declared_type)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rule;

    fn schema() -> Schema {
        Schema::builder("Pets")
            .location(Location::Body, RuleSet::new("Body").field("name", Rule::string()))
            .method(
                HttpMethod::Post,
                Location::Body,
                RuleSet::new("Post.Body").field("age", Rule::integer()),
            )
            .method(
                HttpMethod::Get,
                Location::Query,
                RuleSet::new("Get.Query").field("limit", Rule::integer()),
            )
            .build()
    }

    #[test]
    fn test_class_wide_then_method_specific() {
        let found = schema().resolve(HttpMethod::Post, Location::Body).unwrap();
        let names: Vec<_> = found.iter().map(|rs| rs.name()).collect();
        assert_eq!(names, vec!["Body", "Post.Body"]);
    }

    #[test]
    fn test_class_wide_only() {
        let found = schema().resolve(HttpMethod::Put, Location::Body).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "Body");
    }

    #[test]
    fn test_method_specific_only() {
        let found = schema().resolve(HttpMethod::Get, Location::Query).unwrap();
        assert_eq!(found[0].name(), "Get.Query");
        assert!(schema().lookup(HttpMethod::Post, Location::Query).is_empty());
    }

    #[test]
    fn test_missing_rule_set() {
        let err = schema().resolve(HttpMethod::Get, Location::Header).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingRuleSet {
                schema: "Pets".to_string(),
                method: HttpMethod::Get,
                location: Location::Header,
            }
        );
    }

    #[test]
    fn test_post_validate_registered() {
        let schema = Schema::builder("Range")
            .post_validate(|args| {
                if args.contains_key("start") {
                    Ok(())
                } else {
                    Err(vec![FieldFailure::new("start", "FieldRequiredException")])
                }
            })
            .build();
        let hook = schema.post_validate().unwrap();
        assert!(hook(&Map::new()).is_err());
    }

    #[test]
    fn test_global_args_stack() {
        let globals = GlobalArgs::new()
            .bind(Location::Header, RuleSet::new("Auth"))
            .bind_list(Location::Header, RuleSet::new("Trace"));
        assert_eq!(globals.locations(), vec![Location::Header]);
        assert_eq!(globals.rule_sets(Location::Header).len(), 2);
        assert_eq!(globals.declared_type(Location::Header), Some(DeclaredType::List));
        assert!(globals.rule_sets(Location::Cookie).is_empty());
    }
}
