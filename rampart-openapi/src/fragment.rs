//! Swagger 2.0 operation fragments
//!
//! Each handler method gets a YAML docstring-style fragment: the summary,
//! the description, a `---` separator, then `tags`, `parameters` and, when a
//! body is declared, `definitions`. Body parameters reference
//! `#/definitions/<Endpoint>.<Method>`; every other location is flattened
//! into one parameter per field.
//!
//! ```
//! use rampart_core::{HttpMethod, Location};
//! use rampart_openapi::fragment;
//! use rampart_validation::{Endpoint, Field, HandlerSignature, Rule, RuleSet, Schema};
//!
//! let schema = Schema::builder("Pets")
//!     .location(Location::Query, RuleSet::new("Query").field("limit", Field::new(Rule::integer()).default(20)))
//!     .build();
//! let endpoint = Endpoint::builder("Pets", schema)
//!     .tag("pets")
//!     .method(HttpMethod::Get, HandlerSignature::builder().param("query").build())
//!     .build()
//!     .unwrap();
//!
//! let frag = fragment(&endpoint, HttpMethod::Get).unwrap();
//! assert_eq!(frag.parameters[0].name, "limit");
//! assert_eq!(frag.parameters[0].location, "query");
//! assert!(frag.to_yaml().unwrap().starts_with("Pets.Get\nPets.Get\n---\n"));
//! ```

use crate::definitions::merged_schema;
use crate::spec::Schema;
use crate::OpenApiError;
use indexmap::IndexMap;
use rampart_core::{HttpMethod, Location};
use rampart_validation::{Endpoint, MethodBinding, RuleSet};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One Swagger 2.0 parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterFragment {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Documentation for one handler method.
#[derive(Debug, Clone, PartialEq)]
pub struct SwaggerFragment {
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterFragment>,
    pub definitions: IndexMap<String, Schema>,
}

impl SwaggerFragment {
    /// Render as `summary`, `description`, `---`, then the YAML sections.
    pub fn to_yaml(&self) -> Result<String, OpenApiError> {
        let mut output = vec![
            self.summary.clone(),
            self.description.clone(),
            "---".to_string(),
            section("tags", &self.tags)?,
            section("parameters", &self.parameters)?,
        ];
        if !self.definitions.is_empty() {
            output.push(section("definitions", &self.definitions)?);
        }
        Ok(output.join("\n"))
    }
}

fn section<T: Serialize>(key: &str, value: &T) -> Result<String, OpenApiError> {
    serde_yaml::to_string(&IndexMap::from([(key, value)]))
        .map_err(|e| OpenApiError::Serialization(e.to_string()))
}

/// Definition name for an endpoint method, e.g. `Pets.Post`.
pub fn definition_name(endpoint: &Endpoint, method: HttpMethod) -> String {
    format!("{}.{}", endpoint.name(), method.title())
}

/// Rule-sets per location for a method, including an implied `view_arg`
/// when the endpoint declares URL rules.
pub fn documented_locations(endpoint: &Endpoint, binding: &MethodBinding) -> Vec<(String, Location, Vec<Arc<RuleSet>>)> {
    let mut locations: Vec<_> = binding
        .locations
        .iter()
        .map(|lb| (lb.param.clone(), lb.location, lb.rule_sets.clone()))
        .collect();

    if !endpoint.url_rules().is_empty() && binding.location(Location::ViewArg).is_none() {
        let rule_sets = endpoint.schema().lookup(binding.method, Location::ViewArg);
        locations.push((Location::ViewArg.as_str().to_string(), Location::ViewArg, rule_sets));
    }
    locations
}

/// Fragment for one method, or `None` when the endpoint does not serve it.
pub fn fragment(endpoint: &Endpoint, method: HttpMethod) -> Option<SwaggerFragment> {
    let binding = endpoint.binding(method)?;
    let class_name = definition_name(endpoint, method);

    let mut parameters = Vec::new();
    let mut definitions = IndexMap::new();

    for (param, location, rule_sets) in documented_locations(endpoint, binding) {
        let schema = merged_schema(&rule_sets);
        match location {
            Location::Body => {
                parameters.push(ParameterFragment {
                    name: param,
                    location: "body".to_string(),
                    param_type: None,
                    format: None,
                    required: !schema.required.is_empty(),
                    default: None,
                    schema: Some(Schema {
                        reference: Some(format!("#/definitions/{}", class_name)),
                        ..Default::default()
                    }),
                });
                definitions.insert(class_name.clone(), schema);
            }
            // Swagger 2.0 has no cookie parameters
            Location::Cookie => {}
            _ => {
                let required = schema.required;
                for (name, prop) in schema.properties.unwrap_or_default() {
                    parameters.push(ParameterFragment {
                        required: required.contains(&name),
                        name,
                        location: location.openapi_in().to_string(),
                        param_type: prop.schema_type,
                        format: prop.format,
                        default: prop.default,
                        schema: None,
                    });
                }
            }
        }
    }

    Some(SwaggerFragment {
        summary: endpoint.summary().map(str::to_string).unwrap_or_else(|| class_name.clone()),
        description: endpoint
            .description()
            .map(str::to_string)
            .unwrap_or_else(|| class_name.clone()),
        tags: endpoint.tags().to_vec(),
        parameters,
        definitions,
    })
}

/// Fragments for every method the endpoint serves, in registration order.
pub fn fragments(endpoint: &Endpoint) -> IndexMap<HttpMethod, SwaggerFragment> {
    endpoint
        .methods()
        .filter_map(|b| fragment(endpoint, b.method).map(|f| (b.method, f)))
        .collect()
}
