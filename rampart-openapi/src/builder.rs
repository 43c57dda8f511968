//! Builder for OpenAPI documents assembled from endpoints

use crate::OpenApiError;
use crate::definitions::merged_schema;
use crate::fragment::{definition_name, documented_locations};
use crate::spec::*;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rampart_core::{HttpMethod, HttpStatus, JSON_CONTENT_TYPE, Location};
use rampart_validation::Endpoint;
use regex::Regex;
use tracing::{debug, warn};

static URL_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:[A-Za-z_][A-Za-z0-9_]*(?:\([^)]*\))?:)?([A-Za-z_][A-Za-z0-9_]*)>").unwrap());

/// Convert a router rule such as `/pets/<int:pet_id>` to `/pets/{pet_id}`.
pub fn openapi_path(rule: &str) -> String {
    URL_VARIABLE.replace_all(rule, "{$1}").into_owned()
}

/// Builder for OpenAPI documents
#[derive(Debug, Clone)]
pub struct OpenApiBuilder {
    spec: OpenApiSpec,
}

impl OpenApiBuilder {
    /// Create a new OpenAPI builder
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            spec: OpenApiSpec {
                openapi: "3.0.0".to_string(),
                info: Info {
                    title: title.into(),
                    version: version.into(),
                    description: None,
                },
                servers: Vec::new(),
                paths: IndexMap::new(),
                components: Some(Components::default()),
                tags: Vec::new(),
            },
        }
    }

    /// Set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.info.description = Some(description.into());
        self
    }

    /// Add a server
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.spec.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Add a tag
    pub fn tag(mut self, name: impl Into<String>, description: Option<String>) -> Self {
        let name = name.into();
        if !self.spec.tags.iter().any(|t| t.name == name) {
            self.spec.tags.push(Tag { name, description });
        }
        self
    }

    /// Add a path
    pub fn path(mut self, path: impl Into<String>, item: PathItem) -> Self {
        self.spec.paths.insert(path.into(), item);
        self
    }

    /// Add a schema component
    pub fn schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        if let Some(ref mut components) = self.spec.components {
            components.schemas.insert(name.into(), schema);
        }
        self
    }

    /// Document an endpoint under every URL rule it declares.
    pub fn endpoint(self, endpoint: &Endpoint) -> Self {
        if endpoint.url_rules().is_empty() {
            warn!(endpoint = %endpoint.name(), "endpoint has no URL rules; nothing documented");
        }
        let rules: Vec<String> = endpoint
            .url_rules()
            .iter()
            .map(|rule| {
                let path = openapi_path(rule);
                debug!(endpoint = %endpoint.name(), rule = %rule, path = %path, "converted URL rule");
                path
            })
            .collect();
        rules
            .iter()
            .fold(self, |builder, path| builder.endpoint_at(path, endpoint))
    }

    /// Document an endpoint under an explicit path.
    pub fn endpoint_at(mut self, path: impl Into<String>, endpoint: &Endpoint) -> Self {
        let path = path.into();
        for tag in endpoint.tags() {
            self = self.tag(tag.clone(), None);
        }

        let mut item = self.spec.paths.shift_remove(&path).unwrap_or_default();
        for binding in endpoint.methods() {
            let name = definition_name(endpoint, binding.method);
            let mut operation = OperationBuilder::new()
                .operation_id(name.clone())
                .response(
                    success_status(binding.method).to_string(),
                    Response {
                        description: "Success".to_string(),
                        content: None,
                    },
                )
                .response(
                    HttpStatus::BadRequest.code().to_string(),
                    Response {
                        description: "Validation failed".to_string(),
                        content: None,
                    },
                );
            if let Some(summary) = endpoint.summary() {
                operation = operation.summary(summary);
            }
            if let Some(description) = endpoint.description() {
                operation = operation.description(description);
            }
            for tag in endpoint.tags() {
                operation = operation.tag(tag.clone());
            }

            for (_, location, rule_sets) in documented_locations(endpoint, binding) {
                let schema = merged_schema(&rule_sets);
                match location {
                    Location::Body => {
                        let required = !schema.required.is_empty();
                        let existing = self
                            .spec
                            .components
                            .as_ref()
                            .and_then(|c| c.schemas.get(&name));
                        if existing.is_some_and(|s| *s != schema) {
                            warn!(definition = %name, "component schema name collision; replacing");
                        }
                        self = self.schema(name.clone(), schema);
                        operation = operation.request_body(RequestBody {
                            description: None,
                            content: IndexMap::from([(
                                JSON_CONTENT_TYPE.to_string(),
                                MediaType {
                                    schema: Some(ref_schema(&name)),
                                },
                            )]),
                            required,
                        });
                    }
                    _ => {
                        for (field, prop) in schema.properties.unwrap_or_default() {
                            operation = operation.parameter(Parameter {
                                required: location == Location::ViewArg
                                    || schema.required.contains(&field),
                                description: prop.description.clone(),
                                name: field,
                                location: parameter_location(location),
                                schema: Some(prop),
                            });
                        }
                    }
                }
            }

            item.set(binding.method, operation.build());
        }

        self.spec.paths.insert(path, item);
        self
    }

    /// Build the OpenAPI document
    pub fn build(self) -> OpenApiSpec {
        self.spec
    }
}

fn success_status(method: HttpMethod) -> u16 {
    HttpStatus::for_payload(method, true).code()
}

fn parameter_location(location: Location) -> ParameterLocation {
    match location {
        Location::ViewArg => ParameterLocation::Path,
        Location::Header => ParameterLocation::Header,
        Location::Cookie => ParameterLocation::Cookie,
        Location::Query | Location::Body => ParameterLocation::Query,
    }
}

impl PathItem {
    /// Store an operation under its HTTP method.
    pub fn set(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
        };
        *slot = Some(operation);
    }

    pub fn get_operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
        }
    }
}

impl OpenApiSpec {
    pub fn to_json(&self) -> Result<String, OpenApiError> {
        serde_json::to_string_pretty(self).map_err(|e| OpenApiError::Serialization(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, OpenApiError> {
        serde_yaml::to_string(self).map_err(|e| OpenApiError::Serialization(e.to_string()))
    }
}

/// Builder for operations
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    pub fn new() -> Self {
        Self {
            operation: Operation::default(),
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.operation.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.operation.description = Some(description.into());
        self
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation.operation_id = Some(id.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.operation.tags.push(tag.into());
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.operation.parameters.push(parameter);
        self
    }

    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.operation.request_body = Some(body);
        self
    }

    pub fn response(mut self, status: impl Into<String>, response: Response) -> Self {
        self.operation.responses.insert(status.into(), response);
        self
    }

    pub fn build(self) -> Operation {
        self.operation
    }
}

impl Default for OperationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ref_schema(reference: impl Into<String>) -> Schema {
    Schema {
        reference: Some(format!("#/components/schemas/{}", reference.into())),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_validation::{Field, HandlerSignature, Rule, RuleSet};

    fn pets() -> Endpoint {
        let schema = rampart_validation::Schema::builder("Pets")
            .location(Location::ViewArg, RuleSet::new("ViewArg").field("pet_id", Rule::integer()))
            .location(Location::Cookie, RuleSet::new("Cookie").field("session", Rule::string()))
            .method(
                HttpMethod::Put,
                Location::Body,
                RuleSet::new("Put.Body").field("name", Field::new(Rule::string()).required()),
            )
            .build();

        Endpoint::builder("Pets", schema)
            .tag("pets")
            .url_rule("/pets/<int:pet_id>")
            .method(HttpMethod::Get, HandlerSignature::builder().param("pet_id").param("cookie").build())
            .method(HttpMethod::Put, HandlerSignature::builder().param("pet_id").param("body").build())
            .build()
            .unwrap()
    }

    #[test]
    fn test_openapi_path() {
        assert_eq!(openapi_path("/pets/<int:pet_id>"), "/pets/{pet_id}");
        assert_eq!(openapi_path("/files/<path:name>/raw"), "/files/{name}/raw");
        assert_eq!(openapi_path("/users/<user_id>"), "/users/{user_id}");
        assert_eq!(openapi_path("/plain"), "/plain");
    }

    #[test]
    fn test_openapi_builder_basic() {
        let spec = OpenApiBuilder::new("Test API", "1.0.0").description("A test API").build();

        assert_eq!(spec.info.title, "Test API");
        assert_eq!(spec.openapi, "3.0.0");
        assert_eq!(spec.info.description, Some("A test API".to_string()));
    }

    #[test]
    fn test_endpoint_operations() {
        let spec = OpenApiBuilder::new("Pets", "1.0.0").endpoint(&pets()).build();
        let item = &spec.paths["/pets/{pet_id}"];

        let get = item.get_operation(HttpMethod::Get).unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("Pets.Get"));
        let params: Vec<_> = get.parameters.iter().map(|p| (p.name.as_str(), p.location)).collect();
        assert_eq!(
            params,
            vec![("session", ParameterLocation::Cookie), ("pet_id", ParameterLocation::Path)]
        );
        assert!(get.parameters[1].required);
        assert!(get.responses.contains_key("200"));

        let put = item.get_operation(HttpMethod::Put).unwrap();
        let body = put.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(
            body.content["application/json"].schema.as_ref().unwrap().reference.as_deref(),
            Some("#/components/schemas/Pets.Put")
        );

        let components = spec.components.unwrap();
        assert!(components.schemas.contains_key("Pets.Put"));
        assert_eq!(spec.tags.len(), 1);
    }

    #[test]
    fn test_definition_name_collision_keeps_latest() {
        let other = Endpoint::builder(
            "Pets",
            rampart_validation::Schema::builder("Pets")
                .location(Location::Body, RuleSet::new("Body").field("tag", Rule::string()))
                .build(),
        )
        .url_rule("/legacy/pets")
        .method(HttpMethod::Put, HandlerSignature::builder().param("body").build())
        .build()
        .unwrap();

        let spec = OpenApiBuilder::new("Pets", "1.0.0")
            .endpoint(&pets())
            .endpoint(&pets())
            .endpoint(&other)
            .build();
        let schemas = spec.components.unwrap().schemas;
        assert_eq!(schemas.len(), 1);
        let props: Vec<_> = schemas["Pets.Put"].properties.as_ref().unwrap().keys().cloned().collect();
        assert_eq!(props, vec!["tag"]);
    }

    #[test]
    fn test_operation_builder() {
        let operation = OperationBuilder::new().summary("Get pet").tag("pets").tag("admin").build();
        assert_eq!(operation.summary, Some("Get pet".to_string()));
        assert_eq!(operation.tags.len(), 2);
    }

    #[test]
    fn test_ref_schema() {
        assert_eq!(
            ref_schema("Pet").reference,
            Some("#/components/schemas/Pet".to_string())
        );
    }
}
