//! Integration tests for rampart-openapi

use rampart_core::{HttpMethod, Location};
use rampart_openapi::*;
use rampart_validation::{Endpoint, Field, GlobalArgs, HandlerSignature, Rule, RuleSet};

fn accounts() -> Endpoint {
    let address = RuleSet::new("Address")
        .field("city", Field::new(Rule::string()).required())
        .field("zip", Rule::string_between(5, 5));

    let schema = rampart_validation::Schema::builder("Accounts")
        .location(
            Location::Query,
            RuleSet::new("Query")
                .field("limit", Field::new(Rule::integer()).default(20))
                .field("status", Rule::list(Rule::one_of(["active", "closed"]))),
        )
        .method(
            HttpMethod::Post,
            Location::Body,
            RuleSet::new("Post.Body")
                .field("email", Field::new(Rule::Email).required())
                .field("address", Rule::nested(address)),
        )
        .build();

    let globals = GlobalArgs::new().bind(
        Location::Header,
        RuleSet::new("Auth").field("x_api_key", Field::new(Rule::string()).required()),
    );

    Endpoint::builder("Accounts", schema)
        .tag("accounts")
        .url_rule("/accounts")
        .summary("Accounts")
        .description("Create and list accounts")
        .globals(globals)
        .method(HttpMethod::Get, HandlerSignature::builder().receiver().param("query").build())
        .method(HttpMethod::Post, HandlerSignature::builder().receiver().param("body").build())
        .build()
        .unwrap()
}

#[test]
fn test_openapi_builder_creation() {
    let spec = OpenApiBuilder::new("My API", "1.0.0").build();

    assert_eq!(spec.openapi, "3.0.0");
    assert_eq!(spec.info.title, "My API");
    assert_eq!(spec.info.version, "1.0.0");
}

#[test]
fn test_openapi_builder_with_server() {
    let spec = OpenApiBuilder::new("My API", "1.0.0")
        .server("https://api.example.com", Some("Production".to_string()))
        .build();

    assert_eq!(spec.servers.len(), 1);
    assert_eq!(spec.servers[0].url, "https://api.example.com");
}

#[test]
fn test_endpoint_document() {
    let spec = OpenApiBuilder::new("Accounts API", "1.0.0").endpoint(&accounts()).build();
    let item = &spec.paths["/accounts"];

    let get = item.get.as_ref().unwrap();
    let names: Vec<_> = get.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["limit", "status", "x_api_key"]);
    assert!(get.parameters[2].required);
    assert_eq!(get.parameters[2].location, ParameterLocation::Header);

    let post = item.post.as_ref().unwrap();
    assert!(post.responses.contains_key("201"));
    assert!(post.responses.contains_key("400"));

    let body_schema = &spec.components.as_ref().unwrap().schemas["Accounts.Post"];
    let address = &body_schema.properties.as_ref().unwrap()["address"];
    assert_eq!(address.required, vec!["city"]);
}

#[test]
fn test_fragments_per_method() {
    let endpoint = accounts();
    let all = fragments(&endpoint);
    assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![HttpMethod::Get, HttpMethod::Post]);

    let get = &all[&HttpMethod::Get];
    assert_eq!(get.summary, "Accounts");
    assert_eq!(get.description, "Create and list accounts");
    assert_eq!(get.tags, vec!["accounts"]);
    assert!(get.definitions.is_empty());

    let limit = &get.parameters[0];
    assert_eq!(limit.location, "query");
    assert_eq!(limit.param_type.as_deref(), Some("integer"));
    assert_eq!(limit.default, Some(serde_json::json!(20)));
    assert!(!limit.required);
}

#[test]
fn test_fragment_yaml_sections() {
    let endpoint = accounts();
    let yaml = fragment(&endpoint, HttpMethod::Post).unwrap().to_yaml().unwrap();

    let (head, body) = yaml.split_once("---\n").unwrap();
    assert_eq!(head, "Accounts\nCreate and list accounts\n");
    let tags = body.find("tags:").unwrap();
    let params = body.find("parameters:").unwrap();
    let defs = body.find("definitions:").unwrap();
    assert!(tags < params && params < defs);
    assert!(body.contains("Accounts.Post"));
}

#[test]
fn test_view_arg_implied_by_url_rules() {
    let schema = rampart_validation::Schema::builder("Files")
        .location(Location::ViewArg, RuleSet::new("ViewArg").field("name", Rule::string()))
        .location(Location::Query, RuleSet::new("Query").field("raw", Rule::Boolean))
        .build();
    let endpoint = Endpoint::builder("Files", schema)
        .url_rule("/files/<path:name>")
        .method(HttpMethod::Get, HandlerSignature::builder().param("query").build())
        .build()
        .unwrap();

    let frag = fragment(&endpoint, HttpMethod::Get).unwrap();
    let located: Vec<_> = frag
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location.as_str()))
        .collect();
    assert_eq!(located, vec![("raw", "query"), ("name", "path")]);

    let spec = OpenApiBuilder::new("Files", "1").endpoint(&endpoint).build();
    assert!(spec.paths.contains_key("/files/{name}"));
}

#[test]
fn test_openapi_spec_serialization() {
    let spec = OpenApiBuilder::new("My API", "1.0.0").endpoint(&accounts()).build();

    let json = spec.to_json().unwrap();
    assert!(json.contains("\"operationId\": \"Accounts.Get\""));
    let yaml = spec.to_yaml().unwrap();
    assert!(yaml.contains("openapi:"));
    assert!(yaml.contains("3.0.0"));
}
