//! Endpoint registration and the per-request pipeline
//!
//! An [`Endpoint`] ties a [`Schema`] to the handler methods it serves.
//! Building it resolves every declared location to its rule-sets, so a
//! missing rule-set is a registration error rather than a request error.
//!
//! At request time [`Endpoint::dispatch`] runs the whole flow: extract and
//! validate each declared location, call the handler with the merged
//! arguments, then render the envelope or the error body.
//!
//! ```
//! use rampart_core::{HttpMethod, HttpRequest};
//! use rampart_validation::{Endpoint, Field, HandlerSignature, Reply, Rule, RuleSet, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::builder("Pets")
//!     .method(
//!         HttpMethod::Post,
//!         rampart_core::Location::Body,
//!         RuleSet::new("Body").field("name", Field::new(Rule::string()).required()),
//!     )
//!     .build();
//!
//! let endpoint = Endpoint::builder("Pets", schema)
//!     .method(HttpMethod::Post, HandlerSignature::builder().receiver().param("body").build())
//!     .build()
//!     .unwrap();
//!
//! let request = HttpRequest::new(HttpMethod::Post, "/pets")
//!     .with_json(&json!({"name": "rex"}))
//!     .unwrap();
//! let response = endpoint.dispatch(&request, |args| {
//!     Ok(Reply::new(args.get("body").cloned().unwrap_or_default()))
//! });
//! assert_eq!(response.status, 201);
//! ```

use crate::{GlobalArgs, HandlerSignature, RequestContext, RuleSet, Schema, SchemaError, Scope, validator};
use indexmap::IndexMap;
use rampart_core::{
    ClientError, CookiePolicy, EnvelopeOptions, Error, FieldFailure, HttpMethod, HttpRequest,
    HttpResponse, HttpStatus, Location, build_envelope, codes,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Rule-sets bound to one location of one handler method.
#[derive(Debug, Clone)]
pub struct LocationBinding {
    /// Handler parameter receiving the validated values
    pub param: String,
    pub location: Location,
    pub expect_list: bool,
    pub scope: Scope,
    pub rule_sets: Vec<Arc<RuleSet>>,
}

/// Resolved validation surface of one handler method.
#[derive(Debug, Clone)]
pub struct MethodBinding {
    pub method: HttpMethod,
    pub signature: HandlerSignature,
    pub locations: Vec<LocationBinding>,
}

impl MethodBinding {
    pub fn location(&self, location: Location) -> Option<&LocationBinding> {
        self.locations.iter().find(|b| b.location == location)
    }
}

/// A registered handler group with its resolved rule-sets.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    schema: Arc<Schema>,
    methods: IndexMap<HttpMethod, MethodBinding>,
    tags: Vec<String>,
    url_rules: Vec<String>,
    summary: Option<String>,
    description: Option<String>,
    envelope_options: EnvelopeOptions,
    cookie_policy: Option<CookiePolicy>,
}

impl Endpoint {
    pub fn builder(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> EndpointBuilder {
        EndpointBuilder {
            name: name.into(),
            schema: schema.into(),
            methods: Vec::new(),
            globals: GlobalArgs::new(),
            tags: Vec::new(),
            url_rules: Vec::new(),
            summary: None,
            description: None,
            envelope_options: EnvelopeOptions::default(),
            cookie_policy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodBinding> {
        self.methods.values()
    }

    pub fn binding(&self, method: HttpMethod) -> Option<&MethodBinding> {
        self.methods.get(&method)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn url_rules(&self) -> &[String] {
        &self.url_rules
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn envelope_options(&self) -> &EnvelopeOptions {
        &self.envelope_options
    }

    pub fn cookie_policy(&self) -> Option<&CookiePolicy> {
        self.cookie_policy.as_ref()
    }

    /// True when any registered method is PUT, DELETE or PATCH.
    pub fn supports_mutation(&self) -> bool {
        self.methods.keys().any(HttpMethod::is_mutation)
    }

    /// Validate every declared location of `request` and merge the results.
    pub fn validate_request(&self, request: &HttpRequest) -> Result<ValidatedArgs, ClientError> {
        let Some(binding) = self.methods.get(&request.method) else {
            warn!(handler = %self.name, method = %request.method, "method not allowed");
            return Err(ClientError::method_not_allowed(request.method.as_str(), &self.name));
        };

        let mut ctx = RequestContext::new(request);
        let span = tracing::info_span!(
            "validate_request",
            handler = %self.name,
            method = %request.method,
            request_id = %ctx.request_id()
        );
        let _enter = span.enter();

        let mut args = IndexMap::new();
        for lb in &binding.locations {
            let raw = match ctx.raw(lb.location, lb.expect_list) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(location = %lb.location, error = %e, "request data could not be extracted");
                    return Err(extraction_error(&self.name, e));
                }
            };

            debug!(
                location = %lb.location,
                rule_sets = lb.rule_sets.len(),
                "validating location"
            );
            match validator::validate(lb.location, &self.name, raw, &lb.rule_sets) {
                Ok(values) => {
                    args.insert(lb.param.clone(), values);
                }
                Err(err) => {
                    warn!(
                        location = %lb.location,
                        failures = err.errors.len(),
                        "request validation failed"
                    );
                    return Err(err);
                }
            }
        }

        spread_view_args(&binding.signature, request, &mut args);

        if let Some(hook) = self.schema.post_validate() {
            let merged = merged_fields(&args);
            if let Err(failures) = hook(&merged) {
                warn!(failures = failures.len(), "cross-field validation failed");
                return Err(ClientError::cross_field(&self.name, failures));
            }
        }

        Ok(ValidatedArgs {
            args,
            request_id: ctx.request_id().to_string(),
        })
    }

    /// Validate, run `handler`, and render the response.
    pub fn dispatch<F>(&self, request: &HttpRequest, handler: F) -> HttpResponse
    where
        F: FnOnce(ValidatedArgs) -> Result<Reply, ClientError>,
    {
        let args = match self.validate_request(request) {
            Ok(args) => args,
            Err(err) => return err.into_response(),
        };

        let reply = match handler(args) {
            Ok(reply) => reply,
            Err(err) => return err.into_response(),
        };

        let envelope = match build_envelope(
            request,
            reply.data,
            reply.message.as_deref(),
            self.supports_mutation(),
            &self.envelope_options,
        ) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(handler = %self.name, error = %e, "failed to render envelope");
                return server_error(e.to_string());
            }
        };

        let mut response = envelope.into_response();
        if reply.cookies.is_empty() {
            return response;
        }

        let Some(policy) = &self.cookie_policy else {
            error!(handler = %self.name, "handler set cookies but no cookie policy is configured");
            return server_error("no cookie policy configured");
        };
        for cookie in reply.cookies {
            let max_age = cookie.max_age.unwrap_or(policy.max_age);
            let descriptor = policy.build(request, cookie.name, cookie.value, max_age);
            response = response.with_cookie(&descriptor);
        }
        response
    }
}

fn extraction_error(domain: &str, error: Error) -> ClientError {
    let failure = FieldFailure::schema(codes::TYPE, error.to_string());
    ClientError::schema_validation(Location::Body, domain, vec![failure])
}

fn server_error(message: impl Into<String>) -> HttpResponse {
    ClientError::new(HttpStatus::InternalServerError, "ServerError", message).into_response()
}

/// Spread validated path values into the individual path parameters.
///
/// Matched values from the router fill parameters the rule-sets did not
/// produce, and declared defaults fill whatever remains.
fn spread_view_args(signature: &HandlerSignature, request: &HttpRequest, args: &mut IndexMap<String, Value>) {
    let path_params = signature.path_params();
    if path_params.is_empty() {
        return;
    }

    let view_param = signature
        .location_params()
        .into_iter()
        .find(|(_, location, _)| *location == Location::ViewArg)
        .map(|(name, _, _)| name.to_string());

    let validated = view_param
        .as_deref()
        .and_then(|name| args.shift_remove(name))
        .and_then(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    for name in path_params {
        let value = validated
            .get(name)
            .cloned()
            .or_else(|| request.path_params.get(name).map(|v| Value::String(v.clone())))
            .or_else(|| signature.get(name).and_then(|p| p.default.clone()));
        if let Some(value) = value {
            args.insert(name.to_string(), value);
        }
    }
}

/// Flatten location values and path parameters into one map.
fn merged_fields(args: &IndexMap<String, Value>) -> Map<String, Value> {
    let mut merged = Map::new();
    for (name, value) in args {
        match value {
            Value::Object(fields) if Location::from_param(name).is_some() => {
                merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            other => {
                merged.insert(name.clone(), other.clone());
            }
        }
    }
    merged
}

/// Arguments handed to a handler after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs {
    args: IndexMap<String, Value>,
    request_id: String,
}

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Deserialize an argument into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let value = self
            .args
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidRequest(format!("missing argument {}", name)))?;
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_map(self) -> IndexMap<String, Value> {
        self.args
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CookieRequest {
    pub name: String,
    pub value: String,
    /// `None` takes the policy's lifetime
    pub max_age: Option<i64>,
}

/// What a handler returns: payload, optional message and cookies to set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub data: Option<Value>,
    pub message: Option<String>,
    pub cookies: Vec<CookieRequest>,
}

impl Reply {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn set_cookie(mut self, name: impl Into<String>, value: impl Into<String>, max_age: i64) -> Self {
        self.cookies.push(CookieRequest {
            name: name.into(),
            value: value.into(),
            max_age: Some(max_age),
        });
        self
    }

    /// Set a cookie with the lifetime configured on the endpoint's policy.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push(CookieRequest {
            name: name.into(),
            value: value.into(),
            max_age: None,
        });
        self
    }
}

/// Builder for [`Endpoint`].
pub struct EndpointBuilder {
    name: String,
    schema: Arc<Schema>,
    methods: Vec<(HttpMethod, HandlerSignature)>,
    globals: GlobalArgs,
    tags: Vec<String>,
    url_rules: Vec<String>,
    summary: Option<String>,
    description: Option<String>,
    envelope_options: EnvelopeOptions,
    cookie_policy: Option<CookiePolicy>,
}

impl EndpointBuilder {
    pub fn method(mut self, method: HttpMethod, signature: HandlerSignature) -> Self {
        self.methods.push((method, signature));
        self
    }

    pub fn globals(mut self, globals: GlobalArgs) -> Self {
        self.globals = globals;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn url_rule(mut self, rule: impl Into<String>) -> Self {
        self.url_rules.push(rule.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn envelope_options(mut self, options: EnvelopeOptions) -> Self {
        self.envelope_options = options;
        self
    }

    pub fn cookie_policy(mut self, policy: CookiePolicy) -> Self {
        self.cookie_policy = Some(policy);
        self
    }

    /// Resolve every declared location; fails on the first unbound one.
    pub fn build(self) -> Result<Endpoint, SchemaError> {
        if self.methods.is_empty() {
            error!(endpoint = %self.name, "endpoint declares no methods");
            return Err(SchemaError::NoMethods { endpoint: self.name });
        }

        let mut methods = IndexMap::new();
        for (method, signature) in self.methods {
            if methods.contains_key(&method) {
                error!(endpoint = %self.name, method = %method, "duplicate method");
                return Err(SchemaError::DuplicateMethod {
                    endpoint: self.name,
                    method,
                });
            }

            let signature = signature.with_globals(&self.globals);
            let mut locations = Vec::new();
            for (param, location, meta) in signature.location_params() {
                let rule_sets = match meta.scope {
                    Scope::Global => {
                        let mut rule_sets = self.schema.lookup(method, location);
                        rule_sets.extend(self.globals.rule_sets(location));
                        rule_sets
                    }
                    Scope::Local => self.schema.resolve(method, location).inspect_err(|e| {
                        error!(endpoint = %self.name, error = %e, "rule-set resolution failed");
                    })?,
                };
                locations.push(LocationBinding {
                    param: param.to_string(),
                    location,
                    expect_list: meta.expects_list(),
                    scope: meta.scope,
                    rule_sets,
                });
            }

            methods.insert(
                method,
                MethodBinding {
                    method,
                    signature,
                    locations,
                },
            );
        }

        info!(
            endpoint = %self.name,
            methods = ?methods.keys().map(HttpMethod::as_str).collect::<Vec<_>>(),
            "registered endpoint"
        );

        Ok(Endpoint {
            name: self.name,
            schema: self.schema,
            methods,
            tags: self.tags,
            url_rules: self.url_rules,
            summary: self.summary,
            description: self.description,
            envelope_options: self.envelope_options,
            cookie_policy: self.cookie_policy,
        })
    }
}
