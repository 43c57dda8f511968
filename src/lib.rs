//! Rampart - declarative request validation and response envelopes
//!
//! Endpoints declare rule-sets per data location (path, body, query, header,
//! cookie), optionally scoped to an HTTP method. Requests are validated into
//! merged handler arguments or rejected with structured field failures, and
//! handler results are wrapped in a paginated JSON envelope.

// Re-export core functionality
pub use rampart_core::*;

// Re-export optional crates
#[cfg(feature = "validation")]
pub use rampart_validation;

#[cfg(feature = "openapi")]
pub use rampart_openapi;

#[cfg(feature = "config")]
pub use rampart_config;

#[cfg(all(feature = "validation", feature = "config"))]
mod configured;

#[cfg(all(feature = "validation", feature = "config"))]
pub use configured::ConfigureEndpoint;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ClientError, CookiePolicy, EnvelopeOptions, Error, FailureReason, FieldFailure,
        HttpMethod, HttpRequest, HttpResponse, HttpStatus, LogConfig, Location,
    };

    #[cfg(feature = "validation")]
    pub use rampart_validation::{
        Endpoint, EndpointBuilder, Field, GlobalArgs, HandlerSignature, Reply, Rule, RuleSet,
        Schema, SchemaError, ValidatedArgs,
    };

    #[cfg(feature = "openapi")]
    pub use rampart_openapi::{OpenApiBuilder, SwaggerFragment, fragment, fragments};

    #[cfg(feature = "config")]
    pub use rampart_config::{ConfigError, RampartConfig};

    #[cfg(all(feature = "validation", feature = "config"))]
    pub use crate::ConfigureEndpoint;
}
