// Registration-time errors

use rampart_core::{HttpMethod, Location};
use thiserror::Error;

/// Configuration errors detected while binding rule-sets to endpoints.
///
/// These never reach a client: an endpoint that fails to build is never
/// routed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{schema} has no {location} rule-set for {method}")]
    MissingRuleSet {
        schema: String,
        method: HttpMethod,
        location: Location,
    },

    #[error("{endpoint} declares no handler methods")]
    NoMethods { endpoint: String },

    #[error("{endpoint} declares {method} more than once")]
    DuplicateMethod { endpoint: String, method: HttpMethod },

    #[error("{rule_set} declares field {field} more than once")]
    DuplicateField { rule_set: String, field: String },

    #[error("invalid rule for {field}: {message}")]
    InvalidRule { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
