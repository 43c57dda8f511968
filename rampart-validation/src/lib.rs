//! Declarative request validation for rampart endpoints
//!
//! Rule-sets are registered per data location, either class-wide or for a
//! single HTTP method. An [`Endpoint`] binds them to handler signatures once,
//! then validates every request against all rule-sets touching the
//! locations its handler reads.
//!
//! # Examples
//!
//! ## Rule-sets
//!
//! ```
//! use rampart_validation::{Field, Rule, RuleSet, aggregate};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let common = Arc::new(RuleSet::new("Body").field("name", Field::new(Rule::string()).required()));
//! let create = Arc::new(RuleSet::new("Post.Body").field("age", Rule::integer()));
//!
//! let outcome = aggregate(&json!({"name": "rex", "age": "3"}), &[common, create]);
//! assert!(outcome.is_valid());
//! assert_eq!(outcome.values, json!({"name": "rex", "age": 3}));
//! ```
//!
//! ## Failures
//!
//! ```
//! use rampart_core::Location;
//! use rampart_validation::{Field, Rule, RuleSet, validate};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let body = Arc::new(RuleSet::new("Body").field("email", Field::new(Rule::Email).required()));
//! let err = validate(Location::Body, "Users", &json!({"email": "nope"}), &[body]).unwrap_err();
//!
//! assert_eq!(err.error_type, "SchemaFieldsException");
//! assert_eq!(err.errors[0].location, "email");
//! assert_eq!(err.errors[0].reason, "FieldEmailTypeException");
//! ```

mod context;
mod endpoint;
mod errors;
mod field;
mod rule_set;
mod rules;
mod schema;
mod signature;
mod validator;
pub mod validators;

pub use context::*;
pub use endpoint::*;
pub use errors::*;
pub use field::*;
pub use rule_set::*;
pub use rules::*;
pub use schema::*;
pub use signature::*;
pub use validator::*;
