//! OpenAPI documents and Swagger fragments for rampart endpoints
//!
//! Both outputs read the same resolved rule-sets the request pipeline
//! validates with, so documentation cannot drift from validation.
//!
//! ## OpenAPI 3.0 documents
//!
//! ```
//! use rampart_core::{HttpMethod, Location};
//! use rampart_openapi::OpenApiBuilder;
//! use rampart_validation::{Endpoint, Field, HandlerSignature, Rule, RuleSet, Schema};
//!
//! let schema = Schema::builder("Pets")
//!     .location(Location::ViewArg, RuleSet::new("ViewArg").field("pet_id", Rule::integer()))
//!     .method(
//!         HttpMethod::Put,
//!         Location::Body,
//!         RuleSet::new("Put.Body").field("name", Field::new(Rule::string()).required()),
//!     )
//!     .build();
//! let endpoint = Endpoint::builder("Pets", schema)
//!     .url_rule("/pets/<int:pet_id>")
//!     .method(HttpMethod::Put, HandlerSignature::builder().param("pet_id").param("body").build())
//!     .build()
//!     .unwrap();
//!
//! let spec = OpenApiBuilder::new("Pet API", "1.0.0").endpoint(&endpoint).build();
//! assert!(spec.paths.contains_key("/pets/{pet_id}"));
//! assert!(spec.to_yaml().unwrap().contains("Pets.Put"));
//! ```
//!
//! ## Swagger fragments
//!
//! See [`fragment()`] for per-method YAML fragments in Swagger 2.0 form.

pub mod builder;
pub mod definitions;
pub mod error;
pub mod fragment;
pub mod spec;

pub use builder::*;
pub use definitions::*;
pub use error::*;
pub use fragment::*;
pub use spec::*;
