//! Handler parameter declarations
//!
//! A handler states up front which request locations it reads and whether
//! each expects list values. Any other parameter is a URL path variable, and
//! its presence implies a `view_arg` location.
//!
//! ```
//! use rampart_core::Location;
//! use rampart_validation::HandlerSignature;
//! use serde_json::json;
//!
//! let sig = HandlerSignature::builder()
//!     .receiver()
//!     .param("pet_id")
//!     .list("query")
//!     .param_with_default("format", json!("full"))
//!     .variadic("kwargs")
//!     .build();
//!
//! assert!(sig.needs_view_arg());
//! assert_eq!(
//!     sig.locations(),
//!     vec![(Location::Query, true), (Location::ViewArg, false)]
//! );
//! assert_eq!(sig.path_params(), vec!["pet_id", "format"]);
//! ```

use crate::GlobalArgs;
use indexmap::IndexMap;
use rampart_core::Location;
use serde_json::Value;

/// Declared shape of a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Scalar,
    List,
    Map,
}

/// Whether a parameter comes from the handler or from its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
}

/// Kind of a raw parameter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Implicit receiver, never a request parameter
    Receiver,
    Named,
    /// Catch-all, never a request parameter
    Variadic,
}

/// One raw parameter as written on the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
    pub declared_type: Option<DeclaredType>,
}

impl ParamDecl {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Named,
            default: None,
            declared_type: None,
        }
    }

    pub fn receiver() -> Self {
        Self {
            kind: ParamKind::Receiver,
            ..Self::named("self")
        }
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Variadic,
            ..Self::named(name)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_type(mut self, declared_type: DeclaredType) -> Self {
        self.declared_type = Some(declared_type);
        self
    }
}

/// Metadata kept for each handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub default: Option<Value>,
    pub declared_type: Option<DeclaredType>,
    pub scope: Scope,
}

impl Param {
    /// List-typed location parameters split values on commas.
    pub fn expects_list(&self) -> bool {
        self.declared_type == Some(DeclaredType::List)
    }
}

/// Ordered parameter map for one handler method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerSignature {
    params: IndexMap<String, Param>,
}

impl HandlerSignature {
    /// Build a signature from raw declarations.
    ///
    /// Receiver and variadic parameters are skipped. A `view_arg` entry is
    /// synthesized when any remaining parameter is not a location name.
    pub fn inspect<I>(decls: I) -> Self
    where
        I: IntoIterator<Item = ParamDecl>,
    {
        let mut params = IndexMap::new();
        for decl in decls {
            if decl.kind != ParamKind::Named {
                continue;
            }
            params.insert(
                decl.name,
                Param {
                    default: decl.default,
                    declared_type: decl.declared_type,
                    scope: Scope::Local,
                },
            );
        }

        let mut sig = Self { params };
        if sig.has_path_params() {
            sig.ensure_view_arg();
        }
        sig
    }

    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Location parameters with their list expectation, in declaration order.
    pub fn locations(&self) -> Vec<(Location, bool)> {
        self.location_params()
            .into_iter()
            .map(|(_, location, param)| (location, param.expects_list()))
            .collect()
    }

    /// Location parameters as `(name, location, param)`.
    pub fn location_params(&self) -> Vec<(&str, Location, &Param)> {
        self.params
            .iter()
            .filter_map(|(name, param)| {
                Location::from_param(name).map(|location| (name.as_str(), location, param))
            })
            .collect()
    }

    pub fn has_location(&self, location: Location) -> bool {
        self.params
            .keys()
            .any(|name| Location::from_param(name) == Some(location))
    }

    /// Parameters that are URL path variables.
    pub fn path_params(&self) -> Vec<&str> {
        self.params
            .keys()
            .filter(|name| Location::from_param(name).is_none())
            .map(String::as_str)
            .collect()
    }

    pub fn has_path_params(&self) -> bool {
        self.params.keys().any(|name| Location::from_param(name).is_none())
    }

    pub fn needs_view_arg(&self) -> bool {
        self.has_location(Location::ViewArg)
    }

    /// Add the `view_arg` location if the handler has no path location yet.
    pub fn ensure_view_arg(&mut self) {
        if !self.has_location(Location::ViewArg) {
            self.params.insert(
                Location::ViewArg.as_str().to_string(),
                Param {
                    default: None,
                    declared_type: Some(DeclaredType::Map),
                    scope: Scope::Local,
                },
            );
        }
    }

    /// Inject group-level locations the handler does not declare itself.
    pub fn with_globals(mut self, globals: &GlobalArgs) -> Self {
        for location in globals.locations() {
            if self.has_location(location) {
                continue;
            }
            self.params.insert(
                location.as_str().to_string(),
                Param {
                    default: None,
                    declared_type: globals.declared_type(location),
                    scope: Scope::Global,
                },
            );
        }
        self
    }
}

/// Fluent construction of a [`HandlerSignature`].
#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    decls: Vec<ParamDecl>,
}

impl SignatureBuilder {
    pub fn receiver(mut self) -> Self {
        self.decls.push(ParamDecl::receiver());
        self
    }

    /// Scalar parameter: a location name or a path variable.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.decls.push(ParamDecl::named(name));
        self
    }

    /// Parameter whose values are lists.
    pub fn list(mut self, name: impl Into<String>) -> Self {
        self.decls
            .push(ParamDecl::named(name).with_type(DeclaredType::List));
        self
    }

    pub fn param_with_default(mut self, name: impl Into<String>, default: Value) -> Self {
        self.decls.push(ParamDecl::named(name).with_default(default));
        self
    }

    pub fn variadic(mut self, name: impl Into<String>) -> Self {
        self.decls.push(ParamDecl::variadic(name));
        self
    }

    pub fn decl(mut self, decl: ParamDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn build(self) -> HandlerSignature {
        HandlerSignature::inspect(self.decls)
    }
}
