//! Request data locations.
//!
//! Every piece of client-supplied data a handler can declare comes from one
//! of five places on the request. The location decides how raw data is
//! extracted and which rule-sets validate it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A standardized source of request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Matched URL path variables (`view_arg`, alias `path`)
    ViewArg,
    /// JSON or form-encoded request body
    Body,
    /// Query string
    Query,
    /// Request headers
    Header,
    /// Cookies from the `Cookie` header
    Cookie,
}

impl Location {
    /// All locations, in the order the pipeline visits them.
    pub const ALL: [Location; 5] = [
        Location::ViewArg,
        Location::Body,
        Location::Query,
        Location::Header,
        Location::Cookie,
    ];

    /// Parameter name a handler uses to ask for this location.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::ViewArg => "view_arg",
            Location::Body => "body",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
        }
    }

    /// Map a handler parameter name to a location.
    ///
    /// `path` is accepted as an alias of `view_arg`.
    pub fn from_param(name: &str) -> Option<Self> {
        match name {
            "view_arg" | "path" => Some(Location::ViewArg),
            "body" => Some(Location::Body),
            "query" => Some(Location::Query),
            "header" => Some(Location::Header),
            "cookie" => Some(Location::Cookie),
            _ => None,
        }
    }

    /// Capitalized, underscore-stripped category name (`ViewArg`, `Body`, ...).
    pub fn category(&self) -> &'static str {
        match self {
            Location::ViewArg => "ViewArg",
            Location::Body => "Body",
            Location::Query => "Query",
            Location::Header => "Header",
            Location::Cookie => "Cookie",
        }
    }

    /// Lower-cased category, stamped on every failure record.
    pub fn location_type(&self) -> &'static str {
        match self {
            Location::ViewArg => "viewarg",
            Location::Body => "body",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
        }
    }

    /// Value of the OpenAPI `in` field for parameters from this location.
    pub fn openapi_in(&self) -> &'static str {
        match self {
            Location::ViewArg => "path",
            Location::Body => "body",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::from_param(s).ok_or_else(|| crate::Error::UnknownLocation(s.to_string()))
    }
}
