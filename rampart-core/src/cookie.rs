// Secure cookie policy

use crate::{Error, HttpRequest};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A cookie ready to be rendered as a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDescriptor {
    pub name: String,
    pub value: String,
    /// Lifetime in seconds
    pub max_age: i64,
    pub http_only: bool,
    pub secure: bool,
    /// Always dot-prefixed, e.g. `.example.com`
    pub domain: String,
    pub same_site: SameSite,
    pub path: String,
}

impl CookieDescriptor {
    pub fn to_header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Domain={}; Path={}; Max-Age={}",
            self.name, self.value, self.domain, self.path, self.max_age
        );
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        let _ = write!(out, "; SameSite={}", self.same_site.as_str());
        out
    }
}

/// Derives domain-scoped cookie descriptors from a trusted-domain list.
///
/// The domain is the first trusted domain that occurs inside the request
/// host, falling back to the first entry. Order the list most-specific first:
/// with `["example.com", "api.example.com"]` a request to `api.example.com`
/// still gets `.example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePolicy {
    pub trusted_domains: Vec<String>,
    pub http_only: bool,
    pub same_site_preferred: bool,
    pub path: String,
    /// Lifetime in seconds for cookies issued without an explicit one
    pub max_age: i64,
}

impl CookiePolicy {
    pub fn new<I, S>(trusted_domains: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let trusted_domains: Vec<String> = trusted_domains
            .into_iter()
            .map(|d| {
                let d: String = d.into();
                d.trim().trim_start_matches('.').to_string()
            })
            .filter(|d| !d.is_empty())
            .collect();

        if trusted_domains.is_empty() {
            return Err(Error::Configuration(
                "cookie policy needs at least one trusted domain".to_string(),
            ));
        }

        Ok(Self {
            trusted_domains,
            http_only: true,
            same_site_preferred: true,
            path: "/".to_string(),
            max_age: 3600,
        })
    }

    /// Parse a comma-separated domain list such as `api.example.com,example.com`.
    pub fn from_csv(domains: &str) -> Result<Self, Error> {
        Self::new(domains.split(','))
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site_preferred(mut self, preferred: bool) -> Self {
        self.same_site_preferred = preferred;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    /// Trusted domain for a host, dot-prefixed.
    pub fn domain_for(&self, host: &str) -> String {
        let chosen = self
            .trusted_domains
            .iter()
            .find(|d| host.contains(d.as_str()))
            .or_else(|| self.trusted_domains.first())
            .map(String::as_str)
            .unwrap_or_default();
        format!(".{}", chosen)
    }

    /// Build a cookie for the current request.
    pub fn build(
        &self,
        request: &HttpRequest,
        name: impl Into<String>,
        value: impl Into<String>,
        max_age: i64,
    ) -> CookieDescriptor {
        let secure = request.is_secure();
        let same_site = if secure && self.same_site_preferred {
            SameSite::Strict
        } else {
            SameSite::None
        };

        CookieDescriptor {
            name: name.into(),
            value: value.into(),
            max_age,
            http_only: self.http_only,
            secure,
            domain: self.domain_for(request.hostname()),
            same_site,
            path: self.path.clone(),
        }
    }
}
