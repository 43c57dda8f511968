// HTTP request and response types

use crate::{CookieDescriptor, Error, HttpStatus};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// HTTP request methods understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Capitalized form used in definition names (`Get`, `Post`, ...).
    pub fn title(&self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Head => "Head",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Delete => "Delete",
            HttpMethod::Patch => "Patch",
            HttpMethod::Options => "Options",
        }
    }

    /// PUT, DELETE and PATCH modify an existing resource.
    pub fn is_mutation(&self) -> bool {
        matches!(self, HttpMethod::Put | HttpMethod::Delete | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(Error::InvalidRequest(format!("unsupported method: {}", s))),
        }
    }
}

/// HTTP request as seen by the validation pipeline.
///
/// Query pairs and headers keep their arrival order and may repeat.
/// `path_params` holds the variables matched by the hosting router.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub path_params: IndexMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
            path_params: IndexMap::new(),
        }
    }

    /// Build a request from an absolute URL.
    pub fn from_url(method: HttpMethod, raw: &str) -> Result<Self, Error> {
        let url = Url::parse(raw).map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::InvalidRequest(format!("missing host: {}", raw))),
        };

        Ok(Self {
            method,
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
            query: url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            headers: Vec::new(),
            body: Vec::new(),
            path_params: IndexMap::new(),
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and the matching content type.
    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        Ok(self)
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a query parameter in arrival order.
    pub fn query_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Cookie pairs parsed from every `Cookie` header.
    pub fn cookie_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().trim_matches('"').to_string()))
            })
            .collect()
    }

    pub fn referer(&self) -> Option<&str> {
        self.header("referer")
    }

    /// True when the referer or the request scheme is HTTPS.
    pub fn is_secure(&self) -> bool {
        self.referer().is_some_and(|r| r.starts_with("https"))
            || self.scheme.eq_ignore_ascii_case("https")
    }

    /// Host without any port suffix.
    pub fn hostname(&self) -> &str {
        match self.host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => &self.host,
        }
    }

    /// `scheme://host/path` without the query string.
    pub fn base_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path)
    }

    /// Base URL followed by the given query pairs, if any.
    pub fn url_with_query(&self, pairs: &[(String, String)]) -> String {
        let base = self.base_url();
        if pairs.is_empty() {
            return base;
        }
        match serde_urlencoded::to_string(pairs) {
            Ok(qs) => format!("{}?{}", base, qs),
            Err(_) => base,
        }
    }

    /// Full request URL.
    pub fn url(&self) -> String {
        self.url_with_query(&self.query)
    }
}

/// HTTP response produced by the envelope builder or the error taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_status(status: HttpStatus) -> Self {
        Self::new(status.code())
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        self.set_header("Content-Type", "application/json");
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Append a `Set-Cookie` header for the descriptor.
    pub fn with_cookie(self, cookie: &CookieDescriptor) -> Self {
        self.with_header("Set-Cookie", cookie.to_header_value())
    }

    /// Replace every header with this name by a single value.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn body_str(&self) -> Result<&str, Error> {
        std::str::from_utf8(&self.body).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("BREW".parse::<HttpMethod>().is_err());
        assert!(HttpMethod::Delete.is_mutation());
        assert!(!HttpMethod::Post.is_mutation());
    }

    #[test]
    fn test_from_url() {
        let req =
            HttpRequest::from_url(HttpMethod::Get, "https://api.example.com:8443/users?a=1&a=2")
                .unwrap();
        assert_eq!(req.scheme, "https");
        assert_eq!(req.host, "api.example.com:8443");
        assert_eq!(req.hostname(), "api.example.com");
        assert_eq!(req.path, "/users");
        assert_eq!(req.query_values("a").collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(req.url(), "https://api.example.com:8443/users?a=1&a=2");
        assert_eq!(req.base_url(), "https://api.example.com:8443/users");
    }

    #[test]
    fn test_from_url_rejects_relative() {
        assert!(HttpRequest::from_url(HttpMethod::Get, "/users").is_err());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest::new(HttpMethod::Get, "/").with_header("X-Request-Id", "abc");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn test_cookie_parsing() {
        let req = HttpRequest::new(HttpMethod::Get, "/")
            .with_header("Cookie", "session=abc; theme=\"dark\"; =skip; flag");
        assert_eq!(
            req.cookie_pairs(),
            vec![
                ("session".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ]
        );
    }

    #[test]
    fn test_is_secure() {
        let plain = HttpRequest::new(HttpMethod::Get, "/");
        assert!(!plain.is_secure());

        let referred = plain.clone().with_header("Referer", "https://app.example.com/");
        assert!(referred.is_secure());

        let mut tls = HttpRequest::new(HttpMethod::Get, "/");
        tls.scheme = "https".to_string();
        assert!(tls.is_secure());
    }

    #[test]
    fn test_response_headers() {
        let mut res = HttpResponse::new(200).with_header("X-A", "1");
        res.set_header("content-type", "text/plain");
        res.set_header("Content-Type", "application/json");
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.headers.len(), 2);
    }
}
