//! Raw request data extraction
//!
//! One accessor per [`Location`], each returning the untyped payload as a
//! JSON value: an object mapping field names to a scalar string or a list of
//! strings, or for JSON bodies whatever the client sent.
//!
//! Repeated query keys and headers become lists. When the caller expects a
//! list, every value is additionally split on commas, so `?tag=a,b&tag=c`
//! yields `["a", "b", "c"]`. Absent data always yields an empty object.
//!
//! ```
//! use rampart_core::{HttpMethod, HttpRequest, Location, RequestData};
//! use serde_json::json;
//!
//! let req = HttpRequest::new(HttpMethod::Get, "/pets")
//!     .with_query("tag", "a,b")
//!     .with_query("tag", "c");
//!
//! assert_eq!(req.extract(Location::Query, true).unwrap(), json!({"tag": ["a", "b", "c"]}));
//! assert_eq!(req.extract(Location::Query, false).unwrap(), json!({"tag": ["a,b", "c"]}));
//! ```

use crate::{Error, HttpRequest, Location};
use serde_json::{Map, Value};

/// Source of raw, unvalidated request data.
pub trait RequestData {
    /// Matched URL path variables.
    fn view_args(&self) -> Value;

    /// JSON body, or form fields when the body is form-encoded.
    fn body(&self, expect_list: bool) -> Result<Value, Error>;

    fn query(&self, expect_list: bool) -> Value;

    /// Headers keyed by lower-cased name with `-` replaced by `_`.
    fn headers(&self, expect_list: bool) -> Value;

    fn cookies(&self) -> Value;

    /// Raw payload for a location.
    fn extract(&self, location: Location, expect_list: bool) -> Result<Value, Error> {
        match location {
            Location::ViewArg => Ok(self.view_args()),
            Location::Body => self.body(expect_list),
            Location::Query => Ok(self.query(expect_list)),
            Location::Header => Ok(self.headers(expect_list)),
            Location::Cookie => Ok(self.cookies()),
        }
    }
}

/// Fold ordered pairs into an object, keeping multi-value semantics.
pub fn fold_pairs<I, K, V>(pairs: I, expect_list: bool) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut out = Map::new();
    for (key, value) in pairs {
        let key = key.into();
        let value = value.as_ref();

        if expect_list {
            let parts = value.split(',').map(|p| Value::String(p.to_string()));
            match out.get_mut(&key) {
                Some(Value::Array(list)) => list.extend(parts),
                _ => {
                    out.insert(key, Value::Array(parts.collect()));
                }
            }
            continue;
        }

        match out.get_mut(&key) {
            None => {
                out.insert(key, Value::String(value.to_string()));
            }
            Some(Value::Array(list)) => list.push(Value::String(value.to_string())),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value.to_string())]);
            }
        }
    }
    Value::Object(out)
}

fn is_form(req: &HttpRequest) -> bool {
    req.header("content-type")
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn looks_like_json(req: &HttpRequest, trimmed: &[u8]) -> bool {
    req.header("content-type").is_some_and(|ct| ct.contains("json"))
        || matches!(trimmed.first(), Some(b'{') | Some(b'['))
}

impl RequestData for HttpRequest {
    fn view_args(&self) -> Value {
        Value::Object(
            self.path_params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    fn body(&self, expect_list: bool) -> Result<Value, Error> {
        let trimmed = self.body.trim_ascii();
        if trimmed.is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        if !is_form(self) {
            match serde_json::from_slice::<Value>(trimmed) {
                Ok(Value::Null) => return Ok(Value::Object(Map::new())),
                Ok(value) => return Ok(value),
                Err(e) if looks_like_json(self, trimmed) => {
                    return Err(Error::InvalidRequest(format!("malformed JSON body: {}", e)));
                }
                Err(_) => {}
            }
        }

        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(trimmed)
            .map_err(|e| Error::InvalidRequest(format!("malformed form body: {}", e)))?;
        Ok(fold_pairs(pairs, expect_list))
    }

    fn query(&self, expect_list: bool) -> Value {
        fold_pairs(self.query.iter().map(|(k, v)| (k.clone(), v)), expect_list)
    }

    fn headers(&self, expect_list: bool) -> Value {
        fold_pairs(
            self.headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase().replace('-', "_"), v)),
            expect_list,
        )
    }

    fn cookies(&self) -> Value {
        fold_pairs(self.cookie_pairs(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn get() -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "/things")
    }

    #[test]
    fn test_empty_locations_are_empty_objects() {
        let req = get();
        for location in Location::ALL {
            assert_eq!(req.extract(location, false).unwrap(), json!({}));
        }
    }

    #[test]
    fn test_query_multi_value() {
        let req = get().with_query("a", "1").with_query("b", "x,y").with_query("a", "2");
        assert_eq!(req.query(false), json!({"a": ["1", "2"], "b": "x,y"}));
        assert_eq!(req.query(true), json!({"a": ["1", "2"], "b": ["x", "y"]}));
    }

    #[test]
    fn test_header_names_normalized() {
        let req = get().with_header("X-Api-Key", "k").with_header("Accept", "a/b");
        assert_eq!(req.headers(false), json!({"x_api_key": "k", "accept": "a/b"}));
    }

    #[test]
    fn test_json_body() {
        let req = HttpRequest::new(HttpMethod::Post, "/things")
            .with_json(&json!([{"id": 1}, {"id": 2}]))
            .unwrap();
        assert_eq!(req.body(false).unwrap(), json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_null_json_body_is_empty() {
        let req = HttpRequest::new(HttpMethod::Post, "/").with_body("null");
        assert_eq!(req.body(false).unwrap(), json!({}));
    }

    #[test]
    fn test_form_body() {
        let req = HttpRequest::new(HttpMethod::Post, "/")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("name=rex&tags=a%2Cb");
        assert_eq!(req.body(false).unwrap(), json!({"name": "rex", "tags": "a,b"}));
        assert_eq!(req.body(true).unwrap(), json!({"name": ["rex"], "tags": ["a", "b"]}));
    }

    #[test]
    fn test_malformed_json_body() {
        let req = HttpRequest::new(HttpMethod::Post, "/")
            .with_header("Content-Type", "application/json")
            .with_body("{\"name\": ");
        assert!(matches!(req.body(false), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_cookies_and_view_args() {
        let req = get()
            .with_header("Cookie", "sid=1; theme=dark")
            .with_path_param("pet_id", "7");
        assert_eq!(req.extract(Location::Cookie, false).unwrap(), json!({"sid": "1", "theme": "dark"}));
        assert_eq!(req.extract(Location::ViewArg, false).unwrap(), json!({"pet_id": "7"}));
    }
}
