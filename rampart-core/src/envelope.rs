//! Response envelope builder
//!
//! Wraps a handler's success payload into the canonical envelope:
//!
//! ```json
//! {"data": {"currentItemCount": 2, "selfLink": "...", "nextLink": "...", "startKey": "...", "items": [...]}}
//! ```
//!
//! The status code is chosen from the request method and whether the payload
//! is empty. Pagination follows the cursor convention: a payload carrying
//! `last_key` gets a `nextLink` that repeats the current query with
//! `start_key` set to the serialized cursor.
//!
//! # Examples
//!
//! ```
//! use rampart_core::{build_envelope, EnvelopeOptions, HttpMethod, HttpRequest};
//! use serde_json::json;
//!
//! let req = HttpRequest::from_url(HttpMethod::Get, "http://api.test/pets?foo=bar").unwrap();
//! let res = build_envelope(
//!     &req,
//!     Some(json!({"items": [{"id": 1}, {"id": 2}], "last_key": {"id": 2}})),
//!     None,
//!     false,
//!     &EnvelopeOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(res.status.code(), 200);
//! let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
//! assert_eq!(body["data"]["currentItemCount"], json!(2));
//! ```

use crate::{Error, HttpRequest, HttpResponse, HttpMethod, HttpStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dotted JavaScript identifier accepted as a JSONP callback name.
static CALLBACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("valid callback regex")
});

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const JSONP_CONTENT_TYPE: &str = "application/javascript";

/// Envelope wire options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeOptions {
    /// Query parameter naming the JSONP callback
    pub callback_param: String,
    /// Query parameter carrying the incoming cursor
    pub cursor_param: String,
    /// Payload key holding the outgoing cursor
    pub cursor_key: String,
    pub pretty: bool,
    pub indent: usize,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            callback_param: "callback".to_string(),
            cursor_param: "start_key".to_string(),
            cursor_key: "last_key".to_string(),
            pretty: false,
            indent: 3,
        }
    }
}

impl EnvelopeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback_param(mut self, name: impl Into<String>) -> Self {
        self.callback_param = name.into();
        self
    }

    pub fn with_cursor_param(mut self, name: impl Into<String>) -> Self {
        self.cursor_param = name.into();
        self
    }

    pub fn with_cursor_key(mut self, key: impl Into<String>) -> Self {
        self.cursor_key = key.into();
        self
    }

    pub fn with_pretty(mut self, indent: usize) -> Self {
        self.pretty = true;
        self.indent = indent;
        self
    }
}

/// Normalized success payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Sequence payload, or `None` for a singleton record
    pub items: Option<Value>,
    pub current_item_count: usize,
    pub self_link: String,
    pub edit_link: Option<String>,
    pub next_link: Option<String>,
    pub start_key: Option<String>,
    pub message: Option<String>,
    /// Remaining payload keys, emitted ahead of the envelope fields
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Ordered JSON object; `items` is always the final key.
    pub fn to_value(&self) -> Value {
        let mut out = self.extra.clone();
        if let Some(message) = &self.message {
            out.insert("message".to_string(), Value::String(message.clone()));
        }
        out.insert("currentItemCount".to_string(), Value::from(self.current_item_count));
        out.insert("selfLink".to_string(), Value::String(self.self_link.clone()));
        if let Some(edit) = &self.edit_link {
            out.insert("editLink".to_string(), Value::String(edit.clone()));
        }
        if let Some(next) = &self.next_link {
            out.insert("nextLink".to_string(), Value::String(next.clone()));
        }
        if let Some(start) = &self.start_key {
            out.insert("startKey".to_string(), Value::String(start.clone()));
        }
        if let Some(items) = &self.items {
            out.insert("items".to_string(), items.clone());
        }
        Value::Object(out)
    }
}

/// Status, content type and serialized body ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeResponse {
    pub status: HttpStatus,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl EnvelopeResponse {
    pub fn into_response(self) -> HttpResponse {
        let mut res = HttpResponse::with_status(self.status).with_body(self.body);
        if !res.body.is_empty() {
            res.set_header("Content-Type", self.content_type);
        }
        res
    }
}

/// A payload counts as empty when it is absent, null or an empty string, list or object.
pub fn is_empty_payload(data: Option<&Value>) -> bool {
    match data {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// Serialize a cursor for a query string: strings stay as-is, anything else is compact JSON.
pub fn encode_cursor(cursor: &Value) -> Result<String, Error> {
    match cursor {
        Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string(other).map_err(|e| Error::Serialization(e.to_string())),
    }
}

/// Build the envelope for a non-empty payload.
pub fn wrap_payload(
    request: &HttpRequest,
    data: Value,
    message: Option<&str>,
    supports_mutation: bool,
    options: &EnvelopeOptions,
) -> Result<Envelope, Error> {
    let payload = match data {
        Value::Object(map) => map,
        Value::Array(list) => {
            let mut map = Map::new();
            map.insert("items".to_string(), Value::Array(list));
            map
        }
        scalar => {
            let mut map = Map::new();
            map.insert("items".to_string(), scalar);
            map
        }
    };

    // Rebuild rather than remove to keep the caller's key order. A cursor
    // only paginates a sequence; on a singleton it stays ordinary data.
    let paginated = payload.contains_key("items");
    let mut extra = Map::new();
    let mut items = None;
    let mut cursor = None;
    for (key, value) in payload {
        if key == "items" {
            items = Some(value);
        } else if paginated && key == options.cursor_key {
            cursor = Some(value);
        } else if key.to_lowercase().ends_with("count") {
            continue;
        } else {
            extra.insert(key, value);
        }
    }

    let current_item_count = match &items {
        Some(Value::Array(list)) => list.len(),
        _ => 1,
    };

    let self_link = request.url_with_query(
        &request
            .query
            .iter()
            .filter(|(k, _)| *k != options.callback_param)
            .cloned()
            .collect::<Vec<_>>(),
    );

    let edit_link = supports_mutation.then(|| request.base_url());

    let (next_link, start_key) = match cursor {
        Some(cursor) if !cursor.is_null() => {
            let encoded = encode_cursor(&cursor)?;
            let mut pairs: Vec<(String, String)> = request
                .query
                .iter()
                .filter(|(k, _)| *k != options.cursor_param && *k != options.callback_param)
                .cloned()
                .collect();
            pairs.push((options.cursor_param.clone(), encoded.clone()));
            (Some(request.url_with_query(&pairs)), Some(encoded))
        }
        _ => (None, None),
    };

    Ok(Envelope {
        items,
        current_item_count,
        self_link,
        edit_link,
        next_link,
        start_key,
        message: message.map(str::to_string),
        extra,
    })
}

fn serialize(value: &Value, options: &EnvelopeOptions) -> Result<Vec<u8>, Error> {
    if !options.pretty {
        return serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()));
    }
    let indent = vec![b' '; options.indent];
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(buf)
}

/// JSONP callback name for the request, if one applies.
pub fn jsonp_callback<'a>(request: &'a HttpRequest, options: &EnvelopeOptions) -> Option<&'a str> {
    if request.method != HttpMethod::Get {
        return None;
    }
    request
        .query
        .iter()
        .find(|(k, _)| *k == options.callback_param)
        .map(|(_, v)| v.as_str())
        .filter(|name| CALLBACK_RE.is_match(name))
}

/// Wrap a success payload into `{"data": envelope}` with its status code.
///
/// Empty payloads yield an empty body. JSONP wrapping applies only to GET
/// requests that name a valid callback.
pub fn build_envelope(
    request: &HttpRequest,
    data: Option<Value>,
    message: Option<&str>,
    supports_mutation: bool,
    options: &EnvelopeOptions,
) -> Result<EnvelopeResponse, Error> {
    let has_data = !is_empty_payload(data.as_ref());
    let status = HttpStatus::for_payload(request.method, has_data);

    let data = match data {
        Some(data) if has_data => data,
        _ => {
            return Ok(EnvelopeResponse {
                status,
                content_type: JSON_CONTENT_TYPE,
                body: Vec::new(),
            });
        }
    };

    let envelope = wrap_payload(request, data, message, supports_mutation, options)?;
    let mut wire = Map::new();
    wire.insert("data".to_string(), envelope.to_value());
    let json = serialize(&Value::Object(wire), options)?;

    match jsonp_callback(request, options) {
        Some(callback) => {
            let mut body = Vec::with_capacity(json.len() + callback.len() + 3);
            body.extend_from_slice(callback.as_bytes());
            body.push(b'(');
            body.extend_from_slice(&json);
            body.extend_from_slice(b");");
            Ok(EnvelopeResponse {
                status,
                content_type: JSONP_CONTENT_TYPE,
                body,
            })
        }
        None => Ok(EnvelopeResponse {
            status,
            content_type: JSON_CONTENT_TYPE,
            body: json,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(method: HttpMethod, url: &str) -> HttpRequest {
        HttpRequest::from_url(method, url).unwrap()
    }

    fn body_of(res: &EnvelopeResponse) -> Value {
        serde_json::from_slice(&res.body).unwrap()
    }

    #[test]
    fn test_paginated_list() {
        let req = request(HttpMethod::Get, "http://api.test/pets?foo=bar&start_key=old");
        let res = build_envelope(
            &req,
            Some(json!({"items": [{"id": 1}, {"id": 2}], "last_key": {"id": 2}})),
            None,
            false,
            &EnvelopeOptions::default(),
        )
        .unwrap();

        assert_eq!(res.status, HttpStatus::Ok);
        assert_eq!(res.content_type, JSON_CONTENT_TYPE);
        let body = body_of(&res);
        let data = body["data"].as_object().unwrap();
        assert_eq!(data["currentItemCount"], json!(2));
        assert_eq!(data["startKey"], json!("{\"id\":2}"));
        assert_eq!(
            data["nextLink"],
            json!("http://api.test/pets?foo=bar&start_key=%7B%22id%22%3A2%7D")
        );
        assert_eq!(data["selfLink"], json!("http://api.test/pets?foo=bar&start_key=old"));
        assert!(!data.contains_key("last_key"));
        assert_eq!(data.keys().last().map(String::as_str), Some("items"));
    }

    #[test]
    fn test_list_payload_wrapped() {
        let req = request(HttpMethod::Get, "http://api.test/pets");
        let res = build_envelope(&req, Some(json!([1, 2, 3])), None, false, &EnvelopeOptions::default())
            .unwrap();
        let body = body_of(&res);
        assert_eq!(body["data"]["items"], json!([1, 2, 3]));
        assert_eq!(body["data"]["currentItemCount"], json!(3));
        assert!(body["data"].get("nextLink").is_none());
    }

    #[test]
    fn test_singleton_payload() {
        let req = request(HttpMethod::Put, "http://api.test/pets/1");
        let res = build_envelope(
            &req,
            Some(json!({"id": 1, "name": "rex", "totalCount": 9})),
            Some("updated"),
            true,
            &EnvelopeOptions::default(),
        )
        .unwrap();
        assert_eq!(res.status, HttpStatus::Ok);
        let body = body_of(&res);
        assert_eq!(
            body,
            json!({"data": {
                "id": 1,
                "name": "rex",
                "message": "updated",
                "currentItemCount": 1,
                "selfLink": "http://api.test/pets/1",
                "editLink": "http://api.test/pets/1"
            }})
        );
    }

    #[test]
    fn test_singleton_cursor_kept_without_next_link() {
        let req = request(HttpMethod::Get, "http://api.test/pets/1?foo=bar");
        let res = build_envelope(
            &req,
            Some(json!({"id": 1, "last_key": {"id": 1}})),
            None,
            false,
            &EnvelopeOptions::default(),
        )
        .unwrap();
        let data = body_of(&res)["data"].clone();
        assert!(data.get("nextLink").is_none());
        assert!(data.get("startKey").is_none());
        assert_eq!(data["last_key"], json!({"id": 1}));
        assert_eq!(data["currentItemCount"], json!(1));
    }

    #[test]
    fn test_count_keys_replaced() {
        let req = request(HttpMethod::Get, "http://api.test/pets");
        let res = build_envelope(
            &req,
            Some(json!({"ItemCount": 40, "count": 3, "items": [1]})),
            None,
            false,
            &EnvelopeOptions::default(),
        )
        .unwrap();
        let data = body_of(&res)["data"].clone();
        assert!(data.get("ItemCount").is_none());
        assert!(data.get("count").is_none());
        assert_eq!(data["currentItemCount"], json!(1));
    }

    #[test]
    fn test_empty_payload_statuses() {
        let options = EnvelopeOptions::default();
        let cases = [
            (HttpMethod::Get, HttpStatus::NotFound),
            (HttpMethod::Post, HttpStatus::Created),
            (HttpMethod::Delete, HttpStatus::NoContent),
        ];
        for (method, expected) in cases {
            let req = request(method, "http://api.test/pets");
            let res = build_envelope(&req, Some(json!({})), None, false, &options).unwrap();
            assert_eq!(res.status, expected);
            assert!(res.body.is_empty());
        }
    }

    #[test]
    fn test_jsonp_get() {
        let req = request(HttpMethod::Get, "http://api.test/pets?callback=cb");
        let res = build_envelope(&req, Some(json!([1])), None, false, &EnvelopeOptions::default())
            .unwrap();
        let text = String::from_utf8(res.body.clone()).unwrap();
        assert_eq!(res.content_type, JSONP_CONTENT_TYPE);
        assert!(text.starts_with("cb({"));
        assert!(text.ends_with("});"));
        assert!(text.contains("\"selfLink\":\"http://api.test/pets\""));
    }

    #[test]
    fn test_jsonp_ignored_for_post_and_bad_names() {
        let options = EnvelopeOptions::default();
        let post = request(HttpMethod::Post, "http://api.test/pets?callback=cb");
        let res = build_envelope(&post, Some(json!({"id": 1})), None, false, &options).unwrap();
        assert_eq!(res.content_type, JSON_CONTENT_TYPE);
        assert_eq!(res.status, HttpStatus::Created);

        let bad = request(HttpMethod::Get, "http://api.test/pets?callback=alert(1)");
        assert_eq!(jsonp_callback(&bad, &options), None);
        let dotted = request(HttpMethod::Get, "http://api.test/pets?callback=app.cb_1");
        assert_eq!(jsonp_callback(&dotted, &options), Some("app.cb_1"));
    }

    #[test]
    fn test_pretty_output() {
        let req = request(HttpMethod::Get, "http://api.test/pets");
        let options = EnvelopeOptions::default().with_pretty(3);
        let res = build_envelope(&req, Some(json!([1])), None, false, &options).unwrap();
        let text = String::from_utf8(res.body).unwrap();
        assert!(text.starts_with("{\n   \"data\""));
    }

    #[test]
    fn test_into_response_headers() {
        let req = request(HttpMethod::Get, "http://api.test/pets");
        let res = build_envelope(&req, None, None, false, &EnvelopeOptions::default())
            .unwrap()
            .into_response();
        assert_eq!(res.status, 404);
        assert_eq!(res.content_type(), None);
    }
}
