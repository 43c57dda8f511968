// Request-scoped validation state

use rampart_core::{Error, HttpRequest, Location, RequestData};
use serde_json::Value;
use std::collections::HashMap;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State owned by one request while it moves through validation.
///
/// Raw extraction results are memoized per location and list expectation,
/// so a location read twice is parsed once. Nothing here outlives the request.
pub struct RequestContext<'a> {
    request: &'a HttpRequest,
    request_id: String,
    raw: HashMap<(Location, bool), Value>,
}

impl<'a> RequestContext<'a> {
    pub fn new(request: &'a HttpRequest) -> Self {
        let request_id = request
            .header(REQUEST_ID_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            request,
            request_id,
            raw: HashMap::new(),
        }
    }

    pub fn request(&self) -> &'a HttpRequest {
        self.request
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Raw data for `location`, extracted on first use.
    pub fn raw(&mut self, location: Location, expect_list: bool) -> Result<&Value, Error> {
        let key = (location, expect_list);
        if !self.raw.contains_key(&key) {
            let value = self.request.extract(location, expect_list)?;
            tracing::debug!(
                location = %location,
                request_id = %self.request_id,
                "extracted raw request data"
            );
            self.raw.insert(key, value);
        }
        self.raw
            .get(&key)
            .ok_or_else(|| Error::InvalidRequest(format!("no raw data for {}", location)))
    }
}
