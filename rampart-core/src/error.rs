// Error types for rampart

use crate::failure::{codes, reason_map};
use crate::{FailureReason, FieldFailure, HttpResponse, HttpStatus, Location};
use serde_json::{Value, json};
use thiserror::Error;

/// Library errors raised while building requests, responses and cookies.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown location: {0}")]
    UnknownLocation(String),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Client(err) => err.status.code(),
            Error::InvalidRequest(_) => HttpStatus::BadRequest.code(),
            Error::Configuration(_) | Error::Serialization(_) | Error::UnknownLocation(_) => {
                HttpStatus::InternalServerError.code()
            }
        }
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus::from_code(self.status_code()).unwrap_or(HttpStatus::InternalServerError)
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client-visible failure rendered as a structured JSON error body.
///
/// Every location-specific validation error is a `ClientError` whose
/// `location` is set and whose failure records carry the location tag.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error_type}: {message}")]
pub struct ClientError {
    pub status: HttpStatus,
    pub message: String,
    pub error_type: String,
    pub reason: Value,
    pub errors: Vec<FailureReason>,
    pub location: Option<Location>,
}

impl ClientError {
    /// A plain client error with a string reason and no failure records.
    pub fn new(status: HttpStatus, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            reason: Value::String(message.clone()),
            message,
            error_type: error_type.into(),
            errors: Vec::new(),
            location: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(HttpStatus::BadRequest, "ClientError", message)
    }

    pub fn method_not_allowed(method: &str, endpoint: &str) -> Self {
        Self::new(
            HttpStatus::MethodNotAllowed,
            codes::METHOD_NOT_ALLOWED,
            format!("{} is not allowed on {}", method, endpoint),
        )
    }

    /// Validation failure for one location.
    ///
    /// `domain` is the validating endpoint name; it is lower-cased on each record.
    pub fn schema_validation(location: Location, domain: &str, failures: Vec<FieldFailure>) -> Self {
        let reason = reason_map(&failures);
        let errors = failures
            .into_iter()
            .map(|f| f.into_reason(location, domain))
            .collect::<Vec<_>>();

        Self {
            status: HttpStatus::BadRequest,
            message: format!("{} validation failed for {}", location.category(), domain),
            error_type: codes::SCHEMA_FIELDS.to_string(),
            reason,
            errors,
            location: Some(location),
        }
    }

    /// Cross-field failure raised after every location validated.
    pub fn cross_field(domain: &str, failures: Vec<FieldFailure>) -> Self {
        let reason = reason_map(&failures);
        let errors = failures
            .into_iter()
            .map(|f| f.into_reason(Location::Body, domain).with_location_type("schema"))
            .collect();

        Self {
            status: HttpStatus::BadRequest,
            message: format!("Schema validation failed for {}", domain),
            error_type: codes::SCHEMA_FIELDS.to_string(),
            reason,
            errors,
            location: None,
        }
    }

    pub fn with_status(mut self, status: HttpStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// `{"error": {code, message, error_type, reason, errors?}}`
    pub fn to_body(&self) -> Value {
        let mut error = json!({
            "code": self.status.code(),
            "message": self.message,
            "error_type": self.error_type,
            "reason": self.reason,
        });
        if !self.errors.is_empty() {
            error["errors"] = Value::Array(self.errors.iter().map(FailureReason::to_value).collect());
        }
        json!({ "error": error })
    }

    pub fn into_response(self) -> HttpResponse {
        let body = self.to_body().to_string().into_bytes();
        HttpResponse::new(self.status.code())
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }
}
