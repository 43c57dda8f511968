// HTTP status codes emitted by rampart

use crate::HttpMethod;

/// Status codes produced by the envelope builder and the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    // 2xx Success
    Ok = 200,
    Created = 201,
    NoContent = 204,

    // 4xx Client Errors
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    Conflict = 409,
    UnprocessableEntity = 422,

    // 5xx Server Errors
    InternalServerError = 500,
}

impl HttpStatus {
    /// Get the numeric status code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for the status code
    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::Created => "Created",
            HttpStatus::NoContent => "No Content",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::Unauthorized => "Unauthorized",
            HttpStatus::Forbidden => "Forbidden",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::MethodNotAllowed => "Method Not Allowed",
            HttpStatus::Conflict => "Conflict",
            HttpStatus::UnprocessableEntity => "Unprocessable Entity",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }

    /// Status for a success payload.
    ///
    /// | payload   | POST | GET | other |
    /// |-----------|------|-----|-------|
    /// | empty     | 201  | 404 | 204   |
    /// | non-empty | 201  | 200 | 200   |
    pub fn for_payload(method: HttpMethod, has_data: bool) -> Self {
        match (has_data, method) {
            (_, HttpMethod::Post) => HttpStatus::Created,
            (true, _) => HttpStatus::Ok,
            (false, HttpMethod::Get) => HttpStatus::NotFound,
            (false, _) => HttpStatus::NoContent,
        }
    }

    /// Check if status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code())
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code())
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code())
    }

    /// Create status from u16 code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(HttpStatus::Ok),
            201 => Some(HttpStatus::Created),
            204 => Some(HttpStatus::NoContent),
            400 => Some(HttpStatus::BadRequest),
            401 => Some(HttpStatus::Unauthorized),
            403 => Some(HttpStatus::Forbidden),
            404 => Some(HttpStatus::NotFound),
            405 => Some(HttpStatus::MethodNotAllowed),
            409 => Some(HttpStatus::Conflict),
            422 => Some(HttpStatus::UnprocessableEntity),
            500 => Some(HttpStatus::InternalServerError),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_status_matrix() {
        assert_eq!(HttpStatus::for_payload(HttpMethod::Get, false), HttpStatus::NotFound);
        assert_eq!(HttpStatus::for_payload(HttpMethod::Post, false), HttpStatus::Created);
        assert_eq!(HttpStatus::for_payload(HttpMethod::Delete, false), HttpStatus::NoContent);
        assert_eq!(HttpStatus::for_payload(HttpMethod::Put, false), HttpStatus::NoContent);
        assert_eq!(HttpStatus::for_payload(HttpMethod::Post, true), HttpStatus::Created);
        assert_eq!(HttpStatus::for_payload(HttpMethod::Get, true), HttpStatus::Ok);
        assert_eq!(HttpStatus::for_payload(HttpMethod::Patch, true), HttpStatus::Ok);
    }

    #[test]
    fn test_status_categories() {
        assert!(HttpStatus::Created.is_success());
        assert!(HttpStatus::BadRequest.is_client_error());
        assert!(HttpStatus::InternalServerError.is_server_error());
        assert!(!HttpStatus::NoContent.is_client_error());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(HttpStatus::from_code(204), Some(HttpStatus::NoContent));
        assert_eq!(HttpStatus::from_code(405), Some(HttpStatus::MethodNotAllowed));
        assert_eq!(HttpStatus::from_code(999), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(HttpStatus::Created.to_string(), "201 Created");
        assert_eq!(HttpStatus::NotFound.to_string(), "404 Not Found");
    }
}
