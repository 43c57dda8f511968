// Errors raised while rendering documentation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenApiError {
    #[error("Failed to serialize spec: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, OpenApiError>;
