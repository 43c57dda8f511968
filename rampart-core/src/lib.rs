// Core library for rampart
// Request data locations, raw extraction, the client error taxonomy,
// response envelopes and the cookie policy.

pub mod cookie;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod failure;
pub mod http;
pub mod location;
pub mod logging;
pub mod status;

// Re-export commonly used types
pub use cookie::*;
pub use envelope::*;
pub use error::*;
pub use extract::*;
pub use failure::*;
pub use http::*;
pub use location::*;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use status::*;
