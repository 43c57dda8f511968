// Configuration sections

use rampart_core::{EnvelopeOptions, LogFormat, LogLevel};
use serde::{Deserialize, Serialize};

/// Cookie issuing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    /// Trusted domains, most specific first
    pub trusted_domains: Vec<String>,
    pub http_only: bool,
    /// Request `SameSite=Strict` on secure requests
    pub same_site: bool,
    /// Lifetime in seconds for cookies issued without an explicit one
    pub max_age: i64,
    pub path: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            trusted_domains: Vec::new(),
            http_only: true,
            same_site: true,
            max_age: 3600,
            path: "/".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Optional `EnvFilter` directive, e.g. `rampart_validation=debug`
    pub filter: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            filter: None,
        }
    }
}

/// Complete rampart configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampartConfig {
    pub cookies: CookieSettings,
    pub envelope: EnvelopeOptions,
    pub logging: LoggingSettings,
}
