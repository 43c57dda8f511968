//! Configuration for rampart
//!
//! [`RampartConfig`] gathers the cookie, envelope and logging settings. Sources
//! are layered from lowest to highest precedence: built-in defaults, a TOML or
//! JSON file, a dotenv file, then `RAMPART_*` variables.
//!
//! ```
//! use rampart_config::RampartConfig;
//!
//! let config = RampartConfig::builder()
//!     .vars([("RAMPART_COOKIE_DOMAINS", "api.example.com,example.com")])
//!     .build()
//!     .unwrap();
//!
//! let policy = config.cookie_policy().unwrap();
//! assert_eq!(policy.trusted_domains, vec!["api.example.com", "example.com"]);
//! assert_eq!(config.envelope_options().callback_param, "callback");
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat, load_dotenv, parse_dotenv};
pub use settings::{CookieSettings, LoggingSettings, RampartConfig};
pub use validation::{ConfigValidator, Validate};

use rampart_core::{CookiePolicy, EnvelopeOptions, LogConfig};
use serde_json::Value;
use std::path::PathBuf;

impl RampartConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Deserialize from an already parsed document; missing keys take defaults.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Parse a document held in memory.
    pub fn parse(content: &str, format: FileFormat) -> Result<Self> {
        Self::from_value(ConfigLoader::new(format).parse(content)?)
    }

    pub fn envelope_options(&self) -> EnvelopeOptions {
        self.envelope.clone()
    }

    /// Cookie policy for the configured domains. Fails when none are set.
    pub fn cookie_policy(&self) -> Result<CookiePolicy> {
        let policy = CookiePolicy::new(self.cookies.trusted_domains.iter().cloned())?
            .with_http_only(self.cookies.http_only)
            .with_same_site_preferred(self.cookies.same_site)
            .with_path(self.cookies.path.clone())
            .with_max_age(self.cookies.max_age);
        Ok(policy)
    }

    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::new()
            .level(self.logging.level)
            .format(self.logging.format);
        match &self.logging.filter {
            Some(filter) => config.with_env_filter(filter.clone()),
            None => config,
        }
    }
}

/// Layered configuration loader
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    file: Option<PathBuf>,
    dotenv: Option<PathBuf>,
    vars: Vec<(String, String)>,
    process_env: bool,
    env: EnvLoader,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            file: None,
            dotenv: None,
            vars: Vec::new(),
            process_env: false,
            env: EnvLoader::default(),
        }
    }

    /// TOML or JSON file, format chosen by extension
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(path.into());
        self
    }

    /// Explicit variables, applied after the dotenv file
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Also read the variables of the current process, after explicit ones
    pub fn process_env(mut self) -> Self {
        self.process_env = true;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env = EnvLoader::new(prefix);
        self
    }

    /// Load every source, then validate the result.
    pub fn build(self) -> Result<RampartConfig> {
        let mut config = match &self.file {
            Some(path) => RampartConfig::from_value(ConfigLoader::auto(path)?.load_file(path)?)?,
            None => RampartConfig::default(),
        };

        if let Some(path) = &self.dotenv {
            self.env.apply(&mut config, load_dotenv(path)?)?;
        }
        self.env.apply(&mut config, self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        if self.process_env {
            self.env.apply(&mut config, std::env::vars())?;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e);
        }
        tracing::info!(
            domains = config.cookies.trusted_domains.len(),
            level = config.logging.level.as_str(),
            "configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{LogFormat, LogLevel};

    #[test]
    fn test_defaults() {
        let config = RampartConfig::builder().build().unwrap();
        assert_eq!(config, RampartConfig::default());
        assert_eq!(config.cookies.max_age, 3600);
        assert_eq!(config.envelope_options(), EnvelopeOptions::default());
        assert!(config.cookie_policy().is_err());
    }

    #[test]
    fn test_partial_document() {
        let config = RampartConfig::parse(
            r#"
            [cookies]
            trusted_domains = ["example.com"]

            [logging]
            level = "debug"
            "#,
            FileFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.cookies.trusted_domains, vec!["example.com"]);
        assert!(config.cookies.http_only);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_vars_override_later_wins() {
        let config = RampartConfig::builder()
            .vars([("RAMPART_CURSOR_KEY", "first")])
            .vars([("RAMPART_CURSOR_KEY", "second")])
            .build()
            .unwrap();
        assert_eq!(config.envelope.cursor_key, "second");
    }

    #[test]
    fn test_invalid_values_fail_build() {
        let result = RampartConfig::builder()
            .vars([("RAMPART_CALLBACK_PARAM", "start_key")])
            .build();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_converters() {
        let mut config = RampartConfig::default();
        config.cookies.trusted_domains = vec![".example.com".to_string()];
        config.cookies.same_site = false;
        config.cookies.max_age = 120;
        config.logging.level = LogLevel::Warn;
        config.logging.filter = Some("rampart_validation=debug".to_string());

        let policy = config.cookie_policy().unwrap();
        assert_eq!(policy.trusted_domains, vec!["example.com"]);
        assert!(!policy.same_site_preferred);
        assert_eq!(policy.max_age, 120);

        let log = config.log_config();
        assert_eq!(log.level, LogLevel::Warn);
        assert_eq!(log.env_filter.as_deref(), Some("rampart_validation=debug"));
    }
}
