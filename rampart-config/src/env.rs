// Environment variable loading

use crate::{ConfigError, RampartConfig, Result};
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

pub const DEFAULT_PREFIX: &str = "RAMPART";

/// Environment variable loader
///
/// Keys are matched by prefix, stripped of it and lower-cased, so
/// `RAMPART_COOKIE_DOMAINS` becomes `cookie_domains`.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Collect the prefixed variables from a list of pairs
    pub fn collect<I, K, V>(&self, vars: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let head = format!("{}_", self.prefix);
        vars.into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(&head)
                    .map(|rest| (rest.to_lowercase(), value.into()))
            })
            .collect()
    }

    /// Collect the prefixed variables of the current process
    pub fn load(&self) -> BTreeMap<String, String> {
        self.collect(env::vars())
    }

    /// Overlay variables onto a configuration. Unknown keys are ignored.
    pub fn apply<I, K, V>(&self, config: &mut RampartConfig, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in self.collect(vars) {
            let var = format!("{}_{}", self.prefix, key.to_uppercase());
            match key.as_str() {
                "cookie_domains" => {
                    config.cookies.trusted_domains =
                        value.split(',').map(|d| d.trim().to_string()).collect();
                }
                "cookie_http_only" => config.cookies.http_only = parse_bool(&var, &value)?,
                "cookie_same_site" => config.cookies.same_site = parse_bool(&var, &value)?,
                "cookie_max_age" => config.cookies.max_age = parse(&var, &value)?,
                "cookie_path" => config.cookies.path = value,
                "callback_param" => config.envelope.callback_param = value,
                "cursor_param" => config.envelope.cursor_param = value,
                "cursor_key" => config.envelope.cursor_key = value,
                "pretty" => config.envelope.pretty = parse_bool(&var, &value)?,
                "indent" => config.envelope.indent = parse(&var, &value)?,
                "log_level" => config.logging.level = parse(&var, &value)?,
                "log_format" => config.logging.format = parse(&var, &value)?,
                "log_filter" => config.logging.filter = Some(value),
                _ => {
                    tracing::debug!(var = %var, "ignoring unknown configuration variable");
                    continue;
                }
            }
            tracing::debug!(var = %var, "applied configuration variable");
        }
        Ok(())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

fn parse<T>(var: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", var, e)))
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError(format!(
            "{}: expected a boolean, got {:?}",
            var, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{LogFormat, LogLevel};

    #[test]
    fn test_collect_strips_prefix() {
        let loader = EnvLoader::default();
        let vars = loader.collect([
            ("RAMPART_LOG_LEVEL", "debug"),
            ("PATH", "/usr/bin"),
            ("RAMPARTX_OTHER", "1"),
        ]);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars["log_level"], "debug");
    }

    #[test]
    fn test_apply_sections() {
        let mut config = RampartConfig::default();
        EnvLoader::default()
            .apply(
                &mut config,
                [
                    ("RAMPART_COOKIE_DOMAINS", "api.example.com, example.com"),
                    ("RAMPART_COOKIE_HTTP_ONLY", "false"),
                    ("RAMPART_COOKIE_MAX_AGE", "600"),
                    ("RAMPART_CALLBACK_PARAM", "jsonp"),
                    ("RAMPART_PRETTY", "yes"),
                    ("RAMPART_INDENT", "2"),
                    ("RAMPART_LOG_LEVEL", "warn"),
                    ("RAMPART_LOG_FORMAT", "pretty"),
                    ("RAMPART_UNKNOWN", "ignored"),
                ],
            )
            .unwrap();

        assert_eq!(config.cookies.trusted_domains, vec!["api.example.com", "example.com"]);
        assert!(!config.cookies.http_only);
        assert_eq!(config.cookies.max_age, 600);
        assert_eq!(config.envelope.callback_param, "jsonp");
        assert!(config.envelope.pretty);
        assert_eq!(config.envelope.indent, 2);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let loader = EnvLoader::default();
        let mut config = RampartConfig::default();
        assert!(matches!(
            loader.apply(&mut config, [("RAMPART_PRETTY", "maybe")]),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            loader.apply(&mut config, [("RAMPART_INDENT", "-1")]),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            loader.apply(&mut config, [("RAMPART_LOG_LEVEL", "loud")]),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_custom_prefix() {
        let loader = EnvLoader::new("API");
        let mut config = RampartConfig::default();
        loader
            .apply(&mut config, [("API_CURSOR_KEY", "next"), ("RAMPART_CURSOR_KEY", "no")])
            .unwrap();
        assert_eq!(config.envelope.cursor_key, "next");
    }
}
