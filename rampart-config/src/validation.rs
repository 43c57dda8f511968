// Configuration validation

use crate::{ConfigError, RampartConfig, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is within range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(value: T, min: T, max: T, field: &str) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}",
                field, min, max
            )));
        }
        Ok(())
    }

    /// Validate that two names differ
    pub fn distinct(a: &str, b: &str, fields: (&str, &str)) -> Result<()> {
        if a == b {
            return Err(ConfigError::ValidationError(format!(
                "{} and {} must differ",
                fields.0, fields.1
            )));
        }
        Ok(())
    }
}

impl Validate for RampartConfig {
    fn validate(&self) -> Result<()> {
        for domain in &self.cookies.trusted_domains {
            ConfigValidator::not_empty(domain.trim_start_matches('.'), "cookies.trusted_domains entry")?;
        }
        ConfigValidator::in_range(self.cookies.max_age, 0, i64::MAX, "cookies.max_age")?;
        ConfigValidator::not_empty(&self.envelope.callback_param, "envelope.callback_param")?;
        ConfigValidator::not_empty(&self.envelope.cursor_param, "envelope.cursor_param")?;
        ConfigValidator::not_empty(&self.envelope.cursor_key, "envelope.cursor_key")?;
        ConfigValidator::distinct(
            &self.envelope.callback_param,
            &self.envelope.cursor_param,
            ("envelope.callback_param", "envelope.cursor_param"),
        )?;
        ConfigValidator::in_range(self.envelope.indent, 0, 16, "envelope.indent")?;
        Ok(())
    }
}
