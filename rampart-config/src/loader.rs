// Configuration file loaders

use crate::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), format = ?self.format, "loaded configuration file");

        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        let value = match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?,
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)
                    .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(toml_value).map_err(|e| {
                    ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e))
                })?
            }
        };

        if !value.is_object() {
            return Err(ConfigError::ParseError(
                "configuration root must be a table".to_string(),
            ));
        }
        Ok(value)
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e)))?;
    let pairs = iter
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::ParseError(format!("dotenv parse error: {}", e)))?;
    tracing::debug!(path = %path.display(), count = pairs.len(), "loaded dotenv file");
    Ok(pairs)
}

/// Parse dotenv content held in memory.
pub fn parse_dotenv(content: &str) -> Result<Vec<(String, String)>> {
    dotenvy::from_read_iter(content.as_bytes())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::ParseError(format!("dotenv parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let result = loader.parse(r#"{"cookies": {"max_age": 60}}"#).unwrap();
        assert_eq!(result["cookies"]["max_age"], 60);
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let toml = r#"
            [envelope]
            callback_param = "jsonp"
            pretty = true
        "#;

        let result = loader.parse(toml).unwrap();
        assert_eq!(result["envelope"]["callback_param"], "jsonp");
        assert_eq!(result["envelope"]["pretty"], true);
    }

    #[test]
    fn test_non_table_root_rejected() {
        let loader = ConfigLoader::new(FileFormat::Json);
        assert!(matches!(loader.parse("[1, 2]"), Err(ConfigError::ParseError(_))));
        assert!(matches!(loader.parse("{"), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_parse_dotenv() {
        let env = "RAMPART_LOG_LEVEL=debug\n# Comment\nRAMPART_COOKIE_DOMAINS=\"api.example.com,example.com\"\n";
        let pairs = parse_dotenv(env).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("RAMPART_LOG_LEVEL".to_string(), "debug".to_string()),
                (
                    "RAMPART_COOKIE_DOMAINS".to_string(),
                    "api.example.com,example.com".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("env"), None);
        assert_eq!(ConfigLoader::auto("rampart.toml").unwrap().format(), FileFormat::Toml);
        assert!(ConfigLoader::auto("rampart").is_err());
    }
}
