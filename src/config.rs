//! Application configuration
//!
//! Settings come from an optional YAML file, then `EREQUEST_*` environment
//! variables, then command-line flags, each layer overriding the one before.
//! The binary loads `.env` into the environment before any of this runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BUNDLE: &str = "EREQUEST_BUNDLE";
pub const ENV_FILLER: &str = "EREQUEST_FILLER";
pub const ENV_DEEP_VALIDATION: &str = "EREQUEST_DEEP_VALIDATION";
pub const ENV_LOG: &str = "EREQUEST_LOG";

pub const DEFAULT_LOG_FILTER: &str = "erequest_validator=info,erequest=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AppConfig {
    /// JSON record bundle backing the in-memory repository
    pub bundle: Option<PathBuf>,
    /// Filler organization id used by fulfillment passes
    pub filler_organization: Option<String>,
    /// Resolve and validate referenced records
    pub deep_validation: bool,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bundle: None,
            filler_organization: None,
            deep_validation: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// File (when given) plus process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `EREQUEST_*` overrides from `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bundle) = lookup(ENV_BUNDLE) {
            self.bundle = Some(PathBuf::from(bundle));
        }
        if let Some(filler) = lookup(ENV_FILLER) {
            self.filler_organization = Some(filler);
        }
        if let Some(deep) = lookup(ENV_DEEP_VALIDATION) {
            self.deep_validation = parse_flag(ENV_DEEP_VALIDATION, &deep)?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        Ok(self)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
bundle: data/records.json
filler_organization: lab
deep_validation: false
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.bundle, Some(PathBuf::from("data/records.json")));
        assert_eq!(config.filler_organization.as_deref(), Some("lab"));
        assert!(!config.deep_validation);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{}}").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { path: ref p, .. } if p == &path));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_FILLER, "other-lab"),
            (ENV_DEEP_VALIDATION, "no"),
            (ENV_LOG, "debug"),
        ]);
        let config = AppConfig::from_yaml("filler_organization: lab\n")
            .unwrap()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.filler_organization.as_deref(), Some("other-lab"));
        assert!(!config.deep_validation);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.bundle, None);
    }

    #[test]
    fn bad_flag_is_rejected() {
        let err = AppConfig::default()
            .with_overrides(|key| (key == ENV_DEEP_VALIDATION).then(|| "maybe".to_string()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value \"maybe\" for EREQUEST_DEEP_VALIDATION"
        );
    }
}
