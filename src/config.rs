use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::entity_catalog::JdbcType;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// What to do when a to-many joint prefetch meets limit/offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefetchLimitPolicy {
    /// Translate anyway and report a warning.
    #[default]
    Warn,
    /// Fail the translation.
    Reject,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown prefetch limit policy `{0}`, expected `warn` or `reject`")]
pub struct UnknownPolicy(String);

impl FromStr for PrefetchLimitPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(PrefetchLimitPolicy::Warn),
            "reject" => Ok(PrefetchLimitPolicy::Reject),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Translator configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Handling of to-many joint prefetches combined with limit/offset
    pub prefetch_limit_policy: PrefetchLimitPolicy,

    /// Column types that can't take part in SELECT DISTINCT
    pub distinct_unsupported_types: Vec<JdbcType>,

    /// Function wrapped around case-insensitive ordering expressions
    #[validate(length(min = 1, message = "Case-insensitive function cannot be empty"))]
    pub case_insensitive_function: String,

    /// Prefix of generated result column names (`__c0`, `__c1`, ...)
    #[validate(length(min = 1, message = "Generated column prefix cannot be empty"))]
    pub generated_column_prefix: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            prefetch_limit_policy: PrefetchLimitPolicy::Warn,
            distinct_unsupported_types: vec![
                JdbcType::Blob,
                JdbcType::Clob,
                JdbcType::NClob,
                JdbcType::Binary,
                JdbcType::VarBinary,
                JdbcType::LongVarBinary,
                JdbcType::LongVarChar,
                JdbcType::LongNVarChar,
            ],
            case_insensitive_function: "UPPER".to_string(),
            generated_column_prefix: "__c".to_string(),
        }
    }
}

impl TranslatorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            prefetch_limit_policy: parse_env_var("SELECTGRAPH_PREFETCH_LIMIT_POLICY", "warn")?,
            distinct_unsupported_types: defaults.distinct_unsupported_types,
            case_insensitive_function: env::var("SELECTGRAPH_CASE_INSENSITIVE_FUNCTION")
                .unwrap_or(defaults.case_insensitive_function),
            generated_column_prefix: env::var("SELECTGRAPH_GENERATED_COLUMN_PREFIX")
                .unwrap_or(defaults.generated_column_prefix),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: yaml.to_string(),
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn is_distinct_unsupported(&self, jdbc_type: JdbcType) -> bool {
        self.distinct_unsupported_types.contains(&jdbc_type)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
