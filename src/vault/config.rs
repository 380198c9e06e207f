// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Configuration types for the prompt vault

use serde::{Deserialize, Serialize};

use super::error::{Result, VaultError};
use super::registry::SUFFIX_LEN_RANGE;

/// Categories a finding can be tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretLabel {
    Ip,
    Email,
    ApiKey,
    AwsKey,
    Custom,
    Secret,
}

impl SecretLabel {
    /// Tag embedded in aliases minted for this label
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretLabel::Ip => "IP",
            SecretLabel::Email => "EMAIL",
            SecretLabel::ApiKey => "API_KEY",
            SecretLabel::AwsKey => "AWS_KEY",
            SecretLabel::Custom => "CUSTOM",
            SecretLabel::Secret => "SECRET",
        }
    }

    /// Pattern-layer labels are more specific than the generic semantic tag
    pub fn is_generic(&self) -> bool {
        matches!(self, SecretLabel::Secret)
    }
}

/// User-supplied detection rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    pub pattern: String,
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Settings for the model-driven detection layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub enabled: bool,
    /// Model name passed to the local service
    pub model: String,
    pub temperature: f32,
    /// Shortest string accepted from the service
    pub min_length: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "mistral".to_string(),
            temperature: 0.0,
            min_length: 3,
        }
    }
}

/// Configuration for a vault session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    // Detection flags
    pub detect_ip_address: bool,
    pub detect_email: bool,
    pub detect_api_keys: bool,
    pub detect_aws_keys: bool,

    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,

    // False-positive control
    pub extra_denylist: Vec<String>,
    /// Regexes; a candidate matching any of them is never masked
    pub allowlist_patterns: Vec<String>,
    pub min_pattern_length: usize,

    // Alias shape
    pub alias_suffix_len: usize,

    pub semantic: SemanticConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            detect_ip_address: true,
            detect_email: true,
            detect_api_keys: true,
            detect_aws_keys: true,

            custom_patterns: Vec::new(),

            extra_denylist: Vec::new(),
            allowlist_patterns: Vec::new(),
            min_pattern_length: 2,

            alias_suffix_len: 8,

            semantic: SemanticConfig::default(),
        }
    }
}

impl VaultConfig {
    /// Parse a JSON document; missing keys fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !SUFFIX_LEN_RANGE.contains(&self.alias_suffix_len) {
            return Err(VaultError::Config {
                reason: format!(
                    "alias_suffix_len must be between {} and {}, got {}",
                    SUFFIX_LEN_RANGE.start(),
                    SUFFIX_LEN_RANGE.end(),
                    self.alias_suffix_len
                ),
            });
        }
        if self.min_pattern_length == 0 {
            return Err(VaultError::Config {
                reason: "min_pattern_length must be at least 1".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.semantic.temperature) {
            return Err(VaultError::Config {
                reason: format!(
                    "semantic.temperature out of range: {}",
                    self.semantic.temperature
                ),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "python")]
mod py {
    use pyo3::prelude::*;
    use pyo3::types::PyDict;

    use super::{CustomPattern, VaultConfig};

    impl VaultConfig {
        /// Extract configuration from Python dict
        pub fn from_py_dict(dict: &Bound<'_, PyDict>) -> PyResult<Self> {
            let mut config = Self::default();

            macro_rules! extract_field {
                ($field:ident) => {
                    if let Some(value) = dict.get_item(stringify!($field))? {
                        config.$field = value.extract()?;
                    }
                };
            }

            extract_field!(detect_ip_address);
            extract_field!(detect_email);
            extract_field!(detect_api_keys);
            extract_field!(detect_aws_keys);
            extract_field!(extra_denylist);
            extract_field!(allowlist_patterns);
            extract_field!(min_pattern_length);
            extract_field!(alias_suffix_len);

            if let Some(value) = dict.get_item("semantic_enabled")? {
                config.semantic.enabled = value.extract()?;
            }
            if let Some(value) = dict.get_item("semantic_model")? {
                config.semantic.model = value.extract()?;
            }

            if let Some(value) = dict.get_item("custom_patterns")? {
                if let Ok(py_list) = value.downcast::<pyo3::types::PyList>() {
                    for item in py_list.iter() {
                        let Ok(py_dict) = item.downcast::<PyDict>() else {
                            continue;
                        };
                        let pattern: String = py_dict
                            .get_item("pattern")?
                            .ok_or_else(|| {
                                pyo3::exceptions::PyValueError::new_err("Missing 'pattern' field")
                            })?
                            .extract()?;
                        let description: String = match py_dict.get_item("description")? {
                            Some(val) => val.extract()?,
                            None => String::new(),
                        };
                        let enabled: bool = match py_dict.get_item("enabled")? {
                            Some(val) => val.extract()?,
                            None => true,
                        };
                        config.custom_patterns.push(CustomPattern {
                            pattern,
                            description,
                            enabled,
                        });
                    }
                }
            }

            config
                .validate()
                .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_as_str() {
        assert_eq!(SecretLabel::Ip.as_str(), "IP");
        assert_eq!(SecretLabel::ApiKey.as_str(), "API_KEY");
        assert_eq!(SecretLabel::Secret.as_str(), "SECRET");
    }

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert!(config.detect_ip_address);
        assert!(config.semantic.enabled);
        assert_eq!(config.semantic.temperature, 0.0);
        assert_eq!(config.alias_suffix_len, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            VaultConfig::from_json_str(r#"{"detect_email": false, "semantic": {"model": "llama3"}}"#)
                .unwrap();
        assert!(!config.detect_email);
        assert!(config.detect_ip_address);
        assert_eq!(config.semantic.model, "llama3");
        assert_eq!(config.semantic.min_length, 3);
    }

    #[test]
    fn test_rejects_tiny_suffix() {
        let err = VaultConfig::from_json_str(r#"{"alias_suffix_len": 2}"#).unwrap_err();
        assert!(matches!(err, VaultError::Config { .. }));
    }
}
