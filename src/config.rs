// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for a11y-audit
//!
//! ```yaml
//! rules: [alt-text, form-label]
//! per_rule_timeout_ms: 2000
//! concurrency: true
//! contrast:
//!   luminance: srgb
//! ```

use crate::color::LuminanceModel;
use crate::engine::{AuditOptions, DEFAULT_RULE_TIMEOUT};
use crate::error::{AuditError, Result};
use crate::rules::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule ids to run; all registered rules when absent
    pub rules: Option<Vec<String>>,
    pub per_rule_timeout_ms: u64,
    pub concurrency: bool,
    pub contrast: ContrastConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    pub luminance: LuminanceModel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules: None,
            per_rule_timeout_ms: DEFAULT_RULE_TIMEOUT.as_millis() as u64,
            concurrency: true,
            contrast: ContrastConfig::default(),
        }
    }
}

impl Config {
    /// Engine options described by this configuration
    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            rules: self.rules.clone(),
            per_rule_timeout: Duration::from_millis(self.per_rule_timeout_ms),
            concurrency: self.concurrency,
            ..AuditOptions::default()
        }
    }

    /// Built-in rules configured for this run
    pub fn registry(&self) -> RuleRegistry {
        RuleRegistry::with_luminance(self.contrast.luminance)
    }
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. `.toml` files are read as TOML, anything else as YAML.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str(&content).map_err(|e| AuditError::Config(format!("TOML parse error: {}", e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AuditError::Config(format!("YAML parse error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/a11y-audit.yml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.per_rule_timeout_ms, 5000);
        assert_eq!(config.contrast.luminance, LuminanceModel::Linear);
    }

    #[test]
    fn test_yaml_config() {
        let file = write_temp(
            ".yml",
            "rules: [alt-text, heading-structure]\nper_rule_timeout_ms: 250\ncontrast:\n  luminance: srgb\n",
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.rules.as_deref(),
            Some(&["alt-text".to_string(), "heading-structure".to_string()][..])
        );
        assert_eq!(config.per_rule_timeout_ms, 250);
        assert!(config.concurrency);
        assert_eq!(config.contrast.luminance, LuminanceModel::Srgb);
    }

    #[test]
    fn test_toml_config() {
        let file = write_temp(".toml", "concurrency = false\n\n[contrast]\nluminance = \"linear\"\n");
        let config = load_config(file.path()).unwrap();
        assert!(!config.concurrency);
        assert!(config.rules.is_none());
        assert!(!config.audit_options().concurrency);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let file = write_temp(".toml", "per_rule_timeout_ms = \"soon\"\n");
        assert!(matches!(load_config(file.path()), Err(AuditError::Config(_))));
        let file = write_temp(".yaml", "contrast:\n  luminance: cubic\n");
        assert!(matches!(load_config(file.path()), Err(AuditError::Config(_))));
    }

    #[test]
    fn test_audit_options_mapping() {
        let config = Config {
            rules: Some(vec!["alt-text".to_string()]),
            per_rule_timeout_ms: 100,
            ..Config::default()
        };
        let options = config.audit_options();
        assert_eq!(options.per_rule_timeout, Duration::from_millis(100));
        assert_eq!(options.rules, Some(vec!["alt-text".to_string()]));
        assert!(options.timestamp.is_none());
        assert_eq!(config.registry().len(), 7);
    }
}
