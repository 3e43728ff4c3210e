//! Configuration types

use crate::settings::LoadPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core configuration
    #[serde(default)]
    pub core: CoreConfig,
    /// Settings-file loading
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Core configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Shared directory holding the inventory workbooks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_dir: Option<PathBuf>,
    /// Identity used as the file-name prefix; defaults to the login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// Settings-file loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Attempts before giving up on a locked settings file
    #[serde(default = "default_load_retries")]
    pub load_retries: u32,
    /// Delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            load_retries: default_load_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl SettingsConfig {
    pub fn load_policy(&self) -> LoadPolicy {
        LoadPolicy {
            attempts: self.load_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

fn default_load_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// Display configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.core.shared_dir.is_none());
        assert!(config.core.identity.is_none());
        assert_eq!(config.settings.load_retries, 5);
        assert_eq!(config.settings.retry_delay_ms, 1000);
        assert_eq!(config.display.format, OutputFormat::Text);
    }

    #[test]
    fn test_config_parse_partial() {
        let toml_str = r#"
[core]
shared_dir = "/mnt/share/fixture_control"

[settings]
retry_delay_ms = 50
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.core.shared_dir,
            Some(PathBuf::from("/mnt/share/fixture_control"))
        );
        assert_eq!(config.settings.load_retries, 5);
        assert_eq!(
            config.settings.load_policy().retry_delay,
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_output_format_parse() {
        let config: Config = toml::from_str("[display]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.display.format, OutputFormat::Json);
    }
}
