//! Configuration discovery and resolution

use super::types::{Config, OutputFormat};
use crate::schema::{InvalidUserId, UserId};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Identity is set but unusable as a file prefix
    #[error("Invalid identity: {0}")]
    InvalidIdentity(#[from] InvalidUserId),

    /// No identity configured and none found in the environment
    #[error("No user identity: set --user, FIXTURE_USER or core.identity")]
    NoIdentity,
}

/// Command-line overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Override shared directory
    pub shared_dir: Option<PathBuf>,
    /// Override identity
    pub identity: Option<String>,
    /// Override output format
    pub format: Option<OutputFormat>,
    /// Path to config file override
    pub config_path: Option<PathBuf>,
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Command-line overrides
/// 2. Environment variables (`FIXTURE_DIR`, `FIXTURE_USER`)
/// 3. Explicit `--config` file, else repo-local `.fixture.toml`
/// 4. Global config (~/.config/fixture-control/config.toml)
/// 5. Defaults
pub fn resolve_config(
    overrides: &ConfigOverrides,
    current_dir: &Path,
    home_dir: &Path,
) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // 4. Try global config
    let global_config_path = home_dir.join(".config/fixture-control/config.toml");
    if global_config_path.exists() {
        if let Ok(file_config) = load_config_file(&global_config_path) {
            merge_config(&mut config, file_config);
        } else {
            warn!("Failed to parse global config at {global_config_path:?}");
        }
    }

    // 3. Explicit config file must parse; repo-local is best effort
    if let Some(ref explicit) = overrides.config_path {
        merge_config(&mut config, load_config_file(explicit)?);
    } else if let Some(repo_config) = find_repo_local_config(current_dir) {
        if let Ok(file_config) = load_config_file(&repo_config) {
            merge_config(&mut config, file_config);
        } else {
            warn!("Failed to parse repo config at {repo_config:?}");
        }
    }

    // 2. Apply environment variables
    apply_env_overrides(&mut config);

    // 1. Apply command-line overrides
    apply_cli_overrides(&mut config, overrides);

    Ok(config)
}

impl Config {
    /// Active user: configured identity, else the OS login name
    pub fn user(&self) -> Result<UserId, ConfigError> {
        match self.core.identity {
            Some(ref identity) => Ok(UserId::new(identity.as_str())?),
            None => UserId::from_env().ok_or(ConfigError::NoIdentity),
        }
    }

    /// Shared directory, defaulting to `current_dir`
    pub fn shared_dir(&self, current_dir: &Path) -> PathBuf {
        match self.core.shared_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => current_dir.join(dir),
            None => current_dir.to_path_buf(),
        }
    }
}

/// Find repo-local config file
///
/// Searches current directory and parent directories up to git root
fn find_repo_local_config(current_dir: &Path) -> Option<PathBuf> {
    let mut dir = current_dir;

    loop {
        let config_path = dir.join(".fixture.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        // Stop at git root
        if dir.join(".git").exists() {
            break;
        }

        dir = dir.parent()?;
    }

    None
}

/// Load config from a TOML file
fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

/// Merge file config into base config
fn merge_config(base: &mut Config, file: Config) {
    if file.core.shared_dir.is_some() {
        base.core.shared_dir = file.core.shared_dir;
    }
    if file.core.identity.is_some() {
        base.core.identity = file.core.identity;
    }
    base.settings = file.settings;
    base.display.format = file.display.format;
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut Config) {
    if let Ok(dir) = std::env::var("FIXTURE_DIR")
        && !dir.trim().is_empty()
    {
        config.core.shared_dir = Some(PathBuf::from(dir.trim()));
    }

    if let Ok(identity) = std::env::var("FIXTURE_USER")
        && !identity.trim().is_empty()
    {
        config.core.identity = Some(identity);
    }
}

/// Apply command-line overrides
fn apply_cli_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(ref dir) = overrides.shared_dir {
        config.core.shared_dir = Some(dir.clone());
    }

    if let Some(ref identity) = overrides.identity {
        config.core.identity = Some(identity.clone());
    }

    if let Some(format) = overrides.format {
        config.display.format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clear_env() {
        unsafe {
            std::env::remove_var("FIXTURE_DIR");
            std::env::remove_var("FIXTURE_USER");
        }
    }

    #[test]
    #[serial]
    fn test_resolve_config_defaults() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config = resolve_config(&ConfigOverrides::default(), temp_dir.path(), temp_dir.path())
            .unwrap();

        assert!(config.core.shared_dir.is_none());
        assert_eq!(config.shared_dir(temp_dir.path()), temp_dir.path());
    }

    #[test]
    #[serial]
    fn test_repo_local_overrides_global() {
        clear_env();
        let home = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".config/fixture-control")).unwrap();
        fs::write(
            home.path().join(".config/fixture-control/config.toml"),
            "[core]\nshared_dir = \"/global/share\"\nidentity = \"dana\"\n",
        )
        .unwrap();
        fs::create_dir(repo.path().join(".git")).unwrap();
        fs::write(
            repo.path().join(".fixture.toml"),
            "[core]\nshared_dir = \"/repo/share\"\n",
        )
        .unwrap();

        let config = resolve_config(&ConfigOverrides::default(), repo.path(), home.path()).unwrap();

        assert_eq!(config.core.shared_dir, Some(PathBuf::from("/repo/share")));
        assert_eq!(config.core.identity.as_deref(), Some("dana"));
    }

    #[test]
    #[serial]
    fn test_env_and_cli_priority() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        unsafe {
            std::env::set_var("FIXTURE_DIR", "/env/share");
            std::env::set_var("FIXTURE_USER", "erin");
        }

        let config = resolve_config(&ConfigOverrides::default(), temp_dir.path(), temp_dir.path())
            .unwrap();
        assert_eq!(config.core.shared_dir, Some(PathBuf::from("/env/share")));
        assert_eq!(config.user().unwrap().as_str(), "erin");

        let overrides = ConfigOverrides {
            identity: Some("frank".to_string()),
            format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let config = resolve_config(&overrides, temp_dir.path(), temp_dir.path()).unwrap();
        assert_eq!(config.user().unwrap().as_str(), "frank");
        assert_eq!(config.display.format, OutputFormat::Json);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_config_must_parse() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let bad = temp_dir.path().join("bad.toml");
        fs::write(&bad, "[core\n").unwrap();

        let overrides = ConfigOverrides {
            config_path: Some(bad),
            ..Default::default()
        };
        let result = resolve_config(&overrides, temp_dir.path(), temp_dir.path());
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_invalid_identity_rejected() {
        let mut config = Config::default();
        config.core.identity = Some("../etc".to_string());
        assert!(matches!(config.user(), Err(ConfigError::InvalidIdentity(_))));
    }

    #[test]
    fn test_relative_shared_dir_joins_current() {
        let mut config = Config::default();
        config.core.shared_dir = Some(PathBuf::from("share"));
        assert_eq!(
            config.shared_dir(Path::new("/work")),
            PathBuf::from("/work/share")
        );
    }
}
