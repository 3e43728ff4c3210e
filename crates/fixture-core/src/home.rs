//! Home directory resolution
//!
//! The global config lives under the home directory. `FIXTURE_HOME`
//! overrides the platform default, which keeps integration tests away from
//! the real home directory.
//!
//! # Precedence
//!
//! 1. `FIXTURE_HOME` environment variable (if set and non-empty)
//! 2. `dirs::home_dir()` platform default
//!
//! # Testing
//!
//! ```ignore
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("fixture");
//! cmd.env("FIXTURE_HOME", temp_dir.path());
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the home directory used for config lookup
///
/// # Errors
///
/// Returns an error if `FIXTURE_HOME` is not set and the platform home
/// directory cannot be determined.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("FIXTURE_HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    dirs::home_dir().context("Could not determine home directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_fixture_home_set() {
        let original = env::var("FIXTURE_HOME").ok();
        unsafe { env::set_var("FIXTURE_HOME", "/custom/home") };

        let home = get_home_dir().unwrap();
        assert_eq!(home, PathBuf::from("/custom/home"));

        unsafe {
            match original {
                Some(v) => env::set_var("FIXTURE_HOME", v),
                None => env::remove_var("FIXTURE_HOME"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_fixture_home_blank_uses_platform_default() {
        let original = env::var("FIXTURE_HOME").ok();
        unsafe { env::set_var("FIXTURE_HOME", "   ") };

        let home = get_home_dir().unwrap();
        assert_eq!(home, dirs::home_dir().unwrap());

        unsafe {
            match original {
                Some(v) => env::set_var("FIXTURE_HOME", v),
                None => env::remove_var("FIXTURE_HOME"),
            }
        }
    }
}
