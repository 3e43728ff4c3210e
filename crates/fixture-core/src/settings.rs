//! Shared settings file resolution and loading
//!
//! Settings (fixture types, models, WIP locations) live next to the
//! inventory as `{user}_settings.json`. Unlike the inventory, any user's
//! settings file may be read: the newest one wins and is never copied.

use crate::io::discovery::{discover_candidates, select_newest};
use crate::io::layout::DirLayout;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const SETTINGS_EXTENSION: &str = "json";
const LARGE_SETTINGS_BYTES: u64 = 5_000_000;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File stayed locked for every attempt
    #[error("Settings file {path} still locked after {attempts} attempts")]
    Locked { path: PathBuf, attempts: u32 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Well-formed JSON whose values do not fit the settings fields
    #[error("Settings file {path} has unexpected content: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Contents of a settings JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub models: Vec<String>,

    /// Fixture type to compatible model names
    #[serde(default)]
    pub type_to_models: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub type_descriptions: HashMap<String, String>,

    #[serde(default)]
    pub type_qty_needed: HashMap<String, serde_json::Value>,

    #[serde(default = "default_wip_locations")]
    pub wip_locations: Vec<String>,

    /// Base64 images keyed by fixture type
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub type_images: HashMap<String, String>,

    /// Unknown fields for forward compatibility
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            models: Vec::new(),
            type_to_models: HashMap::new(),
            type_descriptions: HashMap::new(),
            type_qty_needed: HashMap::new(),
            wip_locations: default_wip_locations(),
            type_images: HashMap::new(),
            unknown_fields: HashMap::new(),
        }
    }
}

fn default_wip_locations() -> Vec<String> {
    ["Bonepile", "Debug", "Operations", "Eng Lab"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Retry policy for reading a settings file held by another process
#[derive(Debug, Clone, Copy)]
pub struct LoadPolicy {
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// How a settings load concluded
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Parsed from disk
    Loaded(Settings),
    /// File was missing; defaults were written to it when it is ours
    Created(Settings),
    /// File was not valid JSON and defaults are used; an owned file is
    /// copied to `backup` and overwritten, another user's is left alone
    Recovered {
        settings: Settings,
        backup: Option<PathBuf>,
    },
}

impl LoadOutcome {
    pub fn settings(&self) -> &Settings {
        match self {
            LoadOutcome::Loaded(s) | LoadOutcome::Created(s) => s,
            LoadOutcome::Recovered { settings, .. } => settings,
        }
    }

    pub fn into_settings(self) -> Settings {
        match self {
            LoadOutcome::Loaded(s) | LoadOutcome::Created(s) => s,
            LoadOutcome::Recovered { settings, .. } => settings,
        }
    }
}

/// Newest accessible settings file of any owner, else this user's own path
pub fn resolve_settings_path(layout: &DirLayout) -> PathBuf {
    let own = layout.settings_file();
    match discover_candidates(layout.dir(), SETTINGS_EXTENSION) {
        Ok(candidates) => match select_newest(&candidates) {
            Some(newest) => {
                info!("Most recent settings file: {}", newest.file_name());
                newest.path.clone()
            }
            None => {
                info!("No accessible settings files found, will create new one");
                own
            }
        },
        Err(e) => {
            info!("No settings files found ({e}), will create new one");
            own
        }
    }
}

/// Load settings, retrying while the file is locked
///
/// Only files `layout` names for the active user are ever written. A
/// missing own file is created with defaults. A file that is not valid JSON
/// yields defaults; when it is ours it is first preserved as
/// `<name>.backup` and then overwritten.
///
/// # Errors
///
/// Returns `SettingsError::Locked` when every attempt hits a permission
/// error, `SettingsError::Io` for other read failures after all attempts,
/// or `SettingsError::Invalid` for valid JSON with mismatched values.
pub fn load_settings(
    layout: &DirLayout,
    path: &Path,
    policy: LoadPolicy,
) -> Result<LoadOutcome, SettingsError> {
    let owned = layout.is_owned(path);
    if !path.exists() {
        let settings = Settings::default();
        if owned {
            write_defaults(path, &settings);
        }
        return Ok(LoadOutcome::Created(settings));
    }

    let attempts = policy.attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        match std::fs::read(path) {
            Ok(bytes) => {
                if bytes.len() as u64 > LARGE_SETTINGS_BYTES {
                    warn!(
                        "Settings file is very large ({:.1} MB); it may contain uncompressed images",
                        bytes.len() as f64 / 1024.0 / 1024.0
                    );
                }
                return parse_or_recover(path, &bytes, owned);
            }
            Err(e) => {
                if attempt < attempts {
                    warn!(
                        "Settings file unreadable, retrying... (attempt {attempt}/{attempts}): {e}"
                    );
                    std::thread::sleep(policy.retry_delay);
                }
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(SettingsError::Locked {
            path: path.to_path_buf(),
            attempts,
        }),
        Some(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => Err(SettingsError::Locked {
            path: path.to_path_buf(),
            attempts,
        }),
    }
}

fn parse_or_recover(path: &Path, bytes: &[u8], owned: bool) -> Result<LoadOutcome, SettingsError> {
    let e = match serde_json::from_slice::<Settings>(bytes) {
        Ok(settings) => {
            if !settings.type_images.is_empty() {
                let total: usize = settings.type_images.values().map(String::len).sum();
                info!(
                    "Loaded {} image(s) ({} KB total)",
                    settings.type_images.len(),
                    total / 1024
                );
            }
            return Ok(LoadOutcome::Loaded(settings));
        }
        Err(e) => e,
    };

    if !matches!(e.classify(), Category::Syntax | Category::Eof) {
        return Err(SettingsError::Invalid {
            path: path.to_path_buf(),
            source: e,
        });
    }

    warn!("Settings file {} corrupted: {e}", path.display());
    let settings = Settings::default();
    if !owned {
        warn!("Not overwriting {}: owned by another user", path.display());
        return Ok(LoadOutcome::Recovered {
            settings,
            backup: None,
        });
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    let backup = PathBuf::from(backup);
    if let Err(e) = std::fs::copy(path, &backup) {
        warn!("Could not back up corrupt settings: {e}");
    }
    write_defaults(path, &settings);
    Ok(LoadOutcome::Recovered {
        settings,
        backup: Some(backup),
    })
}

fn write_defaults(path: &Path, settings: &Settings) {
    let result = serde_json::to_vec_pretty(settings)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(path, json));
    if let Err(e) = result {
        warn!("Could not write default settings to {}: {e}", path.display());
    }
}
