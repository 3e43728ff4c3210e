//! Text formatting helpers

use chrono::{DateTime, Local};
use std::path::Path;
use std::time::SystemTime;

/// Local `YYYY-MM-DD HH:MM:SS`, or `-` when unknown
pub fn format_mtime(modified: Option<SystemTime>) -> String {
    match modified {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

/// File name for display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
