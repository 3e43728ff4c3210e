//! Validated user identity used to derive file ownership

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a user identity is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidUserId {
    #[error("user identity is empty")]
    Empty,

    #[error("user identity '{0}' contains a path separator")]
    PathSeparator(String),

    #[error("user identity '{0}' starts with the temp-file marker '~'")]
    TempMarker(String),

    /// `_` separates the owner from the rest of a file name
    #[error("user identity '{0}' contains '_', which separates owner from file name")]
    Underscore(String),
}

/// Login name of the active user
///
/// Files in the shared directory belong to the user whose identity, followed
/// by `_`, prefixes the file name (`alice_inventory.xlsx` belongs to `alice`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidUserId> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(InvalidUserId::Empty);
        }
        if trimmed.contains(['/', '\\']) {
            return Err(InvalidUserId::PathSeparator(trimmed.to_string()));
        }
        if trimmed.starts_with('~') {
            return Err(InvalidUserId::TempMarker(trimmed.to_string()));
        }
        if trimmed.contains('_') {
            return Err(InvalidUserId::Underscore(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Identity of the OS login session, as `USER`, `USERNAME` or `LOGNAME`
    pub fn from_env() -> Option<Self> {
        ["USER", "USERNAME", "LOGNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|name| Self::new(name).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix every file owned by this user starts with
    pub fn file_prefix(&self) -> String {
        format!("{}_", self.0)
    }

    /// Whether the owner field of a bare file name (text before the first
    /// `_`) is this user
    pub fn owns(&self, file_name: &str) -> bool {
        file_name
            .split_once('_')
            .is_some_and(|(owner, _)| owner == self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidUserId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}
