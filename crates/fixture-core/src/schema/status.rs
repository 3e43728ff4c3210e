//! Fixture status values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status column value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Available,
    #[serde(rename = "Checked Out")]
    CheckedOut,
    #[serde(rename = "WIP")]
    Wip,
    Discontinued,
    /// Derived, never stored: available but past its shelf life
    Check,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Available => "Available",
            Status::CheckedOut => "Checked Out",
            Status::Wip => "WIP",
            Status::Discontinued => "Discontinued",
            Status::Check => "Check",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Available" => Ok(Status::Available),
            "Checked Out" => Ok(Status::CheckedOut),
            "WIP" => Ok(Status::Wip),
            "Discontinued" => Ok(Status::Discontinued),
            "Check" => Ok(Status::Check),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
