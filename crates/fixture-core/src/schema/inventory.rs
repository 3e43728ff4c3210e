//! Inventory rows and the fixed sheet header

use super::status::Status;
use crate::workbook::{Row, WorkbookError, WorkbookStore};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Header row of every inventory workbook, in column order
pub const COLUMNS: [&str; 8] = [
    "Serial",
    "Model",
    "Name",
    "Status",
    "Checked Out By",
    "Checked Out At",
    "Serialized Date",
    "WIP Location",
];

/// Age after which an available fixture must be re-checked
pub const SHELF_LIFE_DAYS: i64 = 182;

/// Errors reading or validating inventory data
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    /// Header row lacks one of Serial, Model, Name or Status
    #[error("inventory header is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    #[error(
        "serial '{0}' must be FX##### or F## to F######, optionally with a -SLC suffix"
    )]
    InvalidSerial(String),

    #[error("serial pattern failed to compile: {0}")]
    Pattern(regex::Error),
}

/// One fixture row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryRecord {
    pub serial: String,
    /// Comma-joined compatible model names
    pub model: String,
    /// Fixture type
    pub name: String,
    /// Stored status label, kept verbatim
    pub status: String,
    pub checked_out_by: String,
    /// Text timestamp, `%Y-%m-%d %H:%M:%S`
    pub checked_out_at: String,
    pub serialized_date: String,
    pub wip_location: String,
}

impl InventoryRecord {
    pub fn models(&self) -> Vec<&str> {
        self.model
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect()
    }

    pub fn stored_status(&self) -> Option<Status> {
        self.status.parse().ok()
    }

    /// Stored status, with `Available` turned into `Check` once the fixture
    /// is [`SHELF_LIFE_DAYS`] old
    pub fn effective_status(&self, today: NaiveDate) -> Option<Status> {
        let status = self.stored_status()?;
        if status != Status::Available {
            return Some(status);
        }
        match parse_date(&self.serialized_date) {
            Some(serialized) if (today - serialized).num_days() >= SHELF_LIFE_DAYS => {
                Some(Status::Check)
            }
            _ => Some(status),
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Dates written by a spreadsheet may carry a time part
    let date_part = text.split_whitespace().next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Serial,
    Model,
    Name,
    Status,
    CheckedOutBy,
    CheckedOutAt,
    SerializedDate,
    WipLocation,
}

const REQUIRED: [(Field, &str); 4] = [
    (Field::Serial, "Serial"),
    (Field::Model, "Model"),
    (Field::Name, "Name"),
    (Field::Status, "Status"),
];

fn normalize(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '(' | ')') && !c.is_whitespace())
        .collect()
}

/// Map header cells to fields; the first column claiming a field wins
fn map_header(header: &Row) -> Vec<(Field, usize)> {
    let mut mapped: Vec<(Field, usize)> = Vec::new();
    let taken = |mapped: &Vec<(Field, usize)>, f: Field| mapped.iter().any(|(m, _)| *m == f);

    for (idx, raw) in header.iter().enumerate() {
        let col = normalize(raw);
        let field = if col == "serial" {
            Field::Serial
        } else if col == "checkedoutby" {
            Field::CheckedOutBy
        } else if col == "checkedoutat" {
            Field::CheckedOutAt
        } else if col.contains("model") {
            Field::Model
        } else if col.contains("name") {
            Field::Name
        } else if col.contains("status") {
            Field::Status
        } else if col.contains("wip") && col.contains("location") {
            Field::WipLocation
        } else if col.contains("shelf") || col.ends_with("date") {
            Field::SerializedDate
        } else {
            continue;
        };
        if !taken(&mapped, field) {
            mapped.push((field, idx));
        }
    }
    mapped
}

fn record_from_row(row: &Row, columns: &[(Field, usize)]) -> InventoryRecord {
    let mut record = InventoryRecord::default();
    for (field, idx) in columns {
        let value = row.get(*idx).map(|v| v.trim().to_string()).unwrap_or_default();
        let slot = match field {
            Field::Serial => &mut record.serial,
            Field::Model => &mut record.model,
            Field::Name => &mut record.name,
            Field::Status => &mut record.status,
            Field::CheckedOutBy => &mut record.checked_out_by,
            Field::CheckedOutAt => &mut record.checked_out_at,
            Field::SerializedDate => &mut record.serialized_date,
            Field::WipLocation => &mut record.wip_location,
        };
        *slot = value;
    }
    record
}

/// Read every fixture row from a data file
///
/// A file that does not exist yet is an empty inventory. Header names are
/// matched loosely (case, spaces, dashes, underscores and parentheses are
/// ignored) so hand-edited sheets still load.
pub fn load_inventory<S: WorkbookStore>(
    store: &S,
    path: &Path,
) -> Result<Vec<InventoryRecord>, InventoryError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let rows = store.read_rows(path)?;
    let Some((header, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let columns = map_header(header);
    let missing: Vec<&'static str> = REQUIRED
        .iter()
        .filter(|(field, _)| !columns.iter().any(|(f, _)| f == field))
        .map(|(_, name)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(InventoryError::MissingColumns(missing));
    }

    let records: Vec<InventoryRecord> = body
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| record_from_row(row, &columns))
        .collect();
    debug!("Loaded {} fixture(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Smallest unused `FX#####` serial
pub fn next_serial(records: &[InventoryRecord]) -> String {
    let used: BTreeSet<u32> = records
        .iter()
        .filter_map(|r| r.serial.strip_prefix("FX"))
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|digits| digits.parse().ok())
        .collect();
    let n = (1u32..).find(|n| !used.contains(n)).unwrap_or(1);
    format!("FX{n:05}")
}

const SERIAL_PATTERN: &str = r"^(FX\d{5}|F\d{2,6})(-SLC)?$";

/// Upper-case a serial and check it against the accepted formats
pub fn validate_serial(input: &str) -> Result<String, InventoryError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(SERIAL_PATTERN))
        .as_ref()
        .map_err(|e| InventoryError::Pattern(e.clone()))?;

    let serial = input.trim().to_uppercase();
    if pattern.is_match(&serial) {
        Ok(serial)
    } else {
        Err(InventoryError::InvalidSerial(serial))
    }
}
