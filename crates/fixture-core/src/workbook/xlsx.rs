//! `.xlsx` implementation of the spreadsheet layer

use super::{Row, WorkbookError, WorkbookStore};
use crate::schema::COLUMNS;
use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// Name of the worksheet holding inventory rows
pub const INVENTORY_SHEET: &str = "Inventory";

const HEADER_FILL: u32 = 0x4F81BD;

/// Production store backed by `rust_xlsxwriter`, `calamine` and `fs2` locks
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxStore;

impl XlsxStore {
    pub fn new() -> Self {
        Self
    }

    fn header_bytes(path: &Path) -> Result<Vec<u8>, WorkbookError> {
        let format_err = |e: rust_xlsxwriter::XlsxError| WorkbookError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let header = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(HEADER_FILL));

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(INVENTORY_SHEET).map_err(format_err)?;
        for (col, title) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            worksheet
                .write_string_with_format(0, col, *title, &header)
                .map_err(format_err)?;
            worksheet
                .set_column_width(col, title.len().max(12) as f64 + 2.0)
                .map_err(format_err)?;
        }
        workbook.save_to_buffer().map_err(format_err)
    }
}

impl WorkbookStore for XlsxStore {
    fn create_inventory(&self, path: &Path) -> Result<(), WorkbookError> {
        let bytes = Self::header_bytes(path)?;
        let tmp_path = path.with_extension("xlsx.tmp");

        {
            let mut tmp_file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
            tmp_file
                .write_all(&bytes)
                .map_err(|e| io_err(&tmp_path, e))?;
            tmp_file.sync_all().map_err(|e| io_err(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_err(path, e)
        })?;
        debug!("Created inventory workbook {}", path.display());
        Ok(())
    }

    fn write_probe(&self, path: &Path) -> Result<(), WorkbookError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied || is_sharing_violation(&e) {
                    WorkbookError::Locked {
                        path: path.to_path_buf(),
                    }
                } else {
                    io_err(path, e)
                }
            })?;

        fs2::FileExt::try_lock_exclusive(&file).map_err(|e| {
            if is_lock_contended(&e) {
                WorkbookError::Locked {
                    path: path.to_path_buf(),
                }
            } else {
                io_err(path, e)
            }
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| io_err(path, e))?;
        Xlsx::new(Cursor::new(bytes.as_slice())).map_err(|e: calamine::XlsxError| {
            WorkbookError::Format {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        file.seek(SeekFrom::Start(0)).map_err(|e| io_err(path, e))?;
        file.write_all(&bytes).map_err(|e| io_err(path, e))?;
        file.set_len(bytes.len() as u64)
            .map_err(|e| io_err(path, e))?;
        file.sync_all().map_err(|e| io_err(path, e))?;
        // Lock is released when `file` drops
        debug!("{} is accessible and writable", path.display());
        Ok(())
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<Row>, WorkbookError> {
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        let format_err = |e: calamine::XlsxError| WorkbookError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut workbook: Xlsx<_> = Xlsx::new(std::io::BufReader::new(file)).map_err(format_err)?;
        let sheet_names = workbook.sheet_names();
        let sheet = sheet_names
            .iter()
            .find(|name| name.as_str() == INVENTORY_SHEET)
            .or_else(|| sheet_names.first())
            .cloned()
            .ok_or_else(|| WorkbookError::Format {
                path: path.to_path_buf(),
                message: "workbook has no worksheets".to_string(),
            })?;

        let range = workbook.worksheet_range(&sheet).map_err(format_err)?;
        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> WorkbookError {
    WorkbookError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn is_lock_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn is_sharing_violation(e: &std::io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    #[cfg(windows)]
    {
        matches!(e.raw_os_error(), Some(32) | Some(33))
    }

    #[cfg(not(windows))]
    {
        let _ = e;
        false
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_text(dt.as_f64()),
        Data::Error(e) => format!("{e:?}"),
    }
}

/// Render an Excel serial date (days since 1899-12-30) as text
fn excel_serial_text(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return serial.to_string();
    };
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    let Some(date) = epoch.checked_add_signed(Duration::days(days)) else {
        return serial.to_string();
    };
    if seconds == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        let Some(datetime) = date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.checked_add_signed(Duration::seconds(seconds)))
        else {
            return date.format("%Y-%m-%d").to_string();
        };
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
