//! Decode spreadsheet bytes into trimmed string rows
//!
//! Workbooks (xlsx, xlsm, xlsb, xls, ods) go through calamine; CSV text goes
//! through the csv reader. Only the first sheet of a workbook is read.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::directory::types::RawRow;

/// Error when a byte buffer cannot be read as tabular data at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer is not a workbook calamine understands
    Workbook(String),
    /// Workbook opened but has no sheets
    NoSheets,
    /// First sheet could not be read
    Sheet { name: String, message: String },
    /// CSV text could not be read
    Csv(String),
}

impl DecodeError {
    /// Message shown to whoever uploaded the file
    pub fn user_message(&self) -> &'static str {
        "We could not process that file. Please try another."
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Workbook(message) => write!(f, "failed to open workbook: {}", message),
            DecodeError::NoSheets => write!(f, "workbook has no sheets"),
            DecodeError::Sheet { name, message } => {
                write!(f, "failed to read sheet '{}': {}", name, message)
            }
            DecodeError::Csv(message) => write!(f, "failed to read CSV: {}", message),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a spreadsheet buffer into rows
///
/// `file_name` is only a format hint. Rows whose cells are all empty are
/// dropped; every cell is trimmed.
pub fn decode_rows(bytes: &[u8], file_name: Option<&str>) -> Result<Vec<RawRow>, DecodeError> {
    let is_csv = file_name
        .map(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .unwrap_or(false);

    if is_csv {
        return decode_csv(bytes);
    }

    match decode_workbook(bytes) {
        Ok(rows) => Ok(rows),
        // Without a hint, plain text is still worth a try as CSV
        Err(DecodeError::Workbook(message)) if file_name.is_none() => {
            if std::str::from_utf8(bytes).is_ok() {
                log::debug!("Buffer is not a workbook ({}), reading as CSV", message);
                decode_csv(bytes)
            } else {
                Err(DecodeError::Workbook(message))
            }
        }
        Err(e) => Err(e),
    }
}

fn decode_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DecodeError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DecodeError::NoSheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DecodeError::Sheet {
            name: sheet_name.clone(),
            message: e.to_string(),
        })?;

    // calamine ranges start at the first used cell; pad back to column A
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    log::debug!(
        "Reading sheet '{}' from row {} column {}",
        sheet_name,
        first_row + 1,
        first_col + 1
    );

    let rows = range
        .rows()
        .map(|cells| {
            let mut row: RawRow = vec![String::new(); first_col as usize];
            row.extend(cells.iter().map(cell_to_string));
            row
        })
        .filter(|row| !is_blank(row))
        .collect();

    Ok(rows)
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::Csv(e.to_string()))?;
        let row: RawRow = record.iter().map(|cell| cell.trim().to_string()).collect();
        if !is_blank(&row) {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

fn cell_to_string(cell: &Data) -> String {
    let text = match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Whole numbers read back the way they were typed
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    };
    text.trim().to_string()
}
