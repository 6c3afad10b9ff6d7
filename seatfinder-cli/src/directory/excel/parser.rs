//! Fold classified rows into guest records

use crate::directory::types::{Guest, RawRow, UNASSIGNED_TABLE};

use super::classifier::{RowClassifier, RowKind};
use super::decode::{DecodeError, decode_rows};

/// Hint shown when a spreadsheet decodes fine but yields nobody
pub const EMPTY_GUEST_LIST_HINT: &str = "We could not find any guests. Make sure column A lists guest names and table labels like \"Table 1\".";

/// Single pass over spreadsheet rows, remembering the last table marker
#[derive(Debug, Default)]
pub struct GuestListParser {
    classifier: RowClassifier,
    current_table: String,
    guests: Vec<Guest>,
}

impl GuestListParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse all rows in file order
    ///
    /// Returns an empty list when no header row is found or nothing below
    /// it looks like a guest.
    pub fn parse(rows: &[RawRow]) -> Vec<Guest> {
        let mut parser = Self::new();
        for row in rows {
            parser.push_row(row);
        }
        parser.finish()
    }

    /// Feed one row
    pub fn push_row(&mut self, row: &[String]) {
        match self.classifier.classify(row) {
            RowKind::Blank | RowKind::Header => {}
            RowKind::TableMarker(label) => {
                log::trace!("Table marker: {}", label);
                self.current_table = label;
            }
            RowKind::Guest(name) => {
                let table = if self.current_table.is_empty() {
                    UNASSIGNED_TABLE.to_string()
                } else {
                    self.current_table.clone()
                };
                self.guests.push(Guest {
                    name,
                    table,
                    downloaded: false,
                });
            }
        }
    }

    pub fn finish(self) -> Vec<Guest> {
        if !self.classifier.header_seen() {
            log::debug!("No header row found, guest list is empty");
        }
        self.guests
    }
}

/// Decode a spreadsheet buffer and parse it into guests
pub fn parse_guest_list(bytes: &[u8], file_name: Option<&str>) -> Result<Vec<Guest>, DecodeError> {
    let rows = decode_rows(bytes, file_name)?;
    let guests = GuestListParser::parse(&rows);
    log::info!(
        "Parsed {} guests from {} rows{}",
        guests.len(),
        rows.len(),
        file_name.map(|n| format!(" ({})", n)).unwrap_or_default()
    );
    Ok(guests)
}
