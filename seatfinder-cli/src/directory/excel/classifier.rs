//! Row classification for guest list spreadsheets
//!
//! Column A carries everything: a header cell mentioning "guest", table
//! labels such as "Table 3", and guest names underneath each label.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)guest").unwrap());
static TABLE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)table").unwrap());

/// Semantic tag for one spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Empty first cell, or anything above the header row
    Blank,
    /// The header row itself (yields no record)
    Header,
    /// Table label that applies to the rows below it
    TableMarker(String),
    /// Guest name
    Guest(String),
}

/// True when any cell after the first carries a value
pub fn has_metadata(row: &[String]) -> bool {
    row.iter().skip(1).any(|cell| !cell.trim().is_empty())
}

/// Classify a row given whether the header has been seen yet
///
/// Rules are evaluated in order, first hit wins.
pub fn classify_row(row: &[String], header_seen: bool) -> RowKind {
    let primary = match row.first() {
        Some(cell) if !cell.is_empty() => cell,
        _ => return RowKind::Blank,
    };

    if !header_seen {
        if HEADER_PATTERN.is_match(primary) {
            return RowKind::Header;
        }
        // Title and preamble rows above the header are ignored
        return RowKind::Blank;
    }

    if TABLE_PATTERN.is_match(primary) && !has_metadata(row) {
        return RowKind::TableMarker(primary.clone());
    }

    // A lone name with empty trailing cells is still a guest: the only
    // discriminator between markers and guests is the "table" keyword above.
    RowKind::Guest(primary.clone())
}

/// Streaming classifier carrying the header flag between rows
#[derive(Debug, Default, Clone)]
pub struct RowClassifier {
    header_seen: bool,
}

impl RowClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_seen(&self) -> bool {
        self.header_seen
    }

    /// Classify the next row, flipping to "header seen" on the header row
    pub fn classify(&mut self, row: &[String]) -> RowKind {
        let kind = classify_row(row, self.header_seen);
        if kind == RowKind::Header {
            self.header_seen = true;
        }
        kind
    }
}
