//! Write a guest directory back to the single-column spreadsheet layout

use anyhow::{Context, Result, bail};
use rust_xlsxwriter::{Format, Workbook};

use crate::directory::types::Guest;

use super::classifier::{RowKind, classify_row};

const HEADER: &str = "Guest";

/// Build an xlsx buffer the parser reads back into the same guests
///
/// Unassigned guests go first, before any table marker. Tables keep the
/// order in which they first appear in `guests`. Fails instead of writing
/// a label the parser would read as a guest, or a name it would read as a
/// table marker.
pub fn write_guest_list(guests: &[Guest]) -> Result<Vec<u8>> {
    let unreadable = unreadable_entries(guests);
    if !unreadable.is_empty() {
        bail!(
            "Cannot export the guest list, these entries would not read back correctly: {}",
            unreadable.join(", ")
        );
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Guest List")?;
    worksheet.set_column_width(0, 40)?;

    let bold = Format::new().set_bold();
    worksheet.write_string_with_format(0, 0, HEADER, &bold)?;

    let mut row: u32 = 1;
    for guest in guests.iter().filter(|g| g.is_unassigned()) {
        worksheet.write_string(row, 0, &guest.name)?;
        row += 1;
    }

    for table in table_order(guests) {
        worksheet.write_string_with_format(row, 0, table, &bold)?;
        row += 1;
        for guest in guests.iter().filter(|g| g.table == table) {
            worksheet.write_string(row, 0, &guest.name)?;
            row += 1;
        }
    }

    workbook
        .save_to_buffer()
        .context("Failed to serialize guest list workbook")
}

/// Assigned table labels in first-seen order
fn table_order(guests: &[Guest]) -> Vec<&str> {
    let mut tables: Vec<&str> = Vec::new();
    for guest in guests.iter().filter(|g| !g.is_unassigned()) {
        if !tables.contains(&guest.table.as_str()) {
            tables.push(&guest.table);
        }
    }
    tables
}

/// Table labels that would not parse as markers and names that would not
/// parse as the same guest
fn unreadable_entries(guests: &[Guest]) -> Vec<String> {
    let mut unreadable = Vec::new();

    for table in table_order(guests) {
        let reads_as_marker =
            matches!(classify_row(&[table.to_string()], true), RowKind::TableMarker(_));
        if !reads_as_marker || table.trim() != table {
            unreadable.push(format!("table label '{}'", table));
        }
    }

    for guest in guests {
        let name = guest.name.as_str();
        let reads_as_guest = classify_row(&[name.to_string()], true) == RowKind::Guest(name.to_string());
        let entry = format!("guest name '{}'", name);
        if (!reads_as_guest || name.trim() != name) && !unreadable.contains(&entry) {
            unreadable.push(entry);
        }
    }

    unreadable
}
