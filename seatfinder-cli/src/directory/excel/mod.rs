//! Spreadsheet ingestion and export for guest lists

mod classifier;
mod decode;
mod parser;
mod writer;

pub use classifier::{RowClassifier, RowKind, classify_row, has_metadata};
pub use decode::{DecodeError, decode_rows};
pub use parser::{EMPTY_GUEST_LIST_HINT, GuestListParser, parse_guest_list};
pub use writer::write_guest_list;
