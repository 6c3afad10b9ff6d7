//! Guest directory records and spreadsheet I/O

pub mod excel;
pub mod types;

pub use excel::{DecodeError, EMPTY_GUEST_LIST_HINT, GuestListParser, parse_guest_list};
pub use types::{AssetKind, AssetRef, Guest, Invitation, RawRow, TableSummary, UNASSIGNED_TABLE};
