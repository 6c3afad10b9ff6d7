//! Guest directory ingestion and matching
//!
//! Turns a loosely structured spreadsheet into a seating directory, lets
//! guests find themselves by typing their name, and tracks which table
//! invitation each guest already took.

pub mod api;
pub mod cli;
pub mod config;
pub mod directory;
pub mod services;

pub use config::Config;
pub use directory::{
    DecodeError, Guest, GuestListParser, Invitation, TableSummary, parse_guest_list,
};
pub use services::matching::{best_match, match_guests};
pub use services::{InvitationRegistry, SourceReconciler};
