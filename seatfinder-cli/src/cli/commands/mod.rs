//! Command handlers, one module per audience

pub mod admin;
pub mod guests;
pub mod invitations;
