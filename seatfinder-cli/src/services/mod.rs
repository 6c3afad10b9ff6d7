// Business logic services layer
//
// Source reconciliation, name matching and the invitation registry. Used by
// the CLI and by anything embedding the library.

pub mod invitations;
pub mod matching;
pub mod sources;

pub use invitations::InvitationRegistry;
pub use sources::{GuestSource, LoadOutcome, SourceReconciler};
