//! Remote store seam and the configured / not configured distinction

use anyhow::Result;
use async_trait::async_trait;

use crate::directory::{Guest, Invitation};

/// Hosted backend holding the authoritative guest list and invitations
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All guests ordered by table, then name
    async fn list_guests(&self) -> Result<Vec<Guest>>;
    async fn list_invitations(&self) -> Result<Vec<Invitation>>;
    /// Delete every guest, then insert `guests`
    async fn replace_guests(&self, guests: &[Guest]) -> Result<()>;
    /// Insert or update the invitation keyed by its table
    async fn upsert_invitation(&self, invitation: &Invitation) -> Result<()>;
    async fn delete_invitation(&self, table: &str) -> Result<()>;
    async fn clear_guests(&self) -> Result<()>;
    async fn clear_invitations(&self) -> Result<()>;
}

/// Outcome of asking the remote tier for guests
///
/// An empty `Configured` list is authoritative; only `NotConfigured`
/// lets the caller fall through to other sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteGuests {
    NotConfigured,
    Configured(Vec<Guest>),
}

/// Query the remote store if there is one
///
/// Errors from a configured store are returned so the caller can decide to
/// fall through; they are never turned into an empty list.
pub async fn fetch_remote_guests(remote: Option<&dyn RemoteStore>) -> Result<RemoteGuests> {
    match remote {
        None => Ok(RemoteGuests::NotConfigured),
        Some(remote) => Ok(RemoteGuests::Configured(remote.list_guests().await?)),
    }
}
