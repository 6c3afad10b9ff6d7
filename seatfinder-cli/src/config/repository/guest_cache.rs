//! Typed access to the cached guest directory

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::kv_store::KeyValueStore;
use crate::directory::{Guest, Invitation};

/// Cache key holding the guest list as a JSON array
pub const GUEST_LIST_KEY: &str = "seatfinder:guest-list";

/// Cache key holding uploaded invitations as a JSON object keyed by table
pub fn uploads_key() -> String {
    format!("{}:uploads", GUEST_LIST_KEY)
}

/// Guest and invitation snapshots in a key-value store
#[derive(Clone)]
pub struct GuestCache {
    store: Arc<dyn KeyValueStore>,
}

impl GuestCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// Read the cached guest list
    ///
    /// `Ok(None)` when nothing is cached. A value that is not a JSON array of
    /// guests is an error.
    pub async fn load_guests(&self) -> Result<Option<Vec<Guest>>> {
        let Some(raw) = self.store.get(GUEST_LIST_KEY).await? else {
            return Ok(None);
        };
        let guests: Vec<Guest> =
            serde_json::from_str(&raw).context("Cached guest list is not a guest array")?;
        Ok(Some(guests))
    }

    pub async fn save_guests(&self, guests: &[Guest]) -> Result<()> {
        let raw = serde_json::to_string(guests).context("Failed to serialize guest list")?;
        self.store.set(GUEST_LIST_KEY, &raw).await
    }

    pub async fn load_invitations(&self) -> Result<Option<BTreeMap<String, Invitation>>> {
        let Some(raw) = self.store.get(&uploads_key()).await? else {
            return Ok(None);
        };
        let invitations: BTreeMap<String, Invitation> =
            serde_json::from_str(&raw).context("Cached invitations are not a table map")?;
        Ok(Some(invitations))
    }

    pub async fn save_invitations(&self, invitations: &BTreeMap<String, Invitation>) -> Result<()> {
        let raw = serde_json::to_string(invitations).context("Failed to serialize invitations")?;
        self.store.set(&uploads_key(), &raw).await
    }

    /// Drop both snapshots
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(GUEST_LIST_KEY).await?;
        self.store.remove(&uploads_key()).await
    }
}
