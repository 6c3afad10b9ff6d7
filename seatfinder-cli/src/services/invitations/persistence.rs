//! Best-effort write-behind to the cache and the remote store
//!
//! State changes are committed in memory first; the matching write is then
//! spawned as a task that only logs on failure. Tasks run one after another
//! in scheduling order so an older snapshot never lands after a newer one.
//!
//! Writes are spawned on the current Tokio runtime. Outside a runtime they
//! are skipped with an error log and only the in-memory state changes.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::config::repository::GuestCache;
use crate::directory::{Guest, Invitation};
use crate::services::sources::RemoteStore;

pub struct Persistence {
    cache: GuestCache,
    remote: Option<Arc<dyn RemoteStore>>,
    last: Option<JoinHandle<()>>,
}

impl Persistence {
    pub fn new(cache: GuestCache, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            cache,
            remote,
            last: None,
        }
    }

    /// Run `task` after every previously scheduled task, logging its failure
    pub fn schedule<F>(&mut self, what: impl Into<String>, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let what = what.into();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::error!("No async runtime available, {} was not persisted", what);
            return;
        };

        let previous = self.last.take();
        self.last = Some(runtime.spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    log::error!("Earlier persistence task aborted: {}", e);
                }
            }
            match task.await {
                Ok(()) => log::debug!("Persisted {}", what),
                Err(e) => log::error!("Failed to persist {}: {:#}", what, e),
            }
        }));
    }

    /// Wait for every scheduled write to finish
    pub async fn flush(&mut self) {
        if let Some(last) = self.last.take() {
            if let Err(e) = last.await {
                log::error!("Persistence task aborted: {}", e);
            }
        }
    }

    pub fn save_guests(&mut self, guests: &[Guest]) {
        let snapshot = guests.to_vec();
        let cache = self.cache.clone();
        let remote = self.remote.clone();

        self.schedule("guest list", async move {
            cache.save_guests(&snapshot).await?;
            if let Some(remote) = remote {
                remote.replace_guests(&snapshot).await?;
            }
            Ok(())
        });
    }

    /// Cache the whole map and upsert the changed table remotely
    pub fn save_invitation(&mut self, invitations: &BTreeMap<String, Invitation>, table: &str) {
        let snapshot = invitations.clone();
        let changed = invitations.get(table).cloned();
        let cache = self.cache.clone();
        let remote = self.remote.clone();

        self.schedule(format!("invitation for {}", table), async move {
            cache.save_invitations(&snapshot).await?;
            if let (Some(remote), Some(invitation)) = (remote, changed) {
                remote.upsert_invitation(&invitation).await?;
            }
            Ok(())
        });
    }

    pub fn delete_invitation(&mut self, invitations: &BTreeMap<String, Invitation>, table: &str) {
        let snapshot = invitations.clone();
        let table = table.to_string();
        let cache = self.cache.clone();
        let remote = self.remote.clone();

        self.schedule(format!("removal of invitation for {}", table), async move {
            cache.save_invitations(&snapshot).await?;
            if let Some(remote) = remote {
                remote.delete_invitation(&table).await?;
            }
            Ok(())
        });
    }

    pub fn clear_all(&mut self) {
        let cache = self.cache.clone();
        let remote = self.remote.clone();

        self.schedule("clear all", async move {
            cache.clear().await?;
            if let Some(remote) = remote {
                remote.clear_guests().await?;
                remote.clear_invitations().await?;
            }
            Ok(())
        });
    }
}
