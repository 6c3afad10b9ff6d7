//! Tiered guest list sources
//!
//! Precedence, first success wins:
//! 1. Remote store, when configured (an empty remote list is authoritative)
//! 2. Bundled spreadsheet, first candidate that parses to a non-empty list
//! 3. Local cache snapshot
//!
//! Results from tiers 1 and 2 are written back to the cache.
//!
//! Invitations come from the remote store when configured; otherwise the
//! bundled invitations file is overlaid with cached uploads.

pub mod bundled;
pub mod remote;

pub use bundled::{
    BundledSource, DirectorySource, HttpSource, find_bundled_invitation, load_bundled_invitations,
    parse_invitations_json, source_from_config,
};
pub use remote::{RemoteGuests, RemoteStore, fetch_remote_guests};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::repository::GuestCache;
use crate::directory::{Guest, Invitation, parse_guest_list};

/// Tier that produced a guest list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestSource {
    Remote,
    Bundled(String),
    Cache,
    Empty,
}

impl std::fmt::Display for GuestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuestSource::Remote => write!(f, "remote store"),
            GuestSource::Bundled(name) => write!(f, "bundled file '{}'", name),
            GuestSource::Cache => write!(f, "local cache"),
            GuestSource::Empty => write!(f, "no source"),
        }
    }
}

/// Guests plus the tier they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub guests: Vec<Guest>,
    pub source: GuestSource,
}

/// Decides which source of truth to read the guest list from
pub struct SourceReconciler {
    remote: Option<Arc<dyn RemoteStore>>,
    bundled: Option<Arc<dyn BundledSource>>,
    candidates: Vec<String>,
    invitations_file: Option<String>,
    cache: GuestCache,
}

impl SourceReconciler {
    pub fn new(cache: GuestCache) -> Self {
        Self {
            remote: None,
            bundled: None,
            candidates: Vec::new(),
            invitations_file: None,
            cache,
        }
    }

    /// Use a configured remote store as the first tier
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Try `candidates` in `source` as the second tier
    pub fn with_bundled(mut self, source: Arc<dyn BundledSource>, candidates: Vec<String>) -> Self {
        self.bundled = Some(source);
        self.candidates = candidates;
        self
    }

    /// Read `file_name` from the bundled source as a table -> invitation map
    pub fn with_invitations_file(mut self, file_name: impl Into<String>) -> Self {
        self.invitations_file = Some(file_name.into());
        self
    }

    /// Load the authoritative guest list
    pub async fn load(&self) -> Vec<Guest> {
        self.load_with_source().await.guests
    }

    /// Load the authoritative guest list and report which tier answered
    pub async fn load_with_source(&self) -> LoadOutcome {
        match fetch_remote_guests(self.remote.as_deref()).await {
            Ok(RemoteGuests::Configured(guests)) => {
                log::info!("Loaded {} guests from remote store", guests.len());
                self.write_back(&guests).await;
                return LoadOutcome {
                    guests,
                    source: GuestSource::Remote,
                };
            }
            Ok(RemoteGuests::NotConfigured) => {
                log::debug!("Remote store not configured");
            }
            Err(e) => {
                log::warn!("Remote store unavailable, falling back: {:#}", e);
            }
        }

        if let Some((file_name, guests)) = self.load_bundled().await {
            log::info!("Loaded {} guests from bundled file {}", guests.len(), file_name);
            self.write_back(&guests).await;
            return LoadOutcome {
                guests,
                source: GuestSource::Bundled(file_name),
            };
        }

        match self.cache.load_guests().await {
            Ok(Some(guests)) => {
                log::info!("Loaded {} guests from local cache", guests.len());
                return LoadOutcome {
                    guests,
                    source: GuestSource::Cache,
                };
            }
            Ok(None) => log::debug!("Local cache is empty"),
            Err(e) => log::warn!("Local cache unreadable: {:#}", e),
        }

        log::warn!("No guest list found in any source");
        LoadOutcome {
            guests: Vec::new(),
            source: GuestSource::Empty,
        }
    }

    /// Remote invitations when configured, else the bundled map with cached
    /// uploads taking precedence per table
    pub async fn load_invitations(&self) -> BTreeMap<String, Invitation> {
        if let Some(remote) = &self.remote {
            match remote.list_invitations().await {
                Ok(list) => {
                    let invitations: BTreeMap<String, Invitation> = list
                        .into_iter()
                        .map(|invitation| (invitation.table.clone(), invitation))
                        .collect();
                    if let Err(e) = self.cache.save_invitations(&invitations).await {
                        log::error!("Failed to cache invitations: {:#}", e);
                    }
                    return invitations;
                }
                Err(e) => log::warn!("Remote invitations unavailable, falling back: {:#}", e),
            }
        }

        let mut invitations = self.read_bundled_invitations().await.unwrap_or_default();
        if !invitations.is_empty() {
            log::info!("Loaded {} invitations from bundled file", invitations.len());
        }

        match self.cache.load_invitations().await {
            Ok(Some(cached)) => invitations.extend(cached),
            Ok(None) => {}
            Err(e) => log::warn!("Cached invitations unreadable: {:#}", e),
        }

        invitations
    }

    pub fn bundled(&self) -> Option<Arc<dyn BundledSource>> {
        self.bundled.clone()
    }

    pub fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        self.remote.clone()
    }

    async fn load_bundled(&self) -> Option<(String, Vec<Guest>)> {
        let source = self.bundled.as_ref()?;

        for file_name in &self.candidates {
            let bytes = match source.fetch(file_name).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::debug!("Bundled candidate {} unavailable: {:#}", file_name, e);
                    continue;
                }
            };

            match parse_guest_list(&bytes, Some(file_name)) {
                Ok(guests) if !guests.is_empty() => return Some((file_name.clone(), guests)),
                Ok(_) => log::debug!("Bundled candidate {} has no guests", file_name),
                Err(e) => log::warn!("Bundled candidate {} unreadable: {}", file_name, e),
            }
        }

        None
    }

    async fn read_bundled_invitations(&self) -> Option<BTreeMap<String, Invitation>> {
        let source = self.bundled.as_ref()?;
        let file_name = self.invitations_file.as_deref()?;
        load_bundled_invitations(source.as_ref(), file_name).await
    }

    async fn write_back(&self, guests: &[Guest]) {
        if let Err(e) = self.cache.save_guests(guests).await {
            log::error!("Failed to cache guest list: {:#}", e);
        }
    }
}
