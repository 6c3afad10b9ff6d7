//! Invitation registry: the stateful side of the guest directory
//!
//! Holds the ordered guest list, the table → invitation map and each
//! guest's one-time "downloaded" flag. Every mutation is applied in memory
//! and then handed to [`Persistence`] as a best-effort background write.

pub mod assets;
pub mod persistence;

pub use assets::{AssetStore, AssetUpload, InlineAssetStore};
pub use persistence::Persistence;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::directory::{Guest, Invitation, TableSummary};
use crate::services::matching;
use crate::services::sources::{GuestSource, SourceReconciler, find_bundled_invitation};

/// Guest directory plus table invitations
///
/// Mutating methods are synchronous but persist through tasks spawned on
/// the ambient Tokio runtime. Without one the change stays in memory only.
pub struct InvitationRegistry {
    guests: Vec<Guest>,
    uploads: BTreeMap<String, Invitation>,
    bundled: BTreeMap<String, Invitation>,
    source: GuestSource,
    assets: Arc<dyn AssetStore>,
    persistence: Persistence,
}

impl InvitationRegistry {
    pub fn new(
        guests: Vec<Guest>,
        uploads: BTreeMap<String, Invitation>,
        assets: Arc<dyn AssetStore>,
        persistence: Persistence,
    ) -> Self {
        Self {
            guests,
            uploads,
            bundled: BTreeMap::new(),
            source: GuestSource::Empty,
            assets,
            persistence,
        }
    }

    /// Load guests and invitations through the reconciler
    ///
    /// Tables without an uploaded invitation are checked for a bundled file
    /// under `invitation_dir`.
    pub async fn load(
        reconciler: &SourceReconciler,
        assets: Arc<dyn AssetStore>,
        persistence: Persistence,
        invitation_dir: &str,
    ) -> Self {
        let outcome = reconciler.load_with_source().await;
        let uploads = reconciler.load_invitations().await;
        let mut registry = Self::new(outcome.guests, uploads, assets, persistence);
        registry.source = outcome.source;

        if let Some(source) = reconciler.bundled() {
            let missing: Vec<String> = registry
                .tables()
                .into_iter()
                .map(|t| t.name)
                .filter(|name| !registry.uploads.contains_key(name))
                .collect();

            let found = futures::future::join_all(
                missing
                    .iter()
                    .map(|table| find_bundled_invitation(source.as_ref(), invitation_dir, table)),
            )
            .await;

            registry.bundled = found
                .into_iter()
                .flatten()
                .map(|invitation| (invitation.table.clone(), invitation))
                .collect();
            log::debug!("Found {} bundled invitations", registry.bundled.len());
        }

        registry
    }

    /// Tier the guest list was loaded from
    pub fn source(&self) -> &GuestSource {
        &self.source
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    /// First guest whose name is exactly `name`
    pub fn guest(&self, name: &str) -> Option<&Guest> {
        self.guests.iter().find(|g| g.name == name)
    }

    /// Every guest named exactly `name`, in list order
    pub fn guests_named(&self, name: &str) -> Vec<&Guest> {
        self.guests.iter().filter(|g| g.name == name).collect()
    }

    /// Guest self-lookup by typed name
    pub fn search(&self, query: &str) -> Vec<Guest> {
        matching::match_guests(&self.guests, query)
    }

    pub fn guests_at_table(&self, table: &str) -> Vec<&Guest> {
        self.guests.iter().filter(|g| g.table == table).collect()
    }

    /// Tables with guest counts, "Table 2" before "Table 10"
    pub fn tables(&self) -> Vec<TableSummary> {
        let mut tables: Vec<TableSummary> = Vec::new();
        for guest in &self.guests {
            match tables.iter_mut().find(|t| t.name == guest.table) {
                Some(summary) => summary.count += 1,
                None => tables.push(TableSummary {
                    name: guest.table.clone(),
                    count: 1,
                }),
            }
        }
        tables.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        tables
    }

    /// Replace the whole directory (admin import)
    pub fn replace_guests(&mut self, guests: Vec<Guest>) {
        log::info!("Replacing guest list with {} guests", guests.len());
        self.guests = guests;
        self.persistence.save_guests(&self.guests);
    }

    /// Uploaded invitations by table, bundled ones excluded
    pub fn invitations(&self) -> &BTreeMap<String, Invitation> {
        &self.uploads
    }

    /// Uploaded invitations as the JSON map read back from a bundled
    /// invitations file
    pub fn export_invitations(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.uploads).context("Failed to serialize invitations")
    }

    /// Invitation for a table: uploaded first, bundled otherwise
    pub fn get_for_table(&self, table: &str) -> Option<&Invitation> {
        self.uploads.get(table).or_else(|| self.bundled.get(table))
    }

    /// Store an upload and attach it to `table`, replacing any previous one
    pub async fn set(&mut self, table: &str, upload: AssetUpload) -> Result<&Invitation> {
        let asset_ref = self.assets.store(&upload).await?;
        let invitation = Invitation {
            table: table.to_string(),
            asset_kind: upload.kind(),
            asset_ref,
            display_name: upload.file_name,
            mime_type: upload.mime_type,
            uploaded_at: Utc::now(),
        };

        log::info!("Invitation for {} set to {}", table, invitation.display_name);
        self.uploads.insert(table.to_string(), invitation);
        self.persistence.save_invitation(&self.uploads, table);

        Ok(&self.uploads[table])
    }

    /// Drop the uploaded invitation for `table`; false if there was none
    pub fn remove(&mut self, table: &str) -> bool {
        if self.uploads.remove(table).is_none() {
            return false;
        }
        log::info!("Invitation for {} removed", table);
        self.persistence.delete_invitation(&self.uploads, table);
        true
    }

    /// Bytes of an invitation, for display or download
    pub async fn load_asset(&self, invitation: &Invitation) -> Result<Vec<u8>> {
        self.assets.load(&invitation.asset_ref).await
    }

    /// Record that a guest took their invitation
    ///
    /// Acts on the first guest named exactly `name`. Returns false when no
    /// such guest exists or the flag was already set; the flag is never
    /// cleared here.
    pub fn mark_downloaded(&mut self, name: &str) -> bool {
        self.mark_where(name, |g| g.name == name)
    }

    /// Like [`Self::mark_downloaded`], for the guest named `name` at `table`
    ///
    /// Needed when the same name is seated at several tables.
    pub fn mark_downloaded_at(&mut self, name: &str, table: &str) -> bool {
        self.mark_where(name, |g| g.name == name && g.table == table)
    }

    fn mark_where<F>(&mut self, name: &str, matches: F) -> bool
    where
        F: Fn(&Guest) -> bool,
    {
        let Some(guest) = self.guests.iter_mut().find(|g| matches(g)) else {
            log::warn!("Cannot mark unknown guest '{}' as downloaded", name);
            return false;
        };

        if guest.downloaded {
            log::warn!("Guest '{}' already downloaded their invitation", name);
            return false;
        }

        guest.downloaded = true;
        log::info!("Guest '{}' ({}) downloaded their invitation", guest.name, guest.table);
        self.persistence.save_guests(&self.guests);
        true
    }

    /// Clear every downloaded flag; returns how many were set
    pub fn unmark_all(&mut self) -> usize {
        let mut count = 0;
        for guest in self.guests.iter_mut().filter(|g| g.downloaded) {
            guest.downloaded = false;
            count += 1;
        }
        if count > 0 {
            log::info!("Reset downloaded flag for {} guests", count);
            self.persistence.save_guests(&self.guests);
        }
        count
    }

    /// Forget all guests and invitations, locally and remotely
    pub fn clear_all(&mut self) {
        log::info!(
            "Clearing {} guests and {} invitations",
            self.guests.len(),
            self.uploads.len()
        );
        self.guests.clear();
        self.uploads.clear();
        self.bundled.clear();
        self.persistence.clear_all();
    }

    /// Wait for pending writes
    pub async fn flush(&mut self) {
        self.persistence.flush().await;
    }
}

/// Compare labels with digit runs ordered by value, letters case-insensitively
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_digits = take_digits(&mut left);
                let r_digits = take_digits(&mut right);
                let ordering = l_digits
                    .len()
                    .cmp(&r_digits.len())
                    .then_with(|| l_digits.cmp(&r_digits));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::{GuestCache, MemoryStore};
    use crate::directory::{AssetKind, AssetRef};
    use crate::services::sources::RemoteStore;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Remote that records writes and can be told to fail
    #[derive(Default)]
    struct RecordingRemote {
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRemote {
        fn record(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                bail!("remote offline");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for RecordingRemote {
        async fn list_guests(&self) -> Result<Vec<Guest>> {
            Ok(Vec::new())
        }
        async fn list_invitations(&self) -> Result<Vec<Invitation>> {
            Ok(Vec::new())
        }
        async fn replace_guests(&self, guests: &[Guest]) -> Result<()> {
            self.record(format!("replace:{}", guests.len()))
        }
        async fn upsert_invitation(&self, invitation: &Invitation) -> Result<()> {
            self.record(format!("upsert:{}", invitation.table))
        }
        async fn delete_invitation(&self, table: &str) -> Result<()> {
            self.record(format!("delete:{}", table))
        }
        async fn clear_guests(&self) -> Result<()> {
            self.record("clear_guests".to_string())
        }
        async fn clear_invitations(&self) -> Result<()> {
            self.record("clear_invitations".to_string())
        }
    }

    fn guests() -> Vec<Guest> {
        vec![
            Guest::new("Amaka Obi", "Table 10"),
            Guest::new("Chidi Eze", "Table 2"),
            Guest::new("Chidi Eze", "Table 1"),
            Guest::new("Walk In", ""),
        ]
    }

    fn registry(remote: Option<Arc<RecordingRemote>>) -> (InvitationRegistry, GuestCache) {
        let cache = GuestCache::new(Arc::new(MemoryStore::default()));
        let remote = remote.map(|r| r as Arc<dyn RemoteStore>);
        let persistence = Persistence::new(cache.clone(), remote);
        let registry = InvitationRegistry::new(
            guests(),
            BTreeMap::new(),
            Arc::new(InlineAssetStore::new()),
            persistence,
        );
        (registry, cache)
    }

    fn upload(name: &str) -> AssetUpload {
        AssetUpload {
            file_name: name.to_string(),
            mime_type: None,
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_mark_downloaded_only_once() {
        let (mut registry, cache) = registry(None);

        assert!(registry.mark_downloaded("Amaka Obi"));
        assert!(!registry.mark_downloaded("Amaka Obi"));
        assert!(registry.guest("Amaka Obi").unwrap().downloaded);

        registry.flush().await;
        let cached = cache.load_guests().await.unwrap().unwrap();
        assert!(cached[0].downloaded);
    }

    #[tokio::test]
    async fn test_mark_downloaded_unknown_guest() {
        let (mut registry, _) = registry(None);
        assert!(!registry.mark_downloaded("amaka obi"));
        assert!(registry.guests().iter().all(|g| !g.downloaded));
    }

    #[tokio::test]
    async fn test_mark_downloaded_targets_first_duplicate() {
        let (mut registry, _) = registry(None);
        assert!(registry.mark_downloaded("Chidi Eze"));
        assert!(registry.guests()[1].downloaded);
        assert!(!registry.guests()[2].downloaded);
        assert!(!registry.mark_downloaded("Chidi Eze"));
    }

    #[tokio::test]
    async fn test_unmark_all() {
        let (mut registry, _) = registry(None);
        registry.mark_downloaded("Amaka Obi");
        registry.mark_downloaded("Walk In");
        assert_eq!(registry.unmark_all(), 2);
        assert_eq!(registry.unmark_all(), 0);
        assert!(registry.mark_downloaded("Amaka Obi"));
    }

    #[tokio::test]
    async fn test_set_replaces_and_persists() {
        let remote = Arc::new(RecordingRemote::default());
        let (mut registry, cache) = registry(Some(remote.clone()));

        registry.set("Table 2", upload("first.pdf")).await.unwrap();
        let invitation = registry.set("Table 2", upload("second.png")).await.unwrap();
        assert_eq!(invitation.display_name, "second.png");
        assert_eq!(invitation.asset_kind, AssetKind::Image);
        assert!(matches!(invitation.asset_ref, AssetRef::DataUrl(_)));

        let invitation = registry.get_for_table("Table 2").unwrap().clone();
        assert_eq!(registry.load_asset(&invitation).await.unwrap(), b"%PDF-1.4");

        registry.flush().await;
        let cached = cache.load_invitations().await.unwrap().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached["Table 2"].display_name, "second.png");
        assert_eq!(
            *remote.calls.lock().unwrap(),
            vec!["upsert:Table 2".to_string(), "upsert:Table 2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let remote = Arc::new(RecordingRemote::default());
        let (mut registry, _) = registry(Some(remote.clone()));

        assert!(!registry.remove("Table 1"));
        registry.set("Table 1", upload("t1.pdf")).await.unwrap();
        assert!(registry.remove("Table 1"));
        assert!(registry.get_for_table("Table 1").is_none());

        registry.flush().await;
        assert_eq!(
            *remote.calls.lock().unwrap(),
            vec!["upsert:Table 1".to_string(), "delete:Table 1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_is_not_surfaced() {
        let remote = Arc::new(RecordingRemote {
            fail: true,
            ..Default::default()
        });
        let (mut registry, cache) = registry(Some(remote));

        assert!(registry.mark_downloaded("Walk In"));
        registry.flush().await;

        // The cache write went through before the remote failed
        let cached = cache.load_guests().await.unwrap().unwrap();
        assert!(cached[3].downloaded);
        assert!(registry.guest("Walk In").unwrap().downloaded);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let remote = Arc::new(RecordingRemote::default());
        let (mut registry, cache) = registry(Some(remote.clone()));
        registry.set("Table 1", upload("t1.pdf")).await.unwrap();

        registry.clear_all();
        assert!(registry.guests().is_empty());
        assert!(registry.get_for_table("Table 1").is_none());

        registry.flush().await;
        assert_eq!(cache.load_guests().await.unwrap(), None);
        assert_eq!(cache.load_invitations().await.unwrap(), None);
        assert_eq!(
            *remote.calls.lock().unwrap(),
            vec![
                "upsert:Table 1".to_string(),
                "clear_guests".to_string(),
                "clear_invitations".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_replace_guests_and_search() {
        let (mut registry, cache) = registry(None);
        registry.replace_guests(vec![Guest::new("Ngozi Adeyemi", "Table 4")]);

        assert_eq!(registry.search("adeyemi").len(), 1);
        assert!(registry.search("Chidi").is_empty());

        registry.flush().await;
        assert_eq!(cache.load_guests().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tables_sorted_naturally() {
        let (registry, _) = registry(None);
        let tables: Vec<(String, usize)> = registry
            .tables()
            .into_iter()
            .map(|t| (t.name, t.count))
            .collect();
        assert_eq!(
            tables,
            vec![
                ("Table 1".to_string(), 1),
                ("Table 2".to_string(), 1),
                ("Table 10".to_string(), 1),
                ("Unassigned".to_string(), 1),
            ]
        );
        assert_eq!(registry.guests_at_table("Table 2").len(), 1);
    }

    struct FileBundle(std::collections::HashMap<String, Vec<u8>>);

    #[async_trait]
    impl crate::services::sources::BundledSource for FileBundle {
        async fn fetch(&self, file_name: &str) -> Result<Vec<u8>> {
            match self.0.get(file_name) {
                Some(bytes) => Ok(bytes.clone()),
                None => bail!("404 {}", file_name),
            }
        }
        async fn exists(&self, file_name: &str) -> bool {
            self.0.contains_key(file_name)
        }
        fn locate(&self, file_name: &str) -> AssetRef {
            AssetRef::Path(file_name.to_string())
        }
    }

    #[tokio::test]
    async fn test_load_finds_bundled_invitations() {
        let files = [
            ("guest-list.csv", "Guest\nTable 1\nAmaka Obi\nTable 2\nTunde Bello\n"),
            ("invitations/Table 1.pdf", "bundled"),
            ("invitations/Table 2.png", "bundled"),
        ];
        let bundle = FileBundle(
            files
                .iter()
                .map(|(name, body)| (name.to_string(), body.as_bytes().to_vec()))
                .collect(),
        );

        let cache = GuestCache::new(Arc::new(MemoryStore::default()));
        let uploaded = Invitation {
            table: "Table 1".to_string(),
            asset_kind: AssetKind::Pdf,
            asset_ref: AssetRef::DataUrl("data:application/pdf;base64,JVBERg==".to_string()),
            display_name: "uploaded.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            uploaded_at: Utc::now(),
        };
        cache
            .save_invitations(&BTreeMap::from([("Table 1".to_string(), uploaded)]))
            .await
            .unwrap();

        let reconciler = SourceReconciler::new(cache.clone())
            .with_bundled(Arc::new(bundle), vec!["guest-list.csv".to_string()]);
        let registry = InvitationRegistry::load(
            &reconciler,
            Arc::new(InlineAssetStore::new()),
            Persistence::new(cache, None),
            "invitations",
        )
        .await;

        assert_eq!(registry.source(), &GuestSource::Bundled("guest-list.csv".to_string()));
        assert_eq!(registry.guests().len(), 2);
        assert_eq!(registry.get_for_table("Table 1").unwrap().display_name, "uploaded.pdf");

        let bundled = registry.get_for_table("Table 2").unwrap();
        assert_eq!(bundled.asset_kind, AssetKind::Image);
        assert_eq!(bundled.asset_ref, AssetRef::Path("invitations/Table 2.png".to_string()));
    }

    #[tokio::test]
    async fn test_mark_downloaded_at_reaches_later_duplicate() {
        let (mut registry, _) = registry(None);
        assert_eq!(registry.guests_named("Chidi Eze").len(), 2);

        assert!(registry.mark_downloaded_at("Chidi Eze", "Table 1"));
        assert!(!registry.guests()[1].downloaded);
        assert!(registry.guests()[2].downloaded);
        assert!(!registry.mark_downloaded_at("Chidi Eze", "Table 1"));
        assert!(!registry.mark_downloaded_at("Chidi Eze", "Table 10"));

        // The first duplicate is still free to download
        assert!(registry.mark_downloaded("Chidi Eze"));
    }

    #[tokio::test]
    async fn test_export_invitations_reads_back() {
        let (mut registry, _) = registry(None);
        registry.set("Table 2", upload("t2.pdf")).await.unwrap();

        let json = registry.export_invitations().unwrap();
        let parsed = crate::services::sources::parse_invitations_json(json.as_bytes()).unwrap();
        assert_eq!(&parsed, registry.invitations());
    }

    #[test]
    fn test_mutations_without_runtime_stay_in_memory() {
        let (mut registry, _) = registry(None);
        assert!(registry.mark_downloaded("Walk In"));
        assert_eq!(registry.unmark_all(), 1);
        registry.clear_all();
        assert!(registry.guests().is_empty());
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("Table 2", "Table 10"), Ordering::Less);
        assert_eq!(natural_cmp("table 3", "Table 3"), Ordering::Greater);
        assert_eq!(natural_cmp("Table 02", "Table 2"), Ordering::Less);
        assert_eq!(natural_cmp("Table", "Table 1"), Ordering::Less);
        assert_eq!(natural_cmp("VIP", "Table 1"), Ordering::Greater);
    }
}
