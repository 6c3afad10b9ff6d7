//! Wiring of config, stores and the registry for one CLI invocation

use std::sync::Arc;

use anyhow::Result;

use crate::api::SupabaseStore;
use crate::config::Config;
use crate::config::repository::{GuestCache, SqliteStore};
use crate::services::invitations::{InlineAssetStore, InvitationRegistry, Persistence};
use crate::services::sources::{RemoteStore, SourceReconciler, source_from_config};

pub struct AppContext {
    pub config: Config,
    pub registry: InvitationRegistry,
}

impl AppContext {
    pub async fn init(config: Config) -> Result<Self> {
        let cache_path = config.cache.resolved_path();
        log::debug!("Using cache database {}", cache_path.display());
        let cache = GuestCache::new(Arc::new(SqliteStore::open_file(&cache_path).await?));

        let remote = SupabaseStore::from_config(&config.remote)
            .map(|store| Arc::new(store) as Arc<dyn RemoteStore>);

        let mut reconciler = SourceReconciler::new(cache.clone());
        if let Some(remote) = &remote {
            reconciler = reconciler.with_remote(remote.clone());
        }
        if let Some(source) = source_from_config(&config.bundled) {
            reconciler = reconciler.with_bundled(source, config.bundled.candidates.clone());
            if !config.bundled.invitations_file.trim().is_empty() {
                reconciler = reconciler.with_invitations_file(config.bundled.invitations_file.clone());
            }
        }

        let registry = InvitationRegistry::load(
            &reconciler,
            Arc::new(InlineAssetStore::new()),
            Persistence::new(cache, remote),
            &config.bundled.invitation_dir,
        )
        .await;

        log::info!(
            "Loaded {} guests from {}",
            registry.guests().len(),
            registry.source()
        );

        Ok(Self { config, registry })
    }
}
