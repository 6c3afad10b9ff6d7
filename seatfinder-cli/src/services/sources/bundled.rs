//! Files shipped alongside the app: the default guest list and per-table invitations

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::config::BundledConfig;
use crate::directory::{AssetKind, AssetRef, Invitation};

/// Extensions tried for a table's bundled invitation, in order
pub const INVITATION_EXTENSIONS: &[&str] = &[".pdf", ".png", ".jpg", ".jpeg"];

/// Read-only access to bundled files by name
#[async_trait]
pub trait BundledSource: Send + Sync {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>>;

    /// Whether `file_name` is present, without reading its body
    async fn exists(&self, file_name: &str) -> bool;

    /// Reference a caller can later resolve to the same bytes
    fn locate(&self, file_name: &str) -> AssetRef;
}

/// Bundled files in a local folder
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BundledSource for DirectorySource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read bundled file: {}", path.display()))
    }

    async fn exists(&self, file_name: &str) -> bool {
        tokio::fs::metadata(self.root.join(file_name))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    fn locate(&self, file_name: &str) -> AssetRef {
        AssetRef::Path(self.root.join(file_name).display().to_string())
    }
}

/// Bundled files served over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of a file, each path segment percent-encoded
    pub fn url_for(&self, file_name: &str) -> String {
        let encoded: Vec<String> = file_name
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }
}

#[async_trait]
impl BundledSource for HttpSource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>> {
        let url = self.url_for(file_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch bundled file: {}", url))?;

        if !response.status().is_success() {
            bail!("Failed to fetch bundled file {}: {}", url, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read bundled file body: {}", url))?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, file_name: &str) -> bool {
        let url = self.url_for(file_name);
        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::trace!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }

    fn locate(&self, file_name: &str) -> AssetRef {
        AssetRef::Url(self.url_for(file_name))
    }
}

/// Pick the bundled source described by config, folder first
pub fn source_from_config(config: &BundledConfig) -> Option<Arc<dyn BundledSource>> {
    if let Some(dir) = &config.data_dir {
        return Some(Arc::new(DirectorySource::new(dir.clone())));
    }
    config
        .base_url
        .as_ref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| Arc::new(HttpSource::new(url.clone())) as Arc<dyn BundledSource>)
}

/// Collapse runs of whitespace in a table label
pub fn normalize_table_name(table: &str) -> String {
    table.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look for `<invitation_dir>/<table><ext>` for each known extension
pub async fn find_bundled_invitation(
    source: &dyn BundledSource,
    invitation_dir: &str,
    table: &str,
) -> Option<Invitation> {
    let normalized = normalize_table_name(table);
    if normalized.is_empty() {
        return None;
    }

    for ext in INVITATION_EXTENSIONS {
        let display_name = format!("{}{}", normalized, ext);
        let file_name = if invitation_dir.is_empty() {
            display_name.clone()
        } else {
            format!("{}/{}", invitation_dir.trim_end_matches('/'), display_name)
        };

        if source.exists(&file_name).await {
            log::debug!("Found bundled invitation for {}: {}", table, file_name);
            return Some(Invitation {
                table: table.to_string(),
                asset_kind: AssetKind::detect(None, &display_name),
                asset_ref: source.locate(&file_name),
                display_name,
                mime_type: None,
                uploaded_at: Utc::now(),
            });
        }
        log::trace!("No bundled invitation at {}", file_name);
    }

    None
}

/// Read a bundled `table -> invitation` JSON map
///
/// A missing or malformed file yields `None`. Each entry is keyed by its
/// map key, whatever its own `table` field says.
pub async fn load_bundled_invitations(
    source: &dyn BundledSource,
    file_name: &str,
) -> Option<BTreeMap<String, Invitation>> {
    let bytes = match source.fetch(file_name).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("No bundled invitations file {}: {:#}", file_name, e);
            return None;
        }
    };

    match parse_invitations_json(&bytes) {
        Ok(invitations) => Some(invitations),
        Err(e) => {
            log::warn!("Bundled invitations file {} unreadable: {:#}", file_name, e);
            None
        }
    }
}

/// Parse an exported invitations map
pub fn parse_invitations_json(bytes: &[u8]) -> Result<BTreeMap<String, Invitation>> {
    let map: BTreeMap<String, Invitation> =
        serde_json::from_slice(bytes).context("Invitations file is not a table -> invitation map")?;
    Ok(map
        .into_iter()
        .map(|(table, mut invitation)| {
            invitation.table = table.clone();
            (table, invitation)
        })
        .collect())
}
