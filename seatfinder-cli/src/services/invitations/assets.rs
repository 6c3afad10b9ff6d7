//! Storage for invitation files

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;

use crate::directory::{AssetKind, AssetRef};

const DEFAULT_MIME: &str = "application/octet-stream";

/// An uploaded invitation file before it is stored
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn kind(&self) -> AssetKind {
        AssetKind::detect(self.mime_type.as_deref(), &self.file_name)
    }

    /// Read a local file, guessing the MIME type from its extension
    pub async fn from_path(path: &std::path::Path, mime_type: Option<String>) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read invitation file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_type.or_else(|| mime_from_extension(&file_name).map(str::to_string));

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

/// Well-known MIME type for an invitation file name
pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Turns uploads into references and references back into bytes
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(&self, upload: &AssetUpload) -> Result<AssetRef>;
    async fn load(&self, asset_ref: &AssetRef) -> Result<Vec<u8>>;
}

/// Keeps uploads inline as `data:` URLs; resolves URLs and paths on demand
#[derive(Debug, Clone, Default)]
pub struct InlineAssetStore {
    client: Client,
}

impl InlineAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Encode bytes as a base64 `data:` URL
pub fn to_data_url(mime_type: Option<&str>, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type.filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MIME),
        STANDARD.encode(bytes)
    )
}

/// Decode a base64 `data:` URL back into bytes
pub fn from_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url.strip_prefix("data:").context("Not a data URL")?;
    let (meta, payload) = rest.split_once(',').context("Data URL has no payload")?;
    if !meta.ends_with(";base64") {
        bail!("Only base64 data URLs are supported");
    }
    STANDARD
        .decode(payload.trim())
        .context("Data URL payload is not valid base64")
}

#[async_trait]
impl AssetStore for InlineAssetStore {
    async fn store(&self, upload: &AssetUpload) -> Result<AssetRef> {
        if upload.bytes.is_empty() {
            bail!("Invitation file '{}' is empty", upload.file_name);
        }
        Ok(AssetRef::DataUrl(to_data_url(
            upload.mime_type.as_deref(),
            &upload.bytes,
        )))
    }

    async fn load(&self, asset_ref: &AssetRef) -> Result<Vec<u8>> {
        match asset_ref {
            AssetRef::DataUrl(url) => from_data_url(url),
            AssetRef::Path(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read invitation: {}", path)),
            AssetRef::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch invitation: {}", url))?;
                if !response.status().is_success() {
                    bail!("Failed to fetch invitation {}: {}", url, response.status());
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}
