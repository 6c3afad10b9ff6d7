//! Core records of the guest directory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Table label given to guests read before any table marker
pub const UNASSIGNED_TABLE: &str = "Unassigned";

/// One decoded spreadsheet line: stringified, trimmed cell values in column order
pub type RawRow = Vec<String>;

/// A guest entry in the directory
///
/// Entries are positional: two guests with the same name and table are
/// still two separate rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    /// Name as typed in the spreadsheet (casing preserved)
    pub name: String,
    /// Table label, or [`UNASSIGNED_TABLE`]
    pub table: String,
    /// Whether this guest already took their invitation
    #[serde(default)]
    pub downloaded: bool,
}

impl Guest {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            name: name.into(),
            table: if table.is_empty() {
                UNASSIGNED_TABLE.to_string()
            } else {
                table
            },
            downloaded: false,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.table == UNASSIGNED_TABLE
    }
}

/// Kind of invitation asset, used to pick how it is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Pdf,
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

impl AssetKind {
    /// Detect the asset kind from a MIME type, falling back to the file extension
    pub fn detect(mime: Option<&str>, file_name: &str) -> Self {
        if let Some(mime) = mime.map(str::trim).filter(|m| !m.is_empty()) {
            let mime = mime.to_ascii_lowercase();
            return if mime.starts_with("image/") {
                AssetKind::Image
            } else if mime == "application/pdf" {
                AssetKind::Pdf
            } else {
                AssetKind::Other
            };
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            AssetKind::Pdf
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            AssetKind::Image
        } else {
            AssetKind::Other
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Pdf => write!(f, "pdf"),
            AssetKind::Other => write!(f, "file"),
        }
    }
}

/// Opaque reference to stored invitation bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AssetRef {
    /// Inline `data:` URL carrying the payload itself
    DataUrl(String),
    /// Anything resolvable over HTTP(S)
    Url(String),
    /// File on the local filesystem
    Path(String),
}

impl AssetRef {
    /// String form used when the reference has to travel as a plain URL column
    pub fn as_str(&self) -> &str {
        match self {
            AssetRef::DataUrl(s) | AssetRef::Url(s) | AssetRef::Path(s) => s,
        }
    }

    /// Rebuild a reference from its plain string form
    pub fn from_string(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with("data:") {
            AssetRef::DataUrl(value)
        } else if value.starts_with("http://") || value.starts_with("https://") {
            AssetRef::Url(value)
        } else {
            AssetRef::Path(value)
        }
    }
}

/// Invitation asset attached to a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub table: String,
    pub asset_kind: AssetKind,
    pub asset_ref: AssetRef,
    pub display_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Group of guests sharing one table label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_defaults_to_unassigned() {
        let guest = Guest::new("Amaka Obi", "");
        assert_eq!(guest.table, UNASSIGNED_TABLE);
        assert!(guest.is_unassigned());
        assert!(!guest.downloaded);
    }

    #[test]
    fn test_guest_cache_format_without_downloaded() {
        let guests: Vec<Guest> =
            serde_json::from_str(r#"[{"name":"Tunde Bello","table":"Table 2"}]"#).unwrap();
        assert_eq!(guests, vec![Guest::new("Tunde Bello", "Table 2")]);
    }

    #[test]
    fn test_asset_kind_prefers_mime() {
        assert_eq!(AssetKind::detect(Some("image/png"), "card.pdf"), AssetKind::Image);
        assert_eq!(AssetKind::detect(Some("application/pdf"), "card.png"), AssetKind::Pdf);
        assert_eq!(AssetKind::detect(Some("text/plain"), "card.png"), AssetKind::Other);
    }

    #[test]
    fn test_asset_kind_from_extension() {
        assert_eq!(AssetKind::detect(None, "Table 1.PDF"), AssetKind::Pdf);
        assert_eq!(AssetKind::detect(Some("  "), "card.jpeg"), AssetKind::Image);
        assert_eq!(AssetKind::detect(None, "card.docx"), AssetKind::Other);
        assert_eq!(AssetKind::detect(None, "no-extension"), AssetKind::Other);
    }

    #[test]
    fn test_asset_ref_from_string() {
        assert!(matches!(AssetRef::from_string("data:image/png;base64,AA=="), AssetRef::DataUrl(_)));
        assert!(matches!(AssetRef::from_string("https://cdn.example/t1.pdf"), AssetRef::Url(_)));
        assert!(matches!(AssetRef::from_string("invitations/t1.pdf"), AssetRef::Path(_)));
    }
}
