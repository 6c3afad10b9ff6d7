//! Remote store over a Supabase (PostgREST) project
//!
//! Tables:
//! - `guests(id, name, table_name, downloaded)`
//! - `invitations(id, table_name, file_url, file_type, file_name, data_url, updated_at)`

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::directory::{AssetKind, AssetRef, Guest, Invitation, UNASSIGNED_TABLE};
use crate::services::sources::RemoteStore;

pub const GUESTS_TABLE: &str = "guests";
pub const INVITATIONS_TABLE: &str = "invitations";

/// Row shape of the guests table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestRow {
    pub name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub downloaded: bool,
}

impl From<&Guest> for GuestRow {
    fn from(guest: &Guest) -> Self {
        Self {
            name: guest.name.clone(),
            table_name: Some(guest.table.clone()),
            downloaded: guest.downloaded,
        }
    }
}

impl From<GuestRow> for Guest {
    fn from(row: GuestRow) -> Self {
        Guest {
            name: row.name,
            table: row
                .table_name
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNASSIGNED_TABLE.to_string()),
            downloaded: row.downloaded,
        }
    }
}

/// Row shape of the invitations table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationRow {
    pub table_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Invitation> for InvitationRow {
    fn from(invitation: &Invitation) -> Self {
        let data_url = match &invitation.asset_ref {
            AssetRef::DataUrl(url) => Some(url.clone()),
            _ => None,
        };
        Self {
            table_name: invitation.table.clone(),
            file_url: Some(invitation.asset_ref.as_str().to_string()),
            file_type: invitation.mime_type.clone(),
            file_name: Some(invitation.display_name.clone()),
            data_url,
            updated_at: Some(invitation.uploaded_at),
        }
    }
}

impl InvitationRow {
    /// Convert to an invitation; rows without any file reference are skipped
    pub fn into_invitation(self) -> Option<Invitation> {
        let url = self
            .file_url
            .filter(|u| !u.is_empty())
            .or(self.data_url.filter(|u| !u.is_empty()))?;
        let display_name = self.file_name.unwrap_or_else(|| self.table_name.clone());
        let mime_type = self.file_type.filter(|t| !t.is_empty());

        Some(Invitation {
            asset_kind: AssetKind::detect(mime_type.as_deref(), &display_name),
            asset_ref: AssetRef::from_string(url),
            table: self.table_name,
            display_name,
            mime_type,
            uploaded_at: self.updated_at.unwrap_or_else(Utc::now),
        })
    }
}

/// PostgREST client for the guests and invitations tables
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    /// Build a store when both settings are present, `None` otherwise
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Some(Self {
            client: Client::new(),
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            anon_key: config.anon_key.trim().to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", what))?;

        response
            .error_for_status()
            .with_context(|| format!("Remote store rejected: {}", what))
    }

    async fn delete_all(&self, table: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", "neq.0")]);
        self.send(request, &format!("delete all {}", table)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn list_guests(&self) -> Result<Vec<Guest>> {
        let request = self.client.get(self.table_url(GUESTS_TABLE)).query(&[
            ("select", "name,table_name,downloaded"),
            ("order", "table_name.asc,name.asc"),
        ]);
        let rows: Vec<GuestRow> = self
            .send(request, "list guests")
            .await?
            .json()
            .await
            .context("Failed to decode guests")?;

        Ok(rows.into_iter().map(Guest::from).collect())
    }

    async fn list_invitations(&self) -> Result<Vec<Invitation>> {
        let request = self
            .client
            .get(self.table_url(INVITATIONS_TABLE))
            .query(&[("select", "*")]);
        let rows: Vec<InvitationRow> = self
            .send(request, "list invitations")
            .await?
            .json()
            .await
            .context("Failed to decode invitations")?;

        Ok(rows
            .into_iter()
            .filter_map(InvitationRow::into_invitation)
            .collect())
    }

    async fn replace_guests(&self, guests: &[Guest]) -> Result<()> {
        // A failed delete still lets the insert go through
        if let Err(e) = self.delete_all(GUESTS_TABLE).await {
            log::error!("Failed to delete existing guests: {:#}", e);
        }

        if guests.is_empty() {
            return Ok(());
        }

        let rows: Vec<GuestRow> = guests.iter().map(GuestRow::from).collect();
        let request = self.client.post(self.table_url(GUESTS_TABLE)).json(&rows);
        self.send(request, "insert guests").await?;
        Ok(())
    }

    async fn upsert_invitation(&self, invitation: &Invitation) -> Result<()> {
        let row = InvitationRow::from(invitation);
        let request = self
            .client
            .post(self.table_url(INVITATIONS_TABLE))
            .query(&[("on_conflict", "table_name")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row);
        self.send(request, &format!("upsert invitation for {}", invitation.table))
            .await?;
        Ok(())
    }

    async fn delete_invitation(&self, table: &str) -> Result<()> {
        let filter = format!("eq.{}", table);
        let request = self
            .client
            .delete(self.table_url(INVITATIONS_TABLE))
            .query(&[("table_name", filter.as_str())]);
        self.send(request, &format!("delete invitation for {}", table))
            .await?;
        Ok(())
    }

    async fn clear_guests(&self) -> Result<()> {
        self.delete_all(GUESTS_TABLE).await
    }

    async fn clear_invitations(&self) -> Result<()> {
        self.delete_all(INVITATIONS_TABLE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_has_no_store() {
        assert!(SupabaseStore::from_config(&RemoteConfig::default()).is_none());
        let store = SupabaseStore::from_config(&RemoteConfig {
            url: "https://abc.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
        })
        .unwrap();
        assert_eq!(store.table_url(GUESTS_TABLE), "https://abc.supabase.co/rest/v1/guests");
    }

    #[test]
    fn test_guest_row_mapping() {
        let rows: Vec<GuestRow> = serde_json::from_str(
            r#"[{"id":1,"name":"Amaka Obi","table_name":"Table 1"},{"id":2,"name":"Walk In","table_name":null,"downloaded":true}]"#,
        )
        .unwrap();
        let guests: Vec<Guest> = rows.into_iter().map(Guest::from).collect();
        assert_eq!(guests[0], Guest::new("Amaka Obi", "Table 1"));
        assert_eq!(guests[1].table, UNASSIGNED_TABLE);
        assert!(guests[1].downloaded);
    }

    #[test]
    fn test_invitation_row_falls_back_to_data_url() {
        let row: InvitationRow = serde_json::from_str(
            r#"{"table_name":"Table 4","file_url":null,"file_type":"image/png","file_name":"t4.png","data_url":"data:image/png;base64,AA=="}"#,
        )
        .unwrap();
        let invitation = row.into_invitation().unwrap();
        assert_eq!(invitation.asset_kind, AssetKind::Image);
        assert!(matches!(invitation.asset_ref, AssetRef::DataUrl(_)));
        assert_eq!(invitation.display_name, "t4.png");
    }

    #[test]
    fn test_invitation_row_without_file_is_skipped() {
        let row: InvitationRow = serde_json::from_str(r#"{"table_name":"Table 4"}"#).unwrap();
        assert!(row.into_invitation().is_none());
    }
}
