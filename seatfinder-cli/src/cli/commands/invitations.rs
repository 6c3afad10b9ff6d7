//! Invitation upload and the one-time guest download

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::*;

use crate::cli::AppContext;
use crate::directory::{AssetRef, Guest};
use crate::services::InvitationRegistry;
use crate::services::invitations::AssetUpload;

pub async fn set(ctx: &mut AppContext, table: &str, file: &Path, mime: Option<String>) -> Result<()> {
    if ctx.registry.guests_at_table(table).is_empty() {
        log::warn!("No guests are seated at '{}' yet", table);
    }

    let upload = AssetUpload::from_path(file, mime).await?;
    let invitation = ctx.registry.set(table, upload).await?;
    println!(
        "{} {} ({}) attached to {}",
        "✓".green(),
        invitation.display_name.bold(),
        invitation.asset_kind,
        table.cyan()
    );
    Ok(())
}

pub fn remove(ctx: &mut AppContext, table: &str) -> Result<()> {
    if ctx.registry.remove(table) {
        println!("{} Invitation removed from {}", "✓".green(), table.cyan());
    } else {
        println!("{}", format!("{} has no uploaded invitation.", table).yellow());
    }
    Ok(())
}

pub fn show(ctx: &AppContext, table: &str) -> Result<()> {
    let Some(invitation) = ctx.registry.get_for_table(table) else {
        println!("{}", format!("{} has no invitation.", table).yellow());
        return Ok(());
    };

    let location = match &invitation.asset_ref {
        AssetRef::DataUrl(_) => "stored inline".to_string(),
        AssetRef::Url(url) => url.clone(),
        AssetRef::Path(path) => path.clone(),
    };
    println!("Table:    {}", invitation.table.bold());
    println!("File:     {}", invitation.display_name);
    println!("Kind:     {}", invitation.asset_kind);
    if let Some(mime) = &invitation.mime_type {
        println!("MIME:     {}", mime);
    }
    println!("Location: {}", location.dimmed());
    println!("Updated:  {}", invitation.uploaded_at.format("%Y-%m-%d %H:%M UTC"));
    Ok(())
}

/// Write uploaded invitations as JSON for use as a bundled invitations file
pub async fn export(ctx: &AppContext, path: &Path) -> Result<()> {
    let json = ctx.registry.export_invitations()?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "{} Exported {} invitations to {}",
        "✓".green(),
        ctx.registry.invitations().len(),
        path.display()
    );
    Ok(())
}

/// Write the guest's table invitation to `out` and mark it as taken
///
/// Refuses once the guest has already downloaded.
pub async fn download(ctx: &mut AppContext, name: &str, table: Option<&str>, out: &Path) -> Result<()> {
    let guest = resolve_guest(&ctx.registry, name, table)?;
    if guest.downloaded {
        bail!(
            "{} has already downloaded the invitation. Ask an organiser to reset it.",
            guest.name
        );
    }

    let invitation = ctx
        .registry
        .get_for_table(&guest.table)
        .cloned()
        .with_context(|| format!("No invitation is available for {} yet", guest.table))?;

    let bytes = ctx.registry.load_asset(&invitation).await?;

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;
    let file_name = Path::new(&invitation.display_name)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "invitation".into());
    let target = out.join(file_name);
    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("Failed to write invitation: {}", target.display()))?;

    ctx.registry.mark_downloaded_at(&guest.name, &guest.table);
    println!(
        "{} {}, you are seated at {}. Invitation saved to {}",
        "✓".green(),
        guest.name.bold(),
        guest.table.cyan(),
        target.display()
    );
    Ok(())
}

/// Exact name first, then a single unambiguous match, optionally at `table`
fn resolve_guest(registry: &InvitationRegistry, name: &str, table: Option<&str>) -> Result<Guest> {
    let at_table = |guest: &Guest| table.is_none_or(|t| guest.table == t);

    let exact: Vec<&Guest> = registry
        .guests_named(name)
        .into_iter()
        .filter(|g| at_table(g))
        .collect();
    match exact.as_slice() {
        [] => {}
        [only] => return Ok((*only).clone()),
        many => bail!(
            "'{}' is seated at several tables: {}. Pick one with --table.",
            name,
            many.iter().map(|g| g.table.as_str()).collect::<Vec<_>>().join(", ")
        ),
    }

    let matches: Vec<Guest> = registry.search(name).into_iter().filter(|g| at_table(g)).collect();
    match matches.as_slice() {
        [] => bail!("We could not find '{}' in the guest list", name.trim()),
        [only] => Ok(only.clone()),
        many => bail!(
            "'{}' matches {} guests: {}. Please use the full name.",
            name.trim(),
            many.len(),
            many.iter()
                .map(|g| format!("{} ({})", g.name, g.table))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
