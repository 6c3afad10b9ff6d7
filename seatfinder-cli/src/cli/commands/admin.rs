//! Organiser commands: import, export and resets

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use colored::*;

use crate::cli::AppContext;
use crate::directory::{EMPTY_GUEST_LIST_HINT, parse_guest_list};
use crate::directory::excel::write_guest_list;

pub async fn import(ctx: &mut AppContext, file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read guest list: {}", file.display()))?;
    let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned());

    let guests = match parse_guest_list(&bytes, file_name.as_deref()) {
        Ok(guests) => guests,
        Err(e) => {
            log::debug!("Decoding {} failed: {}", file.display(), e);
            return Err(anyhow!(e.user_message()));
        }
    };
    if guests.is_empty() {
        bail!(EMPTY_GUEST_LIST_HINT);
    }

    ctx.registry.replace_guests(guests);
    println!(
        "{} Imported {} guests across {} tables",
        "✓".green(),
        ctx.registry.guests().len().to_string().bold(),
        ctx.registry.tables().len().to_string().bold()
    );
    Ok(())
}

pub fn reset_downloads(ctx: &mut AppContext) -> Result<()> {
    let count = ctx.registry.unmark_all();
    println!("{} Reset {} downloaded invitations", "✓".green(), count);
    Ok(())
}

pub fn clear(ctx: &mut AppContext, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("This deletes every guest and invitation. Re-run with --yes to confirm.");
    }
    ctx.registry.clear_all();
    println!("{} Guest list and invitations cleared", "✓".green());
    Ok(())
}

pub async fn export(ctx: &AppContext, path: &Path) -> Result<()> {
    let bytes = write_guest_list(ctx.registry.guests())?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "{} Exported {} guests to {}",
        "✓".green(),
        ctx.registry.guests().len(),
        path.display()
    );
    Ok(())
}
