//! Read-only lookups over the loaded directory

use anyhow::Result;
use colored::*;

use crate::cli::AppContext;
use crate::directory::Guest;
use crate::services::InvitationRegistry;
use crate::services::matching::match_guests_detailed;

pub fn list(ctx: &AppContext) -> Result<()> {
    let registry = &ctx.registry;
    if registry.guests().is_empty() {
        println!("{}", "No guests loaded yet. Import a spreadsheet first.".yellow());
        return Ok(());
    }

    println!(
        "{} guests from {}",
        registry.guests().len().to_string().bold(),
        registry.source().to_string().cyan()
    );
    for guest in registry.guests() {
        print_guest(registry, guest);
    }
    Ok(())
}

pub fn tables(ctx: &AppContext) -> Result<()> {
    let registry = &ctx.registry;
    let tables = registry.tables();
    if tables.is_empty() {
        println!("{}", "No tables yet.".yellow());
        return Ok(());
    }

    for summary in tables {
        let invitation = match registry.get_for_table(&summary.name) {
            Some(invitation) => invitation.display_name.green(),
            None => "no invitation".dimmed(),
        };
        println!(
            "{} {:>4}  {}",
            format!("{:<24}", summary.name).bold(),
            summary.count,
            invitation
        );
    }
    Ok(())
}

pub fn find(ctx: &AppContext, query: &str) -> Result<()> {
    let registry = &ctx.registry;
    let matches = match_guests_detailed(registry.guests(), query);
    if matches.is_empty() {
        println!(
            "{}",
            format!("We could not find '{}'. Try your full name as written on the invitation.", query.trim()).yellow()
        );
        return Ok(());
    }

    for m in matches {
        if let Some(guest) = m.guest(registry.guests()) {
            print!("{} ", m.match_type.label().dimmed());
            print_guest(registry, guest);
        }
    }
    Ok(())
}

pub fn table(ctx: &AppContext, table: &str) -> Result<()> {
    let registry = &ctx.registry;
    let guests = registry.guests_at_table(table);
    if guests.is_empty() {
        anyhow::bail!("No guests are seated at '{}'", table);
    }

    println!("{} ({} guests)", table.bold(), guests.len());
    for guest in guests {
        let marker = if guest.downloaded { "✓".green() } else { " ".normal() };
        println!("  {} {}", marker, guest.name);
    }
    match registry.get_for_table(table) {
        Some(invitation) => println!("Invitation: {}", invitation.display_name.green()),
        None => println!("Invitation: {}", "none".dimmed()),
    }
    Ok(())
}

fn print_guest(registry: &InvitationRegistry, guest: &Guest) {
    let status = if guest.downloaded {
        "downloaded".dimmed()
    } else if registry.get_for_table(&guest.table).is_some() {
        "invitation ready".green()
    } else {
        "".normal()
    };
    println!("{} → {} {}", guest.name.bold(), guest.table.cyan(), status);
}
