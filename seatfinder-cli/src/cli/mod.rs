//! Command-line surface for admins and guests

pub mod commands;
pub mod context;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
pub use context::AppContext;

#[derive(Parser)]
#[command(name = "seatfinder")]
#[command(about = "Find your table and collect your invitation")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace the guest list with the contents of a spreadsheet
    Import {
        /// Spreadsheet file (xlsx, xls, xlsb, ods or csv)
        file: PathBuf,
    },
    /// List every guest in directory order
    List,
    /// List tables with guest counts
    Tables,
    /// Look up guests by name
    Find {
        /// Full name, a single name, or part of a name
        query: String,
    },
    /// Show the guests seated at a table
    Table {
        table: String,
    },
    /// Manage table invitations
    #[command(subcommand)]
    Invite(InviteCommands),
    /// Save a guest's invitation and mark it as taken
    Download {
        /// Guest name as listed in the directory
        name: String,
        /// Directory to write the invitation into
        #[arg(long, short, value_name = "DIR", default_value = ".")]
        out: PathBuf,
        /// Table of the guest, when the same name is seated at several tables
        #[arg(long, short)]
        table: Option<String>,
    },
    /// Allow every guest to download their invitation again
    ResetDownloads,
    /// Delete all guests and invitations
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write the guest list to an xlsx file
    Export {
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum InviteCommands {
    /// Attach an invitation file to a table, replacing any previous one
    Set {
        table: String,
        file: PathBuf,
        /// MIME type, guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
    },
    /// Remove the uploaded invitation of a table
    Remove {
        table: String,
    },
    /// Show which invitation a table has
    Show {
        table: String,
    },
    /// Write uploaded invitations to a JSON file usable as a bundled invitations file
    Export {
        path: PathBuf,
    },
}

/// Load configuration and state, then dispatch the command
pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let mut ctx = AppContext::init(config).await?;

    let result = match cli.command {
        Commands::Import { file } => commands::admin::import(&mut ctx, &file).await,
        Commands::List => commands::guests::list(&ctx),
        Commands::Tables => commands::guests::tables(&ctx),
        Commands::Find { query } => commands::guests::find(&ctx, &query),
        Commands::Table { table } => commands::guests::table(&ctx, &table),
        Commands::Invite(InviteCommands::Set { table, file, mime }) => {
            commands::invitations::set(&mut ctx, &table, &file, mime).await
        }
        Commands::Invite(InviteCommands::Remove { table }) => {
            commands::invitations::remove(&mut ctx, &table)
        }
        Commands::Invite(InviteCommands::Show { table }) => {
            commands::invitations::show(&ctx, &table)
        }
        Commands::Invite(InviteCommands::Export { path }) => {
            commands::invitations::export(&ctx, &path).await
        }
        Commands::Download { name, out, table } => {
            commands::invitations::download(&mut ctx, &name, table.as_deref(), &out).await
        }
        Commands::ResetDownloads => commands::admin::reset_downloads(&mut ctx),
        Commands::Clear { yes } => commands::admin::clear(&mut ctx, yes),
        Commands::Export { path } => commands::admin::export(&ctx, &path).await,
    };

    // Writes are best-effort but must land before the process exits
    ctx.registry.flush().await;
    result
}
