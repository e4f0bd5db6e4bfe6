use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trailkeeper::cli::{handle_cleanup_command, handle_query_command, CleanupArgs, QueryCommands};
use trailkeeper::config::{AuditSettings, TrailPaths};
use trailkeeper::context::InMemoryDirectory;
use trailkeeper::trail::AuditTrail;

#[derive(Parser)]
#[command(
    name = "trailkeeper",
    author = "Kaylee Beyene",
    version,
    about = "Audit-trail engine for multi-tenant business applications",
    long_about = "Trailkeeper durably records who did what, to which entity, when, \
                  and with what contextual detail. This CLI is the operator surface: \
                  query the record store, inspect the capture registry, and run \
                  retention cleanup."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete (or preview deleting) records past their retention window
    Cleanup(CleanupArgs),

    /// Query the audit record store
    #[command(subcommand)]
    Query(QueryCommands),

    /// List the registered entity kinds and their tracked fields
    Registry,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("trailkeeper=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = TrailPaths::new()?;
    let settings = AuditSettings::load_or_create(&paths)?;

    // The operator CLI runs outside any business application, so there is
    // no tenant directory to consult; records already carry their scoping.
    let trail = AuditTrail::open(&paths, settings, Arc::new(InMemoryDirectory::new()))?;

    match cli.command {
        Some(Commands::Cleanup(args)) => {
            handle_cleanup_command(&trail, args)?;
        }
        Some(Commands::Query(cmd)) => {
            handle_query_command(&trail, cmd)?;
        }
        Some(Commands::Registry) => {
            let registry = trail.capture().registry();
            println!("Registered entity kinds");
            println!("=======================");
            for kind in registry.registered_kinds() {
                if let Some(config) = registry.config(kind) {
                    println!("{}", kind);
                    println!("  created action: {}", config.actions.created);
                    if let Some(updated) = config.actions.updated {
                        println!("  updated action: {}", updated);
                    }
                    if let Some(deleted) = config.actions.deleted {
                        println!("  deleted action: {}", deleted);
                    }
                    if let Some(status_changed) = config.actions.status_changed {
                        println!("  status action:  {}", status_changed);
                    }
                    println!("  tracked fields: {}", config.tracked_fields.join(", "));
                }
            }
        }
        Some(Commands::Config) => {
            let settings = trail.settings();
            println!("Trailkeeper Configuration");
            println!("=========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Record log:     {}", paths.records_file().display());
            println!();
            println!("Settings:");
            println!("  Max metadata size:        {}", settings.max_metadata_size);
            println!(
                "  Bulk operation threshold: {}",
                settings.bulk_operation_threshold
            );
            println!("  Bulk sample size:         {}", settings.bulk_sample_size);
            println!("  Cleanup batch size:       {}", settings.cleanup_batch_size);
            println!("Retention windows (days):");
            println!(
                "  Authentication: {}",
                settings.retention.authentication_days
            );
            println!("  Default:        {}", settings.retention.default_days);
            println!("  Critical:       {}", settings.retention.critical_days);
        }
        None => {
            println!("Trailkeeper - Audit-trail engine for multi-tenant applications");
            println!();
            println!("Run 'trailkeeper --help' for usage information.");
            println!("Run 'trailkeeper query list' to see recent audit records.");
        }
    }

    Ok(())
}
