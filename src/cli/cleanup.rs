//! Cleanup command handler

use clap::Args;

use crate::display::format_cleanup_summary;
use crate::error::AuditResult;
use crate::query::parse_action_type;
use crate::retention::CleanupOptions;
use crate::trail::AuditTrail;

/// Arguments for the cleanup command
#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Show what would be deleted without actually deleting
    #[arg(long)]
    pub dry_run: bool,

    /// Override default retention period (in days)
    #[arg(long)]
    pub days: Option<u32>,

    /// Number of records to delete in each batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Clean up only a specific action type
    #[arg(long)]
    pub action_type: Option<String>,
}

/// Run a cleanup pass and print the summary
pub fn handle_cleanup_command(trail: &AuditTrail, args: CleanupArgs) -> AuditResult<()> {
    let action_type = match &args.action_type {
        Some(raw) => Some(parse_action_type(raw)?),
        None => None,
    };

    if let Some(action) = action_type {
        println!("Cleaning up records for action type: {}", action);
    }

    let options = CleanupOptions {
        dry_run: args.dry_run,
        batch_size: args
            .batch_size
            .unwrap_or(trail.settings().cleanup_batch_size),
        action_type,
        override_days: args.days,
    };

    let summary = trail.cleanup().run(&options)?;
    print!(
        "{}",
        format_cleanup_summary(&summary, trail.cleanup().policy().settings())
    );

    Ok(())
}
