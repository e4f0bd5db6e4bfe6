//! Query command handlers

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use crate::display::{format_record_detail, format_record_list};
use crate::error::{AuditError, AuditResult};
use crate::models::RecordId;
use crate::query::{
    parse_action_type, parse_actor_id, parse_entity_id, parse_entity_kind, parse_workspace_id,
    RecordFilter,
};
use crate::trail::AuditTrail;

/// Query subcommands
#[derive(Debug, Subcommand)]
pub enum QueryCommands {
    /// List records matching the given filters
    List(ListArgs),
    /// Show one record in full
    Show {
        /// Record ID
        record_id: String,
    },
    /// Find records describing a specific field transition
    FieldChange {
        /// Field name captured in the diff
        field: String,
        /// Constrain to a specific old value
        #[arg(long)]
        old: Option<String>,
        /// Constrain to a specific new value
        #[arg(long)]
        new: Option<String>,
    },
}

/// Filters for the list subcommand, all optional and combinable
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by actor ID
    #[arg(long)]
    pub actor: Option<String>,

    /// Filter by action type (repeatable)
    #[arg(long = "action-type")]
    pub action_types: Vec<String>,

    /// Filter by target entity type (repeatable)
    #[arg(long = "entity-type")]
    pub entity_types: Vec<String>,

    /// Filter by a single target entity ID
    #[arg(long)]
    pub entity_id: Option<String>,

    /// Filter by workspace ID
    #[arg(long)]
    pub workspace: Option<String>,

    /// Start of timestamp range (RFC 3339, inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// End of timestamp range (RFC 3339, inclusive)
    #[arg(long)]
    pub to: Option<String>,

    /// Free-text search over metadata, actor identity, and action labels
    #[arg(long)]
    pub search: Option<String>,

    /// Only security-related actions
    #[arg(long)]
    pub security_only: bool,

    /// Only policy-designated critical actions
    #[arg(long)]
    pub critical_only: bool,

    /// Exclude system actions (records with no actor)
    #[arg(long)]
    pub exclude_system: bool,

    /// Oldest first instead of newest first
    #[arg(long)]
    pub ascending: bool,

    /// Maximum number of records to show
    #[arg(long, default_value = "50")]
    pub limit: usize,
}

/// Dispatch a query subcommand
pub fn handle_query_command(trail: &AuditTrail, command: QueryCommands) -> AuditResult<()> {
    match command {
        QueryCommands::List(args) => {
            let filter = build_filter(args)?;
            let records = trail.selector().records(&filter)?;
            print!("{}", format_record_list(&records));
        }
        QueryCommands::Show { record_id } => {
            let id: RecordId = record_id
                .parse()
                .map_err(|_| AuditError::InvalidQuery(format!("malformed record id: {}", record_id)))?;
            match trail.store().get(id)? {
                Some(record) => print!("{}", format_record_detail(&record)),
                None => return Err(AuditError::record_not_found(record_id)),
            }
        }
        QueryCommands::FieldChange { field, old, new } => {
            let records = trail
                .selector()
                .field_transitions(&field, old.as_deref(), new.as_deref())?;
            print!("{}", format_record_list(&records));
        }
    }
    Ok(())
}

fn build_filter(args: ListArgs) -> AuditResult<RecordFilter> {
    let mut filter = RecordFilter::new();

    if let Some(actor) = &args.actor {
        filter = filter.actor(parse_actor_id(actor)?);
    }
    for raw in &args.action_types {
        filter = filter.action_type(parse_action_type(raw)?);
    }
    for raw in &args.entity_types {
        filter = filter.entity_kind(parse_entity_kind(raw)?);
    }
    if let Some(entity_id) = &args.entity_id {
        filter = filter.entity_id(parse_entity_id(entity_id)?);
    }
    if let Some(workspace) = &args.workspace {
        filter = filter.workspace(parse_workspace_id(workspace)?);
    }

    let start = parse_timestamp(args.from.as_deref())?;
    let end = parse_timestamp(args.to.as_deref())?;
    filter = filter.between(start, end);

    if let Some(search) = args.search {
        filter = filter.search(search);
    }
    if args.security_only {
        filter = filter.security_related_only();
    }
    if args.critical_only {
        filter = filter.critical_only();
    }
    if args.exclude_system {
        filter = filter.exclude_system_actions();
    }
    if args.ascending {
        filter = filter.ascending();
    }

    Ok(filter.limit(args.limit))
}

fn parse_timestamp(raw: Option<&str>) -> AuditResult<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| AuditError::InvalidQuery(format!("malformed timestamp: {}", raw))),
    }
}
