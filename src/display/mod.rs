//! Display formatting for terminal output
//!
//! Formats audit records and cleanup summaries for table and detail views.

use crate::config::RetentionSettings;
use crate::models::AuditRecord;
use crate::retention::CleanupSummary;

/// Format a list of audit records as a table
pub fn format_record_list(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let action_width = records
        .iter()
        .map(|r| r.action_type.as_str().len())
        .max()
        .unwrap_or(6)
        .max(6);

    let actor_width = records
        .iter()
        .map(|r| actor_column(r).len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<20}  {:<action_width$}  {:<actor_width$}  {}\n",
        "Record",
        "Timestamp",
        "Action",
        "Actor",
        "Details",
        action_width = action_width,
        actor_width = actor_width,
    ));

    for record in records {
        let mut details = record.details();
        if details.len() > 60 {
            details.truncate(57);
            details.push_str("...");
        }

        output.push_str(&format!(
            "{:<12}  {:<20}  {:<action_width$}  {:<actor_width$}  {}\n",
            record.id.to_string(),
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.action_type.as_str(),
            actor_column(record),
            details,
            action_width = action_width,
            actor_width = actor_width,
        ));
    }

    output.push_str(&format!("\n{} record(s)\n", records.len()));
    output
}

/// Format a single record with full metadata
pub fn format_record_detail(record: &AuditRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Record:       {}\n", record.id));
    output.push_str(&format!(
        "Timestamp:    {}\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "Action:       {} ({})\n",
        record.action_type.as_str(),
        record.action_type.label()
    ));
    output.push_str(&format!("Actor:        {}\n", actor_column(record)));

    match &record.target {
        Some(target) => output.push_str(&format!("Target:       {}\n", target)),
        None => output.push_str("Target:       -\n"),
    }

    match record.organization {
        Some(organization) => output.push_str(&format!("Organization: {}\n", organization)),
        None => output.push_str("Organization: -\n"),
    }
    match record.workspace {
        Some(workspace) => output.push_str(&format!("Workspace:    {}\n", workspace)),
        None => output.push_str("Workspace:    -\n"),
    }

    output.push_str("Metadata:\n");
    if record.metadata.is_empty() {
        output.push_str("  (empty)\n");
    } else {
        let pretty = serde_json::to_string_pretty(&record.metadata)
            .unwrap_or_else(|_| "(unserializable)".to_string());
        for line in pretty.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }

    output
}

/// Format a cleanup run summary with the active retention settings
pub fn format_cleanup_summary(summary: &CleanupSummary, retention: &RetentionSettings) -> String {
    let mut output = String::new();

    if summary.dry_run {
        output.push_str("DRY RUN MODE - No records were deleted\n\n");
    }

    if summary.deleted_by_category.is_empty() {
        output.push_str("No expired records found.\n");
    } else {
        for (category, count) in &summary.deleted_by_category {
            output.push_str(&format!("  {}: {}\n", category, count));
        }
    }

    if summary.dry_run {
        output.push_str(&format!(
            "\nDRY RUN SUMMARY: Would delete {} total record(s)\n",
            summary.total
        ));
    } else {
        output.push_str(&format!(
            "\nCLEANUP COMPLETE: Deleted {} total record(s)\n",
            summary.total
        ));
    }

    output.push_str("\nCurrent retention settings:\n");
    output.push_str(&format!("  Default: {} days\n", retention.default_days));
    output.push_str(&format!(
        "  Authentication: {} days\n",
        retention.authentication_days
    ));
    output.push_str(&format!(
        "  Critical actions: {} days\n",
        retention.critical_days
    ));

    output
}

fn actor_column(record: &AuditRecord) -> String {
    match &record.actor {
        Some(actor) => actor.email.clone(),
        None => "system".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, RetentionCategory};
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn sample_record() -> AuditRecord {
        AuditRecord::new(ActionType::EntryCreated, None, None, None, None, Map::new())
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_record_list(&[]), "No audit records found.");
    }

    #[test]
    fn test_list_contains_action_and_count() {
        let output = format_record_list(&[sample_record()]);
        assert!(output.contains("entry_created"));
        assert!(output.contains("system"));
        assert!(output.contains("1 record(s)"));
    }

    #[test]
    fn test_detail_contains_label() {
        let output = format_record_detail(&sample_record());
        assert!(output.contains("Entry Created"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_cleanup_summary_dry_run() {
        let mut deleted_by_category = BTreeMap::new();
        deleted_by_category.insert(RetentionCategory::Authentication, 2);
        let summary = CleanupSummary {
            deleted_by_category,
            total: 2,
            dry_run: true,
        };

        let output = format_cleanup_summary(&summary, &RetentionSettings::default());
        assert!(output.contains("DRY RUN MODE"));
        assert!(output.contains("Would delete 2 total record(s)"));
        assert!(output.contains("Authentication: 90 days"));
    }
}
