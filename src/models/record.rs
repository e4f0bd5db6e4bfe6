//! Audit record data structures
//!
//! Defines the single append-only entity the engine persists. Records are
//! immutable after creation; the only sanctioned mutation is nulling the
//! actor reference when the referenced principal is deleted upstream.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::action::ActionType;
use super::actor::ActorRef;
use super::entity::EntityRef;
use super::ids::{OrganizationId, RecordId, WorkspaceId};

/// Metadata fields surfaced by [`AuditRecord::details`], in display order
const IMPORTANT_FIELDS: [&str; 9] = [
    "status",
    "amount",
    "title",
    "name",
    "email",
    "username",
    "entity_type",
    "operation_type",
    "reason",
];

/// A single audit record
///
/// Describes who did what, to which entity, when, and with what contextual
/// detail. The organization/workspace references are denormalized by the
/// Context Resolver so tenant-scoped queries need no joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Globally unique identifier, generated at creation
    pub id: RecordId,

    /// The acting principal; `None` for system-initiated events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorRef>,

    /// What happened
    pub action_type: ActionType,

    /// Polymorphic reference to the affected entity, if any
    #[serde(flatten)]
    pub target: Option<EntityRef>,

    /// Denormalized tenant scoping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceId>,

    /// When the record was created (UTC), set exactly once
    pub timestamp: DateTime<Utc>,

    /// Open, semi-structured payload: field diffs, workflow notes, request
    /// context, export parameters
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AuditRecord {
    /// Create a new record with a fresh id and the current timestamp
    pub fn new(
        action_type: ActionType,
        actor: Option<ActorRef>,
        target: Option<EntityRef>,
        organization: Option<OrganizationId>,
        workspace: Option<WorkspaceId>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            actor,
            action_type,
            target,
            organization,
            workspace,
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Whether this record predates the given retention window
    pub fn is_expired(&self, window_days: u32, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::days(i64::from(window_days));
        self.timestamp < cutoff
    }

    /// Generate simple human-readable details from metadata
    pub fn details(&self) -> String {
        if self.metadata.is_empty() {
            return "No details provided.".to_string();
        }

        // Status transitions get a dedicated rendering
        if let (Some(old), Some(new)) = (
            self.metadata.get("old_status"),
            self.metadata.get("new_status"),
        ) {
            return format!("Status: {} -> {}", display_value(old), display_value(new));
        }

        let mut details = Vec::new();
        for field in IMPORTANT_FIELDS {
            if let Some(value) = self.metadata.get(field) {
                if value.is_null() {
                    continue;
                }
                let mut text = display_value(value);
                if text.is_empty() {
                    continue;
                }
                if text.len() > 50 {
                    text.truncate(50);
                }
                details.push(format!("{}: {}", title_case(field), text));
            }
        }

        if details.is_empty() {
            "Action completed".to_string()
        } else {
            details.join("; ")
        }
    }
}

/// Render a metadata value without JSON string quoting
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `operation_type` -> `Operation Type`
fn title_case(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
