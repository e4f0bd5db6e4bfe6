//! Query and selector layer
//!
//! Serves filtered, ordered views over the record store for UI listing and
//! investigative search. Filters are all optional and independently
//! combinable; unmatched filters yield an empty result set, never an
//! error. Only structurally invalid inputs (malformed ids) fail, with
//! `InvalidQuery`.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{AuditError, AuditResult};
use crate::models::{ActionType, ActorId, AuditRecord, EntityKind, WorkspaceId};
use crate::storage::RecordStore;
use uuid::Uuid;

/// Composable filter over audit records
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub actor_id: Option<ActorId>,
    pub action_types: Vec<ActionType>,
    pub entity_kinds: Vec<EntityKind>,
    pub entity_id: Option<Uuid>,
    pub workspace_id: Option<WorkspaceId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub security_related_only: bool,
    pub critical_only: bool,
    pub exclude_system_actions: bool,
    pub ascending: bool,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor_id: ActorId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn action_type(mut self, action_type: ActionType) -> Self {
        self.action_types.push(action_type);
        self
    }

    pub fn entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kinds.push(kind);
        self
    }

    pub fn entity_id(mut self, id: Uuid) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn between(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn security_related_only(mut self) -> Self {
        self.security_related_only = true;
        self
    }

    pub fn critical_only(mut self) -> Self {
        self.critical_only = true;
        self
    }

    pub fn exclude_system_actions(mut self) -> Self {
        self.exclude_system_actions = true;
        self
    }

    /// Override the default timestamp-descending order
    pub fn ascending(mut self) -> Self {
        self.ascending = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(actor_id) = self.actor_id {
            if record.actor.as_ref().map(|a| a.id) != Some(actor_id) {
                return false;
            }
        }

        if !self.action_types.is_empty() && !self.action_types.contains(&record.action_type) {
            return false;
        }

        if !self.entity_kinds.is_empty() {
            match &record.target {
                Some(target) if self.entity_kinds.contains(&target.kind) => {}
                _ => return false,
            }
        }

        if let Some(entity_id) = self.entity_id {
            if record.target.as_ref().map(|t| t.id) != Some(entity_id) {
                return false;
            }
        }

        if let Some(workspace_id) = self.workspace_id {
            if record.workspace != Some(workspace_id) {
                return false;
            }
        }

        if let Some(start) = self.start {
            if record.timestamp < start {
                return false;
            }
        }

        if let Some(end) = self.end {
            if record.timestamp > end {
                return false;
            }
        }

        if self.security_related_only && !record.action_type.is_security_related() {
            return false;
        }

        if self.critical_only && !record.action_type.is_critical() {
            return false;
        }

        if self.exclude_system_actions && record.actor.is_none() {
            return false;
        }

        if let Some(query) = &self.search {
            if !search_matches(record, query) {
                return false;
            }
        }

        true
    }
}

/// Case-insensitive match against metadata content, actor identity, and
/// the action's human-readable label
fn search_matches(record: &AuditRecord, query: &str) -> bool {
    let needle = query.to_lowercase();

    if record.action_type.label().to_lowercase().contains(&needle) {
        return true;
    }

    if let Some(actor) = &record.actor {
        if actor.email.to_lowercase().contains(&needle)
            || actor.username.to_lowercase().contains(&needle)
        {
            return true;
        }
    }

    serde_json::to_string(&record.metadata)
        .map(|serialized| serialized.to_lowercase().contains(&needle))
        .unwrap_or(false)
}

/// Parse an actor id from operator input
pub fn parse_actor_id(input: &str) -> AuditResult<ActorId> {
    input
        .parse()
        .map_err(|_| AuditError::InvalidQuery(format!("malformed actor id: {}", input)))
}

/// Parse a workspace id from operator input
pub fn parse_workspace_id(input: &str) -> AuditResult<WorkspaceId> {
    input
        .parse()
        .map_err(|_| AuditError::InvalidQuery(format!("malformed workspace id: {}", input)))
}

/// Parse a target-entity id from operator input
pub fn parse_entity_id(input: &str) -> AuditResult<Uuid> {
    Uuid::parse_str(input)
        .map_err(|_| AuditError::InvalidQuery(format!("malformed entity id: {}", input)))
}

/// Parse an action type from operator input
pub fn parse_action_type(input: &str) -> AuditResult<ActionType> {
    input
        .parse()
        .map_err(|e: String| AuditError::InvalidQuery(e))
}

/// Parse an entity kind from operator input
pub fn parse_entity_kind(input: &str) -> AuditResult<EntityKind> {
    input
        .parse()
        .map_err(|e: String| AuditError::InvalidQuery(e))
}

/// Read-side selector over the record store
pub struct Selector {
    store: Arc<RecordStore>,
}

impl Selector {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Records matching the filter, timestamp-descending unless overridden
    pub fn records(&self, filter: &RecordFilter) -> AuditResult<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .store
            .all()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();

        records.sort_by(|a, b| {
            let ordering = a
                .timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()));
            if filter.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }

        Ok(records)
    }

    /// Records whose captured diff contains a transition of `field`,
    /// optionally constrained to a specific old and/or new value
    pub fn field_transitions(
        &self,
        field: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> AuditResult<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .store
            .all()?
            .into_iter()
            .filter(|record| has_transition(record, field, old_value, new_value))
            .collect();

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

fn has_transition(
    record: &AuditRecord,
    field: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
) -> bool {
    let Some(changes) = record.metadata.get("changed_fields").and_then(|v| v.as_array()) else {
        return false;
    };

    changes.iter().any(|change| {
        if change.get("field").and_then(|v| v.as_str()) != Some(field) {
            return false;
        }
        if let Some(expected) = old_value {
            if change.get("old_value").and_then(|v| v.as_str()) != Some(expected) {
                return false;
            }
        }
        if let Some(expected) = new_value {
            if change.get("new_value").and_then(|v| v.as_str()) != Some(expected) {
                return false;
            }
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Actor, ActorRef, EntityRef};
    use chrono::Duration;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: Arc<RecordStore>,
        selector: Selector,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::new(temp.path().join("records.jsonl")));
        let selector = Selector::new(Arc::clone(&store));
        Fixture {
            _temp: temp,
            store,
            selector,
        }
    }

    fn record(
        action_type: ActionType,
        actor: Option<ActorRef>,
        target: Option<EntityRef>,
    ) -> AuditRecord {
        AuditRecord::new(action_type, actor, target, None, None, Map::new())
    }

    fn actor_ref(email: &str, username: &str) -> ActorRef {
        Actor::new(ActorId::new(), email, username).reference()
    }

    #[test]
    fn test_empty_filter_returns_everything_descending() {
        let fx = fixture();
        let mut first = record(ActionType::EntryCreated, None, None);
        first.timestamp = Utc::now() - Duration::minutes(2);
        let mut second = record(ActionType::EntryUpdated, None, None);
        second.timestamp = Utc::now() - Duration::minutes(1);
        let first_id = first.id;
        let second_id = second.id;
        fx.store.append(first).unwrap();
        fx.store.append(second).unwrap();

        let records = fx.selector.records(&RecordFilter::new()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second_id);
        assert_eq!(records[1].id, first_id);
    }

    #[test]
    fn test_filter_by_actor() {
        let fx = fixture();
        let actor = actor_ref("a@example.com", "a");
        fx.store
            .append(record(ActionType::EntryCreated, Some(actor.clone()), None))
            .unwrap();
        fx.store
            .append(record(ActionType::EntryCreated, None, None))
            .unwrap();

        let filter = RecordFilter::new().actor(actor.id);
        let records = fx.selector.records(&filter).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_filter_by_action_types() {
        let fx = fixture();
        fx.store
            .append(record(ActionType::EntryCreated, None, None))
            .unwrap();
        fx.store
            .append(record(ActionType::EntryApproved, None, None))
            .unwrap();
        fx.store
            .append(record(ActionType::FileUploaded, None, None))
            .unwrap();

        let filter = RecordFilter::new()
            .action_type(ActionType::EntryCreated)
            .action_type(ActionType::EntryApproved);
        let records = fx.selector.records(&filter).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_filter_by_entity() {
        let fx = fixture();
        let entity = EntityRef::new(EntityKind::Entry, Uuid::new_v4());
        fx.store
            .append(record(ActionType::EntryCreated, None, Some(entity)))
            .unwrap();
        fx.store
            .append(record(
                ActionType::WorkspaceCreated,
                None,
                Some(EntityRef::new(EntityKind::Workspace, Uuid::new_v4())),
            ))
            .unwrap();

        let by_kind = RecordFilter::new().entity_kind(EntityKind::Entry);
        assert_eq!(fx.selector.records(&by_kind).unwrap().len(), 1);

        let by_id = RecordFilter::new().entity_id(entity.id);
        assert_eq!(fx.selector.records(&by_id).unwrap().len(), 1);
    }

    #[test]
    fn test_filter_by_workspace() {
        let fx = fixture();
        let workspace = WorkspaceId::new();
        let mut scoped = record(ActionType::EntryCreated, None, None);
        scoped.workspace = Some(workspace);
        fx.store.append(scoped).unwrap();
        fx.store
            .append(record(ActionType::EntryCreated, None, None))
            .unwrap();

        let filter = RecordFilter::new().workspace(workspace);
        assert_eq!(fx.selector.records(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_timestamp_range_inclusive() {
        let fx = fixture();
        let now = Utc::now();
        let mut old = record(ActionType::EntryCreated, None, None);
        old.timestamp = now - Duration::days(10);
        let mut recent = record(ActionType::EntryCreated, None, None);
        recent.timestamp = now - Duration::days(1);
        let recent_id = recent.id;
        fx.store.append(old).unwrap();
        fx.store.append(recent).unwrap();

        let filter = RecordFilter::new().between(Some(now - Duration::days(5)), Some(now));
        let records = fx.selector.records(&filter).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, recent_id);

        // Inclusive boundary: a record exactly at the start matches
        let boundary = RecordFilter::new().between(Some(records[0].timestamp), None);
        assert_eq!(fx.selector.records(&boundary).unwrap().len(), 1);
    }

    #[test]
    fn test_free_text_search() {
        let fx = fixture();
        let mut with_metadata = record(
            ActionType::EntryUpdated,
            Some(actor_ref("jo@example.com", "jo")),
            None,
        );
        with_metadata
            .metadata
            .insert("reason".into(), json!("Quarterly Compliance Review"));
        fx.store.append(with_metadata).unwrap();
        fx.store
            .append(record(ActionType::FileUploaded, None, None))
            .unwrap();

        // Metadata content
        let by_metadata = RecordFilter::new().search("compliance");
        assert_eq!(fx.selector.records(&by_metadata).unwrap().len(), 1);

        // Actor identity
        let by_actor = RecordFilter::new().search("jo@example.com");
        assert_eq!(fx.selector.records(&by_actor).unwrap().len(), 1);

        // Action label
        let by_label = RecordFilter::new().search("file uploaded");
        assert_eq!(fx.selector.records(&by_label).unwrap().len(), 1);

        // No match is empty, not an error
        let no_match = RecordFilter::new().search("nonexistent");
        assert!(fx.selector.records(&no_match).unwrap().is_empty());
    }

    #[test]
    fn test_security_and_critical_flags() {
        let fx = fixture();
        fx.store
            .append(record(ActionType::LoginFailed, None, None))
            .unwrap();
        fx.store
            .append(record(ActionType::DataExported, None, None))
            .unwrap();
        fx.store
            .append(record(ActionType::EntryCreated, None, None))
            .unwrap();

        let security = fx
            .selector
            .records(&RecordFilter::new().security_related_only())
            .unwrap();
        assert_eq!(security.len(), 1);
        assert_eq!(security[0].action_type, ActionType::LoginFailed);

        let critical = fx
            .selector
            .records(&RecordFilter::new().critical_only())
            .unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].action_type, ActionType::DataExported);
    }

    #[test]
    fn test_exclude_system_actions() {
        let fx = fixture();
        fx.store
            .append(record(
                ActionType::EntryCreated,
                Some(actor_ref("h@example.com", "h")),
                None,
            ))
            .unwrap();
        fx.store
            .append(record(ActionType::LoginFailed, None, None))
            .unwrap();

        let filter = RecordFilter::new().exclude_system_actions();
        let records = fx.selector.records(&filter).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].actor.is_some());
    }

    #[test]
    fn test_field_transitions() {
        let fx = fixture();
        let mut updated = record(ActionType::EntryStatusChanged, None, None);
        updated.metadata.insert(
            "changed_fields".into(),
            json!([{"field": "status", "old_value": "draft", "new_value": "submitted"}]),
        );
        fx.store.append(updated).unwrap();

        let mut other = record(ActionType::EntryUpdated, None, None);
        other.metadata.insert(
            "changed_fields".into(),
            json!([{"field": "amount", "old_value": "10", "new_value": "20"}]),
        );
        fx.store.append(other).unwrap();

        let by_field = fx.selector.field_transitions("status", None, None).unwrap();
        assert_eq!(by_field.len(), 1);

        let exact = fx
            .selector
            .field_transitions("status", Some("draft"), Some("submitted"))
            .unwrap();
        assert_eq!(exact.len(), 1);

        let wrong_target = fx
            .selector
            .field_transitions("status", Some("draft"), Some("approved"))
            .unwrap();
        assert!(wrong_target.is_empty());
    }

    #[test]
    fn test_limit_and_ascending() {
        let fx = fixture();
        let now = Utc::now();
        for i in 0..5 {
            let mut r = record(ActionType::EntryCreated, None, None);
            r.timestamp = now - Duration::minutes(i);
            fx.store.append(r).unwrap();
        }

        let limited = fx
            .selector
            .records(&RecordFilter::new().limit(2))
            .unwrap();
        assert_eq!(limited.len(), 2);

        let ascending = fx
            .selector
            .records(&RecordFilter::new().ascending())
            .unwrap();
        assert!(ascending[0].timestamp < ascending[4].timestamp);
    }

    #[test]
    fn test_malformed_ids_fail_with_invalid_query() {
        assert!(matches!(
            parse_actor_id("not-a-uuid"),
            Err(AuditError::InvalidQuery(_))
        ));
        assert!(matches!(
            parse_entity_id("xyz"),
            Err(AuditError::InvalidQuery(_))
        ));
        assert!(matches!(
            parse_action_type("no_such_action"),
            Err(AuditError::InvalidQuery(_))
        ));
        assert!(parse_workspace_id(&WorkspaceId::new().as_uuid().to_string()).is_ok());
    }
}
