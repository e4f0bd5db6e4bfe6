//! Tracked-field snapshots and change diffing
//!
//! Compares before/after values of an entity's tracked fields by value
//! (never identity) and stringifies both sides for safe serialization.
//! Sensitive fields are excluded before any value is read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::AuditSettings;
use crate::models::AuditedEntity;

/// Pre-change state of the tracked fields of one entity instance
pub type Snapshot = BTreeMap<String, Value>;

/// One changed tracked field, with stringified before/after values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Stringify a field value; `null` stays absent rather than `"null"`
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Capture the current value of every tracked, non-sensitive field
///
/// Fields the entity does not expose are simply skipped. When the entity
/// itself is gone (raced with a concurrent delete), callers use an empty
/// snapshot and diffing later finds no changes.
pub fn snapshot(
    entity: &dyn AuditedEntity,
    tracked_fields: &[String],
    settings: &AuditSettings,
) -> Snapshot {
    let mut values = Snapshot::new();
    for field in tracked_fields {
        if settings.is_sensitive_field(field) {
            continue;
        }
        if let Some(value) = entity.tracked_value(field) {
            values.insert(field.clone(), value);
        }
    }
    values
}

/// Diff a pre-change snapshot against the entity's current state
///
/// Only fields present in the snapshot are compared; a field whose value is
/// unchanged produces nothing.
pub fn changes(
    before: &Snapshot,
    entity: &dyn AuditedEntity,
    settings: &AuditSettings,
) -> Vec<FieldChange> {
    let mut changed = Vec::new();
    for (field, old_value) in before {
        if settings.is_sensitive_field(field) {
            continue;
        }
        let new_value = entity.tracked_value(field).unwrap_or(Value::Null);
        if *old_value != new_value {
            changed.push(FieldChange {
                field: field.clone(),
                old_value: stringify(old_value),
                new_value: stringify(&new_value),
            });
        }
    }
    changed
}

/// Current tracked values as metadata entries (for create/delete records)
pub fn current_values(
    entity: &dyn AuditedEntity,
    tracked_fields: &[String],
    settings: &AuditSettings,
) -> Map<String, Value> {
    let mut values = Map::new();
    for field in tracked_fields {
        if settings.is_sensitive_field(field) {
            continue;
        }
        if let Some(value) = entity.tracked_value(field) {
            values.insert(field.clone(), value);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;
    use serde_json::json;
    use std::collections::HashMap;
    use uuid::Uuid;

    struct FieldEntity {
        fields: HashMap<String, Value>,
    }

    impl FieldEntity {
        fn new(pairs: &[(&str, Value)]) -> Self {
            Self {
                fields: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }
        }
    }

    impl AuditedEntity for FieldEntity {
        fn entity_kind(&self) -> EntityKind {
            EntityKind::Entry
        }

        fn entity_uuid(&self) -> Uuid {
            Uuid::nil()
        }

        fn tracked_value(&self, field: &str) -> Option<Value> {
            self.fields.get(field).cloned()
        }
    }

    fn tracked(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_snapshot_reads_tracked_fields() {
        let entity = FieldEntity::new(&[("status", json!("draft")), ("amount", json!("10.00"))]);
        let snap = snapshot(&entity, &tracked(&["status", "amount"]), &AuditSettings::default());

        assert_eq!(snap["status"], json!("draft"));
        assert_eq!(snap["amount"], json!("10.00"));
    }

    #[test]
    fn test_snapshot_skips_missing_fields() {
        let entity = FieldEntity::new(&[("status", json!("draft"))]);
        let snap = snapshot(&entity, &tracked(&["status", "absent"]), &AuditSettings::default());

        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_snapshot_excludes_sensitive_fields() {
        let entity = FieldEntity::new(&[
            ("status", json!("active")),
            ("password_hash", json!("abc123")),
        ]);
        let snap = snapshot(
            &entity,
            &tracked(&["status", "password_hash"]),
            &AuditSettings::default(),
        );

        assert!(snap.contains_key("status"));
        assert!(!snap.contains_key("password_hash"));
    }

    #[test]
    fn test_changes_detects_value_difference() {
        let before_entity = FieldEntity::new(&[("status", json!("draft"))]);
        let snap = snapshot(&before_entity, &tracked(&["status"]), &AuditSettings::default());

        let after_entity = FieldEntity::new(&[("status", json!("submitted"))]);
        let diff = changes(&snap, &after_entity, &AuditSettings::default());

        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].field, "status");
        assert_eq!(diff[0].old_value.as_deref(), Some("draft"));
        assert_eq!(diff[0].new_value.as_deref(), Some("submitted"));
    }

    #[test]
    fn test_no_changes_for_identical_values() {
        let entity = FieldEntity::new(&[("status", json!("draft")), ("amount", json!(100))]);
        let snap = snapshot(&entity, &tracked(&["status", "amount"]), &AuditSettings::default());

        let diff = changes(&snap, &entity, &AuditSettings::default());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_empty_snapshot_finds_no_changes() {
        let entity = FieldEntity::new(&[("status", json!("submitted"))]);
        let diff = changes(&Snapshot::new(), &entity, &AuditSettings::default());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_field_cleared_stringifies_to_none() {
        let before_entity = FieldEntity::new(&[("note", json!("hello"))]);
        let snap = snapshot(&before_entity, &tracked(&["note"]), &AuditSettings::default());

        let after_entity = FieldEntity::new(&[("note", Value::Null)]);
        let diff = changes(&snap, &after_entity, &AuditSettings::default());

        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].old_value.as_deref(), Some("hello"));
        assert_eq!(diff[0].new_value, None);
    }

    #[test]
    fn test_non_string_values_stringified() {
        let before_entity = FieldEntity::new(&[("amount", json!(100))]);
        let snap = snapshot(&before_entity, &tracked(&["amount"]), &AuditSettings::default());

        let after_entity = FieldEntity::new(&[("amount", json!(150))]);
        let diff = changes(&snap, &after_entity, &AuditSettings::default());

        assert_eq!(diff[0].old_value.as_deref(), Some("100"));
        assert_eq!(diff[0].new_value.as_deref(), Some("150"));
    }

    #[test]
    fn test_current_values() {
        let entity = FieldEntity::new(&[
            ("status", json!("active")),
            ("api_token", json!("secret")),
        ]);
        let values = current_values(
            &entity,
            &tracked(&["status", "api_token"]),
            &AuditSettings::default(),
        );

        assert_eq!(values["status"], json!("active"));
        assert!(!values.contains_key("api_token"));
    }
}
