//! Entry domain logger
//!
//! Covers the entry review workflow (submit/review/approve/reject),
//! flagging, and manual update/delete logging with reviewer context.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::dispatch::guard;
use crate::error::AuditResult;
use crate::models::{ActionType, Actor, AuditedEntity};

use super::metadata::{
    base_metadata, entity_metadata, extra_str, user_action_metadata, workflow_metadata,
    RequestContext,
};
use super::{lookup_action, LoggerCore};

const SUPPORTED_ACTIONS: [(&str, ActionType); 8] = [
    ("submit", ActionType::EntrySubmitted),
    ("review", ActionType::EntryReviewed),
    ("approve", ActionType::EntryApproved),
    ("reject", ActionType::EntryRejected),
    ("flag", ActionType::EntryFlagged),
    ("unflag", ActionType::EntryUnflagged),
    ("update", ActionType::EntryUpdated),
    ("delete", ActionType::EntryDeleted),
];

const WORKFLOW_ACTIONS: [(&str, ActionType); 3] = [
    ("submit", ActionType::EntrySubmitted),
    ("approve", ActionType::EntryApproved),
    ("reject", ActionType::EntryRejected),
];

/// Audit logger for entry-related operations
pub struct EntryLogger {
    core: Arc<LoggerCore>,
}

impl EntryLogger {
    pub(crate) fn new(core: Arc<LoggerCore>) -> Self {
        Self { core }
    }

    /// Supported action keywords and their audit action types
    pub fn supported_actions(&self) -> &'static [(&'static str, ActionType)] {
        &SUPPORTED_ACTIONS
    }

    /// Log an entry action with reviewer/flagging context
    pub fn log_entry_action(
        &self,
        actor: Option<&Actor>,
        entry: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("entry_logger.log_entry_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("entry_logger", &SUPPORTED_ACTIONS, action)
            else {
                return Ok(None);
            };

            let mut meta = self.core.base(action, request, extra.clone());
            meta.extend(entity_metadata(entry));
            meta.extend(self.action_specific(actor, action, &extra));

            self.core.submit(Some(actor), action_type, Some(entry), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log a workflow-stage transition (submit/approve/reject)
    pub fn log_entry_workflow_action(
        &self,
        actor: Option<&Actor>,
        entry: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        workflow_stage: Option<&str>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("entry_logger.log_entry_workflow_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("entry_logger", &WORKFLOW_ACTIONS, action) else {
                return Ok(None);
            };

            let notes = extra_str(&extra, "notes", "").to_string();
            let reason = extra_str(&extra, "reason", "").to_string();

            let mut meta = self.core.base(action, request, extra);
            meta.extend(entity_metadata(entry));
            meta.extend(workflow_metadata(
                actor,
                action,
                workflow_stage,
                &notes,
                &reason,
            ));

            self.core.submit(Some(actor), action_type, Some(entry), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log a status transition on any entity
    pub fn log_status_change(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        old_status: &str,
        new_status: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("entry_logger.log_status_change", || {
            let actor = self.core.validate_actor(actor)?;

            let reason = extra_str(&extra, "reason", "").to_string();
            let mut meta = base_metadata(
                "status_change",
                request,
                self.core.settings().max_user_agent_length,
                extra,
            );
            meta.insert("entity_type".into(), json!(entity.entity_kind().as_str()));
            meta.insert("entity_id".into(), json!(entity.entity_uuid().to_string()));
            meta.insert("old_status".into(), json!(old_status));
            meta.insert("new_status".into(), json!(new_status));
            meta.insert("status_change_reason".into(), json!(reason));

            self.core.submit(
                Some(actor),
                ActionType::EntryStatusChanged,
                Some(entity),
                None,
                meta,
            );
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Action-specific metadata families
    fn action_specific(
        &self,
        actor: &Actor,
        action: &str,
        extra: &Map<String, Value>,
    ) -> Map<String, Value> {
        let mut meta = Map::new();
        match action {
            "approve" => {
                meta.extend(user_action_metadata(
                    actor,
                    "approver",
                    Some("approval_timestamp"),
                ));
                meta.insert(
                    "approval_notes".into(),
                    json!(extra_str(extra, "notes", "")),
                );
                meta.insert(
                    "approval_level".into(),
                    json!(extra_str(extra, "level", "standard")),
                );
            }
            "reject" => {
                meta.extend(user_action_metadata(
                    actor,
                    "rejector",
                    Some("rejection_timestamp"),
                ));
                meta.insert(
                    "rejection_reason".into(),
                    json!(extra_str(extra, "reason", "")),
                );
                meta.insert(
                    "rejection_notes".into(),
                    json!(extra_str(extra, "notes", "")),
                );
                meta.insert(
                    "can_resubmit".into(),
                    extra.get("can_resubmit").cloned().unwrap_or(json!(true)),
                );
            }
            "flag" | "unflag" => {
                meta.insert("flag_reason".into(), json!(extra_str(extra, "reason", "")));
                meta.insert("flag_notes".into(), json!(extra_str(extra, "notes", "")));
                meta.insert(
                    "flag_severity".into(),
                    json!(extra_str(extra, "severity", "medium")),
                );
            }
            "update" => {
                meta.extend(user_action_metadata(
                    actor,
                    "updater",
                    Some("update_timestamp"),
                ));
                meta.insert(
                    "updated_fields".into(),
                    extra.get("updated_fields").cloned().unwrap_or(json!([])),
                );
                meta.insert(
                    "update_reason".into(),
                    json!(extra_str(extra, "reason", "")),
                );
            }
            "delete" => {
                meta.extend(user_action_metadata(
                    actor,
                    "deleter",
                    Some("deletion_timestamp"),
                ));
                meta.insert(
                    "deletion_reason".into(),
                    json!(extra_str(extra, "reason", "")),
                );
                meta.insert(
                    "soft_delete".into(),
                    extra.get("soft_delete").cloned().unwrap_or(json!(false)),
                );
                meta.insert(
                    "entry_status_at_deletion".into(),
                    json!(extra_str(extra, "entry_status", "unknown")),
                );
            }
            _ => {}
        }
        meta
    }
}
