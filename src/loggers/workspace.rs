//! Workspace domain logger
//!
//! Workspace lifecycle and status transitions, plus workspace-team
//! attachment changes.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::dispatch::guard;
use crate::error::AuditResult;
use crate::models::{ActionType, Actor, AuditedEntity};

use super::metadata::{
    crud_action_metadata, entity_metadata, extra_str, user_action_metadata, RequestContext,
};
use super::{lookup_action, LoggerCore};

const SUPPORTED_ACTIONS: [(&str, ActionType); 7] = [
    ("create", ActionType::WorkspaceCreated),
    ("update", ActionType::WorkspaceUpdated),
    ("delete", ActionType::WorkspaceDeleted),
    ("archive", ActionType::WorkspaceArchived),
    ("activate", ActionType::WorkspaceActivated),
    ("close", ActionType::WorkspaceClosed),
    ("status_change", ActionType::WorkspaceStatusChanged),
];

const TEAM_ACTIONS: [(&str, ActionType); 3] = [
    ("add", ActionType::WorkspaceTeamAdded),
    ("remove", ActionType::WorkspaceTeamRemoved),
    ("remittance_rate_update", ActionType::WorkspaceTeamUpdated),
];

/// Audit logger for workspace-related operations
pub struct WorkspaceLogger {
    core: Arc<LoggerCore>,
}

impl WorkspaceLogger {
    pub(crate) fn new(core: Arc<LoggerCore>) -> Self {
        Self { core }
    }

    pub fn supported_actions(&self) -> &'static [(&'static str, ActionType)] {
        &SUPPORTED_ACTIONS
    }

    /// Log workspace lifecycle and status actions
    pub fn log_workspace_action(
        &self,
        actor: Option<&Actor>,
        workspace: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("workspace_logger.log_workspace_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("workspace_logger", &SUPPORTED_ACTIONS, action)
            else {
                return Ok(None);
            };

            let mut meta = self.core.base(action, request, extra.clone());
            meta.extend(entity_metadata(workspace));
            if let Some(status) = workspace.tracked_value("status") {
                meta.insert("workspace_status".into(), status);
            }

            match action {
                "create" | "update" | "delete" => {
                    let updated_fields: Vec<String> = extra
                        .get("updated_fields")
                        .and_then(Value::as_array)
                        .map(|values| {
                            values
                                .iter()
                                .filter_map(|v| v.as_str().map(String::from))
                                .collect()
                        })
                        .unwrap_or_default();
                    let soft_delete = extra
                        .get("soft_delete")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    meta.extend(crud_action_metadata(
                        actor,
                        action,
                        &updated_fields,
                        soft_delete,
                    ));
                }
                "archive" | "activate" | "close" | "status_change" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "status_changer",
                        Some("status_change_timestamp"),
                    ));
                    meta.insert(
                        "previous_status".into(),
                        json!(extra_str(&extra, "previous_status", "")),
                    );
                    meta.insert(
                        "new_status".into(),
                        json!(extra_str(&extra, "new_status", "")),
                    );
                    meta.insert(
                        "status_change_reason".into(),
                        json!(extra_str(&extra, "reason", "")),
                    );
                }
                _ => {}
            }

            self.core
                .submit(Some(actor), action_type, Some(workspace), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log workspace-team attachment changes
    ///
    /// The workspace-team link itself is the target; the resolver reaches
    /// its workspace through the workspace-team capability.
    pub fn log_workspace_team_action(
        &self,
        actor: Option<&Actor>,
        workspace_team: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("workspace_logger.log_workspace_team_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("workspace_logger", &TEAM_ACTIONS, action)
            else {
                return Ok(None);
            };

            let mut meta = self.core.base(action, request, extra.clone());
            meta.extend(entity_metadata(workspace_team));

            match action {
                "add" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "added_by",
                        Some("addition_timestamp"),
                    ));
                }
                "remove" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "removed_by",
                        Some("removal_timestamp"),
                    ));
                    meta.insert(
                        "removal_reason".into(),
                        json!(extra_str(&extra, "reason", "")),
                    );
                }
                "remittance_rate_update" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "updated_by",
                        Some("update_timestamp"),
                    ));
                    meta.insert(
                        "previous_rate".into(),
                        json!(extra_str(&extra, "previous_rate", "")),
                    );
                    meta.insert(
                        "new_rate".into(),
                        json!(extra_str(&extra, "new_rate", "")),
                    );
                }
                _ => {}
            }

            self.core
                .submit(Some(actor), action_type, Some(workspace_team), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }
}
