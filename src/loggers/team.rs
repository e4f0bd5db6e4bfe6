//! Team domain logger

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::dispatch::guard;
use crate::error::AuditResult;
use crate::models::{ActionType, Actor, AuditedEntity};

use super::metadata::{
    crud_action_metadata, entity_metadata, extra_str, user_action_metadata, RequestContext,
};
use super::{lookup_action, LoggerCore};

const SUPPORTED_ACTIONS: [(&str, ActionType); 3] = [
    ("create", ActionType::TeamCreated),
    ("update", ActionType::TeamUpdated),
    ("delete", ActionType::TeamDeleted),
];

const MEMBER_ACTIONS: [(&str, ActionType); 3] = [
    ("add", ActionType::TeamMemberAdded),
    ("remove", ActionType::TeamMemberRemoved),
    ("role_change", ActionType::TeamMemberRoleChanged),
];

/// Audit logger for team-related operations
pub struct TeamLogger {
    core: Arc<LoggerCore>,
}

impl TeamLogger {
    pub(crate) fn new(core: Arc<LoggerCore>) -> Self {
        Self { core }
    }

    pub fn supported_actions(&self) -> &'static [(&'static str, ActionType)] {
        &SUPPORTED_ACTIONS
    }

    /// Log team lifecycle actions
    pub fn log_team_action(
        &self,
        actor: Option<&Actor>,
        team: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("team_logger.log_team_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("team_logger", &SUPPORTED_ACTIONS, action)
            else {
                return Ok(None);
            };

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

            let mut meta = self.core.base(action, request, extra);
            meta.extend(entity_metadata(team));
            if let Some(description) = team.tracked_value("description") {
                meta.insert("team_description".into(), description);
            }
            meta.extend(crud_action_metadata(
                actor,
                action,
                &updated_fields,
                soft_delete,
            ));

            self.core.submit(Some(actor), action_type, Some(team), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log team membership changes
    pub fn log_team_member_action(
        &self,
        actor: Option<&Actor>,
        member: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("team_logger.log_team_member_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("team_logger", &MEMBER_ACTIONS, action) else {
                return Ok(None);
            };

            let mut meta = self.core.base(action, request, extra.clone());
            meta.extend(entity_metadata(member));
            if let Some(role) = member.tracked_value("role") {
                meta.insert("member_role".into(), role);
            }

            match action {
                "add" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "added_by",
                        Some("addition_timestamp"),
                    ));
                    meta.insert(
                        "assigned_role".into(),
                        json!(extra_str(&extra, "role", "")),
                    );
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
                "role_change" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "changed_by",
                        Some("role_change_timestamp"),
                    ));
                    meta.insert(
                        "previous_role".into(),
                        json!(extra_str(&extra, "previous_role", "")),
                    );
                    meta.insert("new_role".into(), json!(extra_str(&extra, "new_role", "")));
                    meta.insert(
                        "role_change_reason".into(),
                        json!(extra_str(&extra, "reason", "")),
                    );
                }
                _ => {}
            }

            self.core
                .submit(Some(actor), action_type, Some(member), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }
}
