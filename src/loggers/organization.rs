//! Organization domain logger

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
    ("create", ActionType::OrganizationCreated),
    ("update", ActionType::OrganizationUpdated),
    ("delete", ActionType::OrganizationDeleted),
];

const MEMBER_ACTIONS: [(&str, ActionType); 4] = [
    ("add", ActionType::OrganizationMemberAdded),
    ("remove", ActionType::OrganizationMemberRemoved),
    ("role_change", ActionType::OrganizationMemberRoleChanged),
    ("update", ActionType::OrganizationMemberUpdated),
];

/// Audit logger for organization-related operations
pub struct OrganizationLogger {
    core: Arc<LoggerCore>,
}

impl OrganizationLogger {
    pub(crate) fn new(core: Arc<LoggerCore>) -> Self {
        Self { core }
    }

    pub fn supported_actions(&self) -> &'static [(&'static str, ActionType)] {
        &SUPPORTED_ACTIONS
    }

    /// Log organization lifecycle actions initiated from business workflows
    pub fn log_organization_action(
        &self,
        actor: Option<&Actor>,
        organization: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("organization_logger.log_organization_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) =
                lookup_action("organization_logger", &SUPPORTED_ACTIONS, action)
            else {
                return Ok(None);
            };

            let updated_fields = string_list(&extra, "updated_fields");
            let soft_delete = extra
                .get("soft_delete")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let mut meta = self.core.base(action, request, extra);
            meta.extend(entity_metadata(organization));
            if let Some(status) = organization.tracked_value("status") {
                meta.insert("organization_status".into(), status);
            }
            if let Some(description) = organization.tracked_value("description") {
                meta.insert("organization_description".into(), description);
            }
            meta.extend(crud_action_metadata(
                actor,
                action,
                &updated_fields,
                soft_delete,
            ));

            self.core
                .submit(Some(actor), action_type, Some(organization), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log organization membership changes
    pub fn log_member_action(
        &self,
        actor: Option<&Actor>,
        member: &dyn AuditedEntity,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("organization_logger.log_member_action", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("organization_logger", &MEMBER_ACTIONS, action)
            else {
                return Ok(None);
            };

            let mut meta = self.core.base(action, request, extra.clone());
            meta.extend(entity_metadata(member));

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
                "update" => {
                    meta.extend(user_action_metadata(
                        actor,
                        "updater",
                        Some("update_timestamp"),
                    ));
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

/// Read a string list from the extras map
fn string_list(extra: &Map<String, Value>, key: &str) -> Vec<String> {
    extra
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
