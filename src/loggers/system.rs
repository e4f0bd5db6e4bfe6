//! System domain logger
//!
//! Permissions, bulk operations, data exports, file operations, operation
//! failures, and authentication events. Several of these are entity-less
//! and some (failed logins, system failures) are legitimately actor-less.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::dispatch::guard;
use crate::dispatch::sanitize::iso_timestamp;
use crate::error::AuditResult;
use crate::models::{ActionType, Actor, AuditedEntity, EntityRef};

use super::metadata::{
    extra_str, file_metadata, user_action_metadata, FileInfo, RequestContext,
};
use super::{lookup_action, LoggerCore};

const SUPPORTED_ACTIONS: [(&str, ActionType); 9] = [
    ("permission_grant", ActionType::PermissionGranted),
    ("permission_revoke", ActionType::PermissionRevoked),
    ("permission_change", ActionType::PermissionChanged),
    ("bulk_operation", ActionType::BulkOperationPerformed),
    ("data_export", ActionType::DataExported),
    ("file_upload", ActionType::FileUploaded),
    ("file_download", ActionType::FileDownloaded),
    ("file_delete", ActionType::FileDeleted),
    ("operation_failure", ActionType::OperationFailed),
];

const PERMISSION_ACTIONS: [(&str, ActionType); 3] = [
    ("grant", ActionType::PermissionGranted),
    ("revoke", ActionType::PermissionRevoked),
    ("change", ActionType::PermissionChanged),
];

const FILE_ACTIONS: [(&str, ActionType); 3] = [
    ("upload", ActionType::FileUploaded),
    ("download", ActionType::FileDownloaded),
    ("delete", ActionType::FileDeleted),
];

const AUTH_ACTIONS: [(&str, ActionType); 4] = [
    ("login_success", ActionType::LoginSucceeded),
    ("login_failed", ActionType::LoginFailed),
    ("logout", ActionType::LoggedOut),
    ("password_changed", ActionType::PasswordChanged),
];

/// Audit logger for system-level operations
pub struct SystemLogger {
    core: Arc<LoggerCore>,
}

impl SystemLogger {
    pub(crate) fn new(core: Arc<LoggerCore>) -> Self {
        Self { core }
    }

    pub fn supported_actions(&self) -> &'static [(&'static str, ActionType)] {
        &SUPPORTED_ACTIONS
    }

    /// Log permission changes with grantor and target-user context
    pub fn log_permission_change(
        &self,
        actor: Option<&Actor>,
        target_user: &dyn AuditedEntity,
        permission_type: &str,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("system_logger.log_permission_change", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("system_logger", &PERMISSION_ACTIONS, action)
            else {
                return Ok(None);
            };

            let mut meta = self.core.base(action, request, extra.clone());
            meta.insert("permission_type".into(), json!(permission_type));
            meta.insert(
                "target_user_id".into(),
                json!(target_user.entity_uuid().to_string()),
            );
            let target_email = target_user
                .tracked_value("email")
                .and_then(|v| v.as_str().map(String::from))
                .or_else(|| target_user.display_name());
            if let Some(email) = target_email {
                meta.insert("target_user_email".into(), json!(email));
            }
            meta.extend(user_action_metadata(
                actor,
                "grantor",
                Some("permission_timestamp"),
            ));

            match action {
                "grant" => {
                    meta.insert(
                        "granted_permissions".into(),
                        extra.get("granted_permissions").cloned().unwrap_or(json!([])),
                    );
                    meta.insert("grant_reason".into(), json!(extra_str(&extra, "reason", "")));
                }
                "revoke" => {
                    meta.insert(
                        "revoked_permissions".into(),
                        extra.get("revoked_permissions").cloned().unwrap_or(json!([])),
                    );
                    meta.insert(
                        "revoke_reason".into(),
                        json!(extra_str(&extra, "reason", "")),
                    );
                }
                "change" => {
                    meta.insert(
                        "previous_permissions".into(),
                        extra
                            .get("previous_permissions")
                            .cloned()
                            .unwrap_or(json!([])),
                    );
                    meta.insert(
                        "new_permissions".into(),
                        extra.get("new_permissions").cloned().unwrap_or(json!([])),
                    );
                    meta.insert(
                        "change_reason".into(),
                        json!(extra_str(&extra, "reason", "")),
                    );
                }
                _ => {}
            }

            self.core
                .submit(Some(actor), action_type, Some(target_user), None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log bulk operations, sampling identities above the configured
    /// threshold so metadata stays bounded
    pub fn log_bulk_operation(
        &self,
        actor: Option<&Actor>,
        operation_type: &str,
        affected: &[EntityRef],
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("system_logger.log_bulk_operation", || {
            let actor = self.core.validate_actor(actor)?;

            let mut meta = self.core.base("bulk_operation", request, extra.clone());
            meta.insert("operation_type".into(), json!(operation_type));
            meta.extend(user_action_metadata(
                actor,
                "operator",
                Some("operation_timestamp"),
            ));
            meta.insert("total_affected_count".into(), json!(affected.len()));
            meta.insert(
                "operation_status".into(),
                json!(extra_str(&extra, "status", "completed")),
            );

            let identity = |entity: &EntityRef| {
                json!({
                    "id": entity.id.to_string(),
                    "type": entity.kind.as_str(),
                })
            };

            let threshold = self.core.settings().bulk_operation_threshold;
            let sample_size = self.core.settings().bulk_sample_size;
            if affected.len() > threshold {
                let sampled: Vec<Value> = affected.iter().take(sample_size).map(identity).collect();
                meta.insert("sampled_entities".into(), json!(sampled));
                meta.insert(
                    "sampling_note".into(),
                    json!(format!(
                        "Showing first {} of {} entities",
                        sample_size,
                        affected.len()
                    )),
                );
            } else {
                let all: Vec<Value> = affected.iter().map(identity).collect();
                meta.insert("affected_entities".into(), json!(all));
            }

            self.core.submit(
                Some(actor),
                ActionType::BulkOperationPerformed,
                None,
                None,
                meta,
            );
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log data export operations
    pub fn log_data_export(
        &self,
        actor: Option<&Actor>,
        export_type: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("system_logger.log_data_export", || {
            let actor = self.core.validate_actor(actor)?;

            let mut meta = self.core.base("data_export", request, extra.clone());
            meta.insert("export_type".into(), json!(export_type));
            meta.extend(user_action_metadata(
                actor,
                "exporter",
                Some("export_timestamp"),
            ));
            meta.insert(
                "export_format".into(),
                json!(extra_str(&extra, "export_format", "csv")),
            );
            meta.insert(
                "record_count".into(),
                extra.get("record_count").cloned().unwrap_or(json!(0)),
            );
            meta.insert(
                "export_filters".into(),
                extra.get("export_filters").cloned().unwrap_or(json!({})),
            );

            self.core
                .submit(Some(actor), ActionType::DataExported, None, None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log file operations (upload, download, delete)
    pub fn log_file_operation(
        &self,
        actor: Option<&Actor>,
        file: &FileInfo,
        target: Option<&dyn AuditedEntity>,
        operation: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("system_logger.log_file_operation", || {
            let actor = self.core.validate_actor(actor)?;

            let Some(action_type) = lookup_action("system_logger", &FILE_ACTIONS, operation)
            else {
                return Ok(None);
            };

            let file_category = extra_str(&extra, "file_category", "general").to_string();
            let source = extra_str(&extra, "source", "web_interface").to_string();
            let purpose = extra_str(&extra, "purpose", "").to_string();
            let reason = extra_str(&extra, "reason", "").to_string();

            let mut meta = self.core.base(operation, request, extra);
            meta.extend(file_metadata(
                file,
                operation,
                &file_category,
                &source,
                &purpose,
                &reason,
            ));

            self.core.submit(Some(actor), action_type, target, None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log failed operations with error context
    ///
    /// Tolerates a missing actor: failures surface from scheduled jobs and
    /// unauthenticated flows too.
    pub fn log_operation_failure(
        &self,
        actor: Option<&Actor>,
        operation: &str,
        error_message: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("system_logger.log_operation_failure", || {
            let mut meta = self.core.base("operation_failure", request, extra.clone());
            meta.insert("operation".into(), json!(operation));
            meta.insert("failure_timestamp".into(), iso_timestamp(Utc::now()));
            meta.insert("error_message".into(), json!(error_message));
            meta.insert(
                "error_type".into(),
                json!(extra_str(&extra, "error_type", "")),
            );
            meta.insert(
                "severity".into(),
                json!(extra_str(&extra, "severity", "medium")),
            );

            match actor {
                Some(actor) => {
                    meta.insert("user_id".into(), json!(actor.id.as_uuid().to_string()));
                    meta.insert("user_email".into(), json!(actor.email));
                }
                None => {
                    meta.insert("user_id".into(), json!("system"));
                    meta.insert("user_email".into(), json!("system@internal"));
                }
            }

            self.core
                .submit(actor, ActionType::OperationFailed, None, None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }

    /// Log authentication events
    ///
    /// Failed logins are recorded without an actor (no principal exists
    /// yet); the other events require one.
    pub fn log_authentication_event(
        &self,
        actor: Option<&Actor>,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        guard("system_logger.log_authentication_event", || {
            let Some(action_type) = lookup_action("system_logger", &AUTH_ACTIONS, action) else {
                return Ok(None);
            };

            if action_type != ActionType::LoginFailed {
                self.core.validate_actor(actor)?;
            }

            let mut meta = self.core.base(action, request, extra.clone());
            match action_type {
                ActionType::LoginSucceeded => {
                    meta.insert("login_method".into(), json!("session"));
                }
                ActionType::LoginFailed => {
                    meta.insert(
                        "attempted_username".into(),
                        json!(extra_str(&extra, "attempted_username", "")),
                    );
                    meta.insert(
                        "failure_reason".into(),
                        json!(extra_str(&extra, "failure_reason", "invalid_credentials")),
                    );
                }
                ActionType::LoggedOut => {
                    meta.insert("logout_method".into(), json!("user_initiated"));
                }
                _ => {}
            }

            self.core.submit(actor, action_type, None, None, meta);
            Ok(Some(()))
        })
        .map(Option::flatten)
    }
}
