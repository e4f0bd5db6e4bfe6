//! Structured logging facade
//!
//! Lets business workflows emit rich, explicit audit events that automatic
//! capture cannot infer, organized by domain for maintainability. Every
//! method validates the acting principal, maps the requested action keyword
//! onto the closed action catalogue (unknown keywords warn and skip), and
//! hands the finished draft to the dispatcher's asynchronous path.

pub mod entry;
pub mod metadata;
pub mod organization;
pub mod system;
pub mod team;
pub mod workspace;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::config::AuditSettings;
use crate::context::ContextResolver;
use crate::dispatch::{Dispatcher, RecordDraft};
use crate::error::{AuditError, AuditResult};
use crate::models::{ActionType, Actor, AuditedEntity, EntityKind, WorkspaceId};

pub use entry::EntryLogger;
pub use metadata::{FileInfo, RequestContext};
pub use organization::OrganizationLogger;
pub use system::SystemLogger;
pub use team::TeamLogger;
pub use workspace::WorkspaceLogger;

/// Facade domains, one logger each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Entry,
    Organization,
    Workspace,
    Team,
    System,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Entry => "entry",
            Domain::Organization => "organization",
            Domain::Workspace => "workspace",
            Domain::Team => "team",
            Domain::System => "system",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(Domain::Entry),
            "organization" => Ok(Domain::Organization),
            "workspace" => Ok(Domain::Workspace),
            "team" => Ok(Domain::Team),
            "system" => Ok(Domain::System),
            other => Err(format!("unknown logger domain: {}", other)),
        }
    }
}

/// Shared plumbing behind every domain logger
pub(crate) struct LoggerCore {
    resolver: Arc<ContextResolver>,
    dispatcher: Arc<Dispatcher>,
    settings: Arc<AuditSettings>,
}

impl LoggerCore {
    fn new(
        resolver: Arc<ContextResolver>,
        dispatcher: Arc<Dispatcher>,
        settings: Arc<AuditSettings>,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            settings,
        }
    }

    /// Require an authenticated actor; absence is caller misuse
    pub(crate) fn validate_actor<'a>(&self, actor: Option<&'a Actor>) -> AuditResult<&'a Actor> {
        actor.ok_or_else(AuditError::missing_actor)
    }

    /// Base metadata with request context and caller extras merged in
    pub(crate) fn base(
        &self,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> Map<String, Value> {
        metadata::base_metadata(action, request, self.settings.max_user_agent_length, extra)
    }

    pub(crate) fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Resolve scoping and enqueue the draft on the async path
    pub(crate) fn submit(
        &self,
        actor: Option<&Actor>,
        action_type: ActionType,
        target: Option<&dyn AuditedEntity>,
        explicit_workspace: Option<WorkspaceId>,
        metadata: Map<String, Value>,
    ) {
        let scope = self.resolver.resolve(actor, target, explicit_workspace);
        let draft = RecordDraft::new(action_type)
            .actor(actor.map(Actor::reference))
            .target(target.map(|t| t.entity_ref()))
            .scope(scope)
            .metadata(metadata);
        self.dispatcher.enqueue(draft);
    }
}

/// Map an action keyword through a logger's supported-action table
///
/// Unsupported keywords are logged as a warning and produce `None`: the
/// call is a silent skip, not a failure.
pub(crate) fn lookup_action(
    logger: &'static str,
    supported: &[(&str, ActionType)],
    action: &str,
) -> Option<ActionType> {
    match supported.iter().find(|(name, _)| *name == action) {
        Some((_, action_type)) => Some(*action_type),
        None => {
            warn!(logger, action, "unsupported audit action, skipping");
            None
        }
    }
}

/// Owned registry of the five domain loggers with a dynamic-routing entry
/// point
pub struct LoggerFactory {
    entry: EntryLogger,
    organization: OrganizationLogger,
    workspace: WorkspaceLogger,
    team: TeamLogger,
    system: SystemLogger,
}

impl LoggerFactory {
    pub fn new(
        resolver: Arc<ContextResolver>,
        dispatcher: Arc<Dispatcher>,
        settings: Arc<AuditSettings>,
    ) -> Self {
        let core = || {
            Arc::new(LoggerCore::new(
                Arc::clone(&resolver),
                Arc::clone(&dispatcher),
                Arc::clone(&settings),
            ))
        };
        Self {
            entry: EntryLogger::new(core()),
            organization: OrganizationLogger::new(core()),
            workspace: WorkspaceLogger::new(core()),
            team: TeamLogger::new(core()),
            system: SystemLogger::new(core()),
        }
    }

    pub fn entry(&self) -> &EntryLogger {
        &self.entry
    }

    pub fn organization(&self) -> &OrganizationLogger {
        &self.organization
    }

    pub fn workspace(&self) -> &WorkspaceLogger {
        &self.workspace
    }

    pub fn team(&self) -> &TeamLogger {
        &self.team
    }

    pub fn system(&self) -> &SystemLogger {
        &self.system
    }

    /// Infer the right domain from the subject entity's kind
    ///
    /// A missing entity routes to the system domain, which covers the
    /// entity-less events (exports, failures, authentication).
    pub fn detect_domain(kind: Option<EntityKind>) -> Domain {
        match kind {
            Some(EntityKind::Entry) => Domain::Entry,
            Some(EntityKind::Organization) | Some(EntityKind::OrganizationMember) => {
                Domain::Organization
            }
            Some(EntityKind::Workspace) | Some(EntityKind::WorkspaceTeam) => Domain::Workspace,
            Some(EntityKind::Team) | Some(EntityKind::TeamMember) => Domain::Team,
            Some(EntityKind::User)
            | Some(EntityKind::Invitation)
            | Some(EntityKind::Attachment)
            | None => Domain::System,
        }
    }

    /// Dynamic-routing entry point
    ///
    /// Routes to the right domain logger, inferring the domain from the
    /// entity's kind unless an explicit hint is given.
    pub fn log_auto(
        &self,
        actor: Option<&Actor>,
        entity: Option<&dyn AuditedEntity>,
        action: &str,
        request: Option<&RequestContext>,
        domain_hint: Option<Domain>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        let domain =
            domain_hint.unwrap_or_else(|| Self::detect_domain(entity.map(|e| e.entity_kind())));

        match domain {
            Domain::Entry => match entity {
                Some(entity) => self.entry.log_entry_action(actor, entity, action, request, extra),
                None => {
                    warn!(action, "entry routing requires a target entity, skipping");
                    Ok(None)
                }
            },
            Domain::Organization => match entity {
                Some(entity) if entity.entity_kind() == EntityKind::OrganizationMember => self
                    .organization
                    .log_member_action(actor, entity, action, request, extra),
                Some(entity) => self
                    .organization
                    .log_organization_action(actor, entity, action, request, extra),
                None => {
                    warn!(action, "organization routing requires a target entity, skipping");
                    Ok(None)
                }
            },
            Domain::Workspace => match entity {
                Some(entity) if entity.entity_kind() == EntityKind::WorkspaceTeam => self
                    .workspace
                    .log_workspace_team_action(actor, entity, action, request, extra),
                Some(entity) => self
                    .workspace
                    .log_workspace_action(actor, entity, action, request, extra),
                None => {
                    warn!(action, "workspace routing requires a target entity, skipping");
                    Ok(None)
                }
            },
            Domain::Team => match entity {
                Some(entity) if entity.entity_kind() == EntityKind::TeamMember => self
                    .team
                    .log_team_member_action(actor, entity, action, request, extra),
                Some(entity) => self.team.log_team_action(actor, entity, action, request, extra),
                None => {
                    warn!(action, "team routing requires a target entity, skipping");
                    Ok(None)
                }
            },
            Domain::System => self.route_system(actor, entity, action, request, extra),
        }
    }

    fn route_system(
        &self,
        actor: Option<&Actor>,
        entity: Option<&dyn AuditedEntity>,
        action: &str,
        request: Option<&RequestContext>,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<()>> {
        if let Some(permission_action) = action.strip_prefix("permission_") {
            let Some(target_user) = entity else {
                warn!(action, "permission routing requires a target user, skipping");
                return Ok(None);
            };
            let permission_type = metadata::extra_str(&extra, "permission_type", "").to_string();
            return self.system.log_permission_change(
                actor,
                target_user,
                &permission_type,
                permission_action,
                request,
                extra,
            );
        }

        if let Some(file_action) = action.strip_prefix("file_") {
            let Some(entity) = entity else {
                warn!(action, "file routing requires a file entity, skipping");
                return Ok(None);
            };
            let file = FileInfo::new(
                entity.display_name().unwrap_or_else(|| "unknown".into()),
                entity
                    .tracked_value("file_size")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
                entity
                    .tracked_value("file_type")
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_else(|| "unknown".into()),
            );
            return self
                .system
                .log_file_operation(actor, &file, Some(entity), file_action, request, extra);
        }

        match action {
            "data_export" => {
                let export_type = metadata::extra_str(&extra, "export_type", "").to_string();
                self.system.log_data_export(actor, &export_type, request, extra)
            }
            "operation_failure" => {
                let operation = metadata::extra_str(&extra, "operation", "").to_string();
                let error_message =
                    metadata::extra_str(&extra, "error_message", "").to_string();
                self.system
                    .log_operation_failure(actor, &operation, &error_message, request, extra)
            }
            "login_success" | "login_failed" | "logout" | "password_changed" => self
                .system
                .log_authentication_event(actor, action, request, extra),
            other => {
                warn!(action = other, "unknown system action, skipping");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_domain_mapping() {
        assert_eq!(
            LoggerFactory::detect_domain(Some(EntityKind::Entry)),
            Domain::Entry
        );
        assert_eq!(
            LoggerFactory::detect_domain(Some(EntityKind::WorkspaceTeam)),
            Domain::Workspace
        );
        assert_eq!(
            LoggerFactory::detect_domain(Some(EntityKind::TeamMember)),
            Domain::Team
        );
        assert_eq!(
            LoggerFactory::detect_domain(Some(EntityKind::User)),
            Domain::System
        );
        assert_eq!(LoggerFactory::detect_domain(None), Domain::System);
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("workspace".parse::<Domain>().unwrap(), Domain::Workspace);
        assert!("webhooks".parse::<Domain>().is_err());
    }

    #[test]
    fn test_lookup_action() {
        let supported = [("approve", ActionType::EntryApproved)];
        assert_eq!(
            lookup_action("entry_logger", &supported, "approve"),
            Some(ActionType::EntryApproved)
        );
        assert_eq!(lookup_action("entry_logger", &supported, "escalate"), None);
    }
}
