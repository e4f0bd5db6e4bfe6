//! Capture configuration registry
//!
//! Maps entity kinds to their lifecycle action types and tracked fields.
//! Built once at startup (static defaults plus optional dynamic
//! registration) and injected into the capture layer; re-registering a kind
//! replaces its configuration.

use std::collections::HashMap;

use tracing::info;

use crate::models::{ActionType, EntityKind};

/// Action types emitted for each lifecycle verb
///
/// Kinds without an `updated` action skip update capture entirely (e.g.
/// attachments, which only come and go).
#[derive(Debug, Clone)]
pub struct LifecycleActions {
    pub created: ActionType,
    pub updated: Option<ActionType>,
    pub deleted: Option<ActionType>,
    /// Used instead of `updated` when the diff includes a `status` change
    pub status_changed: Option<ActionType>,
}

/// Capture configuration for one auditable entity kind
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub actions: LifecycleActions,
    pub tracked_fields: Vec<String>,
}

impl CaptureConfig {
    pub fn new(actions: LifecycleActions, tracked_fields: &[&str]) -> Self {
        Self {
            actions,
            tracked_fields: tracked_fields.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Registry of capture configurations, keyed by entity kind
#[derive(Debug, Default)]
pub struct ModelRegistry {
    configs: HashMap<EntityKind, CaptureConfig>,
}

impl ModelRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the standard business entities
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(
            EntityKind::Organization,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::OrganizationCreated,
                    updated: Some(ActionType::OrganizationUpdated),
                    deleted: Some(ActionType::OrganizationDeleted),
                    status_changed: Some(ActionType::OrganizationStatusChanged),
                },
                &["title", "status", "description"],
            ),
        );

        registry.register(
            EntityKind::Workspace,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::WorkspaceCreated,
                    updated: Some(ActionType::WorkspaceUpdated),
                    deleted: Some(ActionType::WorkspaceDeleted),
                    status_changed: Some(ActionType::WorkspaceStatusChanged),
                },
                &["title", "description", "status"],
            ),
        );

        registry.register(
            EntityKind::Entry,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::EntryCreated,
                    updated: Some(ActionType::EntryUpdated),
                    deleted: Some(ActionType::EntryDeleted),
                    status_changed: Some(ActionType::EntryStatusChanged),
                },
                &["entry_type", "amount", "status"],
            ),
        );

        registry.register(
            EntityKind::Team,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::TeamCreated,
                    updated: Some(ActionType::TeamUpdated),
                    deleted: Some(ActionType::TeamDeleted),
                    status_changed: None,
                },
                &["title", "description"],
            ),
        );

        registry.register(
            EntityKind::TeamMember,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::TeamMemberAdded,
                    updated: Some(ActionType::TeamMemberRoleChanged),
                    deleted: Some(ActionType::TeamMemberRemoved),
                    status_changed: None,
                },
                &["role", "deleted_at"],
            ),
        );

        registry.register(
            EntityKind::User,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::UserCreated,
                    updated: Some(ActionType::UserProfileUpdated),
                    deleted: Some(ActionType::UserDeleted),
                    status_changed: None,
                },
                &["email", "username", "status", "is_active"],
            ),
        );

        registry.register(
            EntityKind::OrganizationMember,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::OrganizationMemberAdded,
                    updated: Some(ActionType::OrganizationMemberUpdated),
                    deleted: Some(ActionType::OrganizationMemberRemoved),
                    status_changed: None,
                },
                &["is_active"],
            ),
        );

        registry.register(
            EntityKind::WorkspaceTeam,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::WorkspaceTeamAdded,
                    updated: Some(ActionType::WorkspaceTeamUpdated),
                    deleted: Some(ActionType::WorkspaceTeamRemoved),
                    status_changed: None,
                },
                &["custom_remittance_rate"],
            ),
        );

        registry.register(
            EntityKind::Invitation,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::InvitationSent,
                    updated: Some(ActionType::InvitationResent),
                    deleted: Some(ActionType::InvitationCanceled),
                    status_changed: None,
                },
                &["email", "status", "role"],
            ),
        );

        registry.register(
            EntityKind::Attachment,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::FileUploaded,
                    updated: None,
                    deleted: Some(ActionType::FileDeleted),
                    status_changed: None,
                },
                &["file_url", "file_type"],
            ),
        );

        registry
    }

    /// Register (or replace) the configuration for an entity kind
    pub fn register(&mut self, kind: EntityKind, config: CaptureConfig) {
        let replaced = self.configs.insert(kind, config).is_some();
        info!(entity_kind = %kind, replaced, "registered audit capture configuration");
    }

    /// Look up the configuration for an entity kind
    pub fn config(&self, kind: EntityKind) -> Option<&CaptureConfig> {
        self.configs.get(&kind)
    }

    /// Check if an entity kind is registered
    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.configs.contains_key(&kind)
    }

    /// All registered kinds, sorted by name for stable listings
    pub fn registered_kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.configs.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_business_entities() {
        let registry = ModelRegistry::with_defaults();
        assert!(registry.is_registered(EntityKind::Organization));
        assert!(registry.is_registered(EntityKind::Workspace));
        assert!(registry.is_registered(EntityKind::Entry));
        assert!(registry.is_registered(EntityKind::Attachment));
        assert_eq!(registry.registered_kinds().len(), 10);
    }

    #[test]
    fn test_entry_config() {
        let registry = ModelRegistry::with_defaults();
        let config = registry.config(EntityKind::Entry).unwrap();
        assert_eq!(config.actions.created, ActionType::EntryCreated);
        assert_eq!(
            config.actions.status_changed,
            Some(ActionType::EntryStatusChanged)
        );
        assert_eq!(config.tracked_fields, vec!["entry_type", "amount", "status"]);
    }

    #[test]
    fn test_attachment_has_no_update_action() {
        let registry = ModelRegistry::with_defaults();
        let config = registry.config(EntityKind::Attachment).unwrap();
        assert!(config.actions.updated.is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = ModelRegistry::with_defaults();
        registry.register(
            EntityKind::Entry,
            CaptureConfig::new(
                LifecycleActions {
                    created: ActionType::EntryCreated,
                    updated: Some(ActionType::EntryUpdated),
                    deleted: Some(ActionType::EntryDeleted),
                    status_changed: None,
                },
                &["status"],
            ),
        );

        let config = registry.config(EntityKind::Entry).unwrap();
        assert_eq!(config.tracked_fields, vec!["status"]);
        assert!(config.actions.status_changed.is_none());
    }

    #[test]
    fn test_unregistered_kind_lookup() {
        let registry = ModelRegistry::new();
        assert!(registry.config(EntityKind::Entry).is_none());
    }
}
