//! Context resolution
//!
//! Infers the organization/workspace scoping to denormalize onto a record,
//! given an optional actor, an optional target entity, and an optional
//! explicitly-supplied workspace. The chain is deliberately heuristic and
//! best-effort: it never fails, and an unresolved context is a valid
//! outcome (e.g. a failed login before any tenant context exists).
//!
//! Capability probing follows a strict priority order; the first step that
//! produces a workspace wins and later steps are not evaluated.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    Actor, ActorId, AuditedEntity, OrganizationId, TeamId, WorkspaceId, WorkspaceTeamId,
};

/// Resolved tenant scoping for one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    pub organization: Option<OrganizationId>,
    pub workspace: Option<WorkspaceId>,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.organization.is_none() && self.workspace.is_none()
    }
}

/// Cross-entity lookups the resolver chain needs
///
/// Implemented by the business side over its own relations; every lookup is
/// best-effort and `None` is always tolerated.
pub trait TenantDirectory {
    /// The organization a workspace belongs to
    fn workspace_organization(&self, workspace: WorkspaceId) -> Option<OrganizationId>;

    /// The workspace behind a workspace-team link
    fn workspace_team_workspace(&self, workspace_team: WorkspaceTeamId) -> Option<WorkspaceId>;

    /// The workspace-team a team is attached to, if any
    fn team_workspace_team(&self, team: TeamId) -> Option<WorkspaceTeamId>;

    /// The first active workspace of an organization, if any
    fn first_active_workspace(&self, organization: OrganizationId) -> Option<WorkspaceId>;

    /// The active organization of an actor's active membership, if any
    fn actor_active_organization(&self, actor: ActorId) -> Option<OrganizationId>;
}

/// Best-effort organization/workspace inference
pub struct ContextResolver {
    directory: Arc<dyn TenantDirectory + Send + Sync>,
}

impl ContextResolver {
    pub fn new(directory: Arc<dyn TenantDirectory + Send + Sync>) -> Self {
        Self { directory }
    }

    /// Resolve scoping for one emission
    ///
    /// Once a workspace is found, the organization is derived from it. With
    /// no workspace, the target's own organization (or, failing that, the
    /// actor's active membership) may still yield an organization-only
    /// scope.
    pub fn resolve(
        &self,
        actor: Option<&Actor>,
        target: Option<&dyn AuditedEntity>,
        explicit_workspace: Option<WorkspaceId>,
    ) -> Scope {
        if let Some(workspace) = self.resolve_workspace(actor, target, explicit_workspace) {
            return Scope {
                organization: self.directory.workspace_organization(workspace),
                workspace: Some(workspace),
            };
        }

        let organization = target
            .and_then(|t| {
                t.organization_capability()
                    .and_then(|cap| cap.organization_id())
            })
            .or_else(|| {
                actor.and_then(|a| self.directory.actor_active_organization(a.id))
            });

        Scope {
            organization,
            workspace: None,
        }
    }

    /// The nine-step workspace chain, first match wins
    fn resolve_workspace(
        &self,
        actor: Option<&Actor>,
        target: Option<&dyn AuditedEntity>,
        explicit_workspace: Option<WorkspaceId>,
    ) -> Option<WorkspaceId> {
        // 1. Explicitly supplied workspace always wins
        if explicit_workspace.is_some() {
            return explicit_workspace;
        }

        if let Some(target) = target {
            // 2. The target itself is a workspace
            if let Some(workspace) = target.as_workspace() {
                return Some(workspace);
            }

            // 3. Direct workspace relation
            if let Some(workspace) = target
                .workspace_capability()
                .and_then(|cap| cap.workspace_id())
            {
                return Some(workspace);
            }

            // 4. Workspace-team relation
            if let Some(workspace) = target
                .workspace_team_capability()
                .and_then(|cap| cap.workspace_team_id())
                .and_then(|wt| self.directory.workspace_team_workspace(wt))
            {
                return Some(workspace);
            }

            // 5. Team relation, through the team's workspace-team
            if let Some(workspace) = target
                .team_capability()
                .and_then(|cap| cap.team_id())
                .and_then(|team| self.directory.team_workspace_team(team))
                .and_then(|wt| self.directory.workspace_team_workspace(wt))
            {
                return Some(workspace);
            }

            // 6. Administered workspaces (membership/admin principal)
            if let Some(workspace) = target
                .administered_workspaces_capability()
                .and_then(|cap| cap.administered_workspace_ids().into_iter().next())
            {
                return Some(workspace);
            }

            // 7. The target's organization has an active workspace
            if let Some(workspace) = target
                .organization_capability()
                .and_then(|cap| cap.organization_id())
                .and_then(|org| self.directory.first_active_workspace(org))
            {
                return Some(workspace);
            }
        }

        // 8. Last resort: the actor's active membership
        if let Some(workspace) = actor
            .and_then(|a| self.directory.actor_active_organization(a.id))
            .and_then(|org| self.directory.first_active_workspace(org))
        {
            return Some(workspace);
        }

        // 9. Unresolved: valid for organization-independent events
        None
    }
}

/// In-memory tenant directory for tests and embedders
#[derive(Default)]
pub struct InMemoryDirectory {
    workspace_organizations: HashMap<WorkspaceId, OrganizationId>,
    active_workspaces: HashMap<OrganizationId, Vec<WorkspaceId>>,
    workspace_team_workspaces: HashMap<WorkspaceTeamId, WorkspaceId>,
    team_workspace_teams: HashMap<TeamId, WorkspaceTeamId>,
    actor_organizations: HashMap<ActorId, OrganizationId>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active workspace under an organization
    pub fn add_workspace(&mut self, organization: OrganizationId, workspace: WorkspaceId) {
        self.workspace_organizations
            .insert(workspace, organization);
        self.active_workspaces
            .entry(organization)
            .or_default()
            .push(workspace);
    }

    /// Register a workspace that no longer counts as active (archived or
    /// closed); it still maps back to its organization
    pub fn add_inactive_workspace(&mut self, organization: OrganizationId, workspace: WorkspaceId) {
        self.workspace_organizations
            .insert(workspace, organization);
    }

    /// Link a workspace-team to its workspace
    pub fn link_workspace_team(&mut self, workspace_team: WorkspaceTeamId, workspace: WorkspaceId) {
        self.workspace_team_workspaces
            .insert(workspace_team, workspace);
    }

    /// Attach a team to a workspace-team
    pub fn link_team(&mut self, team: TeamId, workspace_team: WorkspaceTeamId) {
        self.team_workspace_teams.insert(team, workspace_team);
    }

    /// Register an actor's active membership in an active organization
    pub fn add_membership(&mut self, actor: ActorId, organization: OrganizationId) {
        self.actor_organizations.insert(actor, organization);
    }
}

impl TenantDirectory for InMemoryDirectory {
    fn workspace_organization(&self, workspace: WorkspaceId) -> Option<OrganizationId> {
        self.workspace_organizations.get(&workspace).copied()
    }

    fn workspace_team_workspace(&self, workspace_team: WorkspaceTeamId) -> Option<WorkspaceId> {
        self.workspace_team_workspaces.get(&workspace_team).copied()
    }

    fn team_workspace_team(&self, team: TeamId) -> Option<WorkspaceTeamId> {
        self.team_workspace_teams.get(&team).copied()
    }

    fn first_active_workspace(&self, organization: OrganizationId) -> Option<WorkspaceId> {
        self.active_workspaces
            .get(&organization)
            .and_then(|workspaces| workspaces.first().copied())
    }

    fn actor_active_organization(&self, actor: ActorId) -> Option<OrganizationId> {
        self.actor_organizations.get(&actor).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EntityKind, HasAdministeredWorkspaces, HasOrganization, HasTeam, HasWorkspace,
        HasWorkspaceTeam,
    };
    use uuid::Uuid;

    /// Configurable stand-in for a business entity
    #[derive(Default)]
    struct StubEntity {
        is_workspace: Option<WorkspaceId>,
        workspace: Option<Option<WorkspaceId>>,
        workspace_team: Option<Option<WorkspaceTeamId>>,
        team: Option<Option<TeamId>>,
        administered: Option<Vec<WorkspaceId>>,
        organization: Option<Option<OrganizationId>>,
    }

    impl HasWorkspace for StubEntity {
        fn workspace_id(&self) -> Option<WorkspaceId> {
            self.workspace.clone().flatten()
        }
    }

    impl HasWorkspaceTeam for StubEntity {
        fn workspace_team_id(&self) -> Option<WorkspaceTeamId> {
            self.workspace_team.clone().flatten()
        }
    }

    impl HasTeam for StubEntity {
        fn team_id(&self) -> Option<TeamId> {
            self.team.clone().flatten()
        }
    }

    impl HasAdministeredWorkspaces for StubEntity {
        fn administered_workspace_ids(&self) -> Vec<WorkspaceId> {
            self.administered.clone().unwrap_or_default()
        }
    }

    impl HasOrganization for StubEntity {
        fn organization_id(&self) -> Option<OrganizationId> {
            self.organization.clone().flatten()
        }
    }

    impl AuditedEntity for StubEntity {
        fn entity_kind(&self) -> EntityKind {
            EntityKind::Entry
        }

        fn entity_uuid(&self) -> Uuid {
            Uuid::nil()
        }

        fn tracked_value(&self, _field: &str) -> Option<serde_json::Value> {
            None
        }

        fn as_workspace(&self) -> Option<WorkspaceId> {
            self.is_workspace
        }

        fn workspace_capability(&self) -> Option<&dyn HasWorkspace> {
            self.workspace.as_ref().map(|_| self as &dyn HasWorkspace)
        }

        fn workspace_team_capability(&self) -> Option<&dyn HasWorkspaceTeam> {
            self.workspace_team
                .as_ref()
                .map(|_| self as &dyn HasWorkspaceTeam)
        }

        fn team_capability(&self) -> Option<&dyn HasTeam> {
            self.team.as_ref().map(|_| self as &dyn HasTeam)
        }

        fn administered_workspaces_capability(&self) -> Option<&dyn HasAdministeredWorkspaces> {
            self.administered
                .as_ref()
                .map(|_| self as &dyn HasAdministeredWorkspaces)
        }

        fn organization_capability(&self) -> Option<&dyn HasOrganization> {
            self.organization
                .as_ref()
                .map(|_| self as &dyn HasOrganization)
        }
    }

    fn resolver(directory: InMemoryDirectory) -> ContextResolver {
        ContextResolver::new(Arc::new(directory))
    }

    #[test]
    fn test_explicit_workspace_wins() {
        let org = OrganizationId::new();
        let explicit = WorkspaceId::new();
        let other = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, explicit);
        directory.add_workspace(org, other);

        // Target is itself a workspace, but the explicit value still wins
        let target = StubEntity {
            is_workspace: Some(other),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), Some(explicit));
        assert_eq!(scope.workspace, Some(explicit));
        assert_eq!(scope.organization, Some(org));
    }

    #[test]
    fn test_target_is_workspace() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);

        let target = StubEntity {
            is_workspace: Some(workspace),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(workspace));
        assert_eq!(scope.organization, Some(org));
    }

    #[test]
    fn test_direct_workspace_relation() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);

        let target = StubEntity {
            workspace: Some(Some(workspace)),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(workspace));
    }

    #[test]
    fn test_workspace_team_relation() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();
        let workspace_team = WorkspaceTeamId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);
        directory.link_workspace_team(workspace_team, workspace);

        let target = StubEntity {
            workspace_team: Some(Some(workspace_team)),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(workspace));
    }

    #[test]
    fn test_team_relation_through_workspace_team() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();
        let workspace_team = WorkspaceTeamId::new();
        let team = TeamId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);
        directory.link_workspace_team(workspace_team, workspace);
        directory.link_team(team, workspace_team);

        let target = StubEntity {
            team: Some(Some(team)),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(workspace));
    }

    #[test]
    fn test_administered_workspaces() {
        let org = OrganizationId::new();
        let first = WorkspaceId::new();
        let second = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, first);
        directory.add_workspace(org, second);

        let target = StubEntity {
            administered: Some(vec![first, second]),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(first));
    }

    #[test]
    fn test_organization_active_workspace() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);

        let target = StubEntity {
            organization: Some(Some(org)),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(workspace));
        assert_eq!(scope.organization, Some(org));
    }

    #[test]
    fn test_actor_membership_last_resort() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();
        let actor = Actor::new(ActorId::new(), "m@example.com", "m");

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);
        directory.add_membership(actor.id, org);

        let scope = resolver(directory).resolve(Some(&actor), None, None);
        assert_eq!(scope.workspace, Some(workspace));
        assert_eq!(scope.organization, Some(org));
    }

    #[test]
    fn test_unresolved_is_empty_not_error() {
        let scope = resolver(InMemoryDirectory::new()).resolve(None, None, None);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_null_relation_falls_through() {
        let org = OrganizationId::new();
        let workspace = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_workspace(org, workspace);

        // Declares the workspace capability but the relation is unset, so
        // the chain continues to the organization step
        let target = StubEntity {
            workspace: Some(None),
            organization: Some(Some(org)),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, Some(workspace));
    }

    #[test]
    fn test_organization_only_scope() {
        let org = OrganizationId::new();

        // Organization exists but has no active workspace
        let target = StubEntity {
            organization: Some(Some(org)),
            ..Default::default()
        };

        let scope = resolver(InMemoryDirectory::new()).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, None);
        assert_eq!(scope.organization, Some(org));
    }

    #[test]
    fn test_inactive_workspace_not_used_for_org_fallback() {
        let org = OrganizationId::new();
        let archived = WorkspaceId::new();

        let mut directory = InMemoryDirectory::new();
        directory.add_inactive_workspace(org, archived);

        let target = StubEntity {
            organization: Some(Some(org)),
            ..Default::default()
        };

        let scope = resolver(directory).resolve(None, Some(&target), None);
        assert_eq!(scope.workspace, None);
        assert_eq!(scope.organization, Some(org));
    }
}
