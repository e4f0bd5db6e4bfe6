//! Entity boundary types
//!
//! The audit engine never owns business entities; it sees them through the
//! [`AuditedEntity`] trait and a set of capability traits the Context
//! Resolver probes in priority order. A business type opts into a
//! capability by returning `Some(self)` from the matching probe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ids::{OrganizationId, TeamId, WorkspaceId, WorkspaceTeamId};

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Organization,
    OrganizationMember,
    Workspace,
    WorkspaceTeam,
    Team,
    TeamMember,
    Entry,
    Invitation,
    Attachment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Organization => "organization",
            EntityKind::OrganizationMember => "organization_member",
            EntityKind::Workspace => "workspace",
            EntityKind::WorkspaceTeam => "workspace_team",
            EntityKind::Team => "team",
            EntityKind::TeamMember => "team_member",
            EntityKind::Entry => "entry",
            EntityKind::Invitation => "invitation",
            EntityKind::Attachment => "attachment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(EntityKind::User),
            "organization" => Ok(EntityKind::Organization),
            "organization_member" => Ok(EntityKind::OrganizationMember),
            "workspace" => Ok(EntityKind::Workspace),
            "workspace_team" => Ok(EntityKind::WorkspaceTeam),
            "team" => Ok(EntityKind::Team),
            "team_member" => Ok(EntityKind::TeamMember),
            "entry" => Ok(EntityKind::Entry),
            "invitation" => Ok(EntityKind::Invitation),
            "attachment" => Ok(EntityKind::Attachment),
            other => Err(format!("unknown entity type: {}", other)),
        }
    }
}

/// Polymorphic reference to a target entity
///
/// Both parts are always set together; an actor-less, entity-less event
/// (e.g. a failed login) carries no `EntityRef` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "entity_type")]
    pub kind: EntityKind,
    #[serde(rename = "entity_id")]
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Capability: the entity carries a direct workspace relation
pub trait HasWorkspace {
    fn workspace_id(&self) -> Option<WorkspaceId>;
}

/// Capability: the entity carries a workspace-team relation
pub trait HasWorkspaceTeam {
    fn workspace_team_id(&self) -> Option<WorkspaceTeamId>;
}

/// Capability: the entity carries a team relation
pub trait HasTeam {
    fn team_id(&self) -> Option<TeamId>;
}

/// Capability: the entity administers workspaces (membership/admin principal)
pub trait HasAdministeredWorkspaces {
    fn administered_workspace_ids(&self) -> Vec<WorkspaceId>;
}

/// Capability: the entity belongs to an organization
pub trait HasOrganization {
    fn organization_id(&self) -> Option<OrganizationId>;
}

/// Read-only view of a business entity, as consumed by the capture layer
/// and the Context Resolver.
///
/// Capability probes default to `None`; implementors override the ones
/// their relations support. Probing is defensive by construction: a missing
/// capability is an ordinary `None`, never an error.
pub trait AuditedEntity {
    /// The entity-type discriminator
    fn entity_kind(&self) -> EntityKind;

    /// The entity's primary identifier
    fn entity_uuid(&self) -> Uuid;

    /// Human-readable descriptor (title, email, filename)
    fn display_name(&self) -> Option<String> {
        None
    }

    /// Current value of a tracked field, or `None` if the entity has no
    /// such field
    fn tracked_value(&self, field: &str) -> Option<serde_json::Value>;

    /// Set when the entity itself *is* a workspace (resolver step 2)
    fn as_workspace(&self) -> Option<WorkspaceId> {
        None
    }

    fn workspace_capability(&self) -> Option<&dyn HasWorkspace> {
        None
    }

    fn workspace_team_capability(&self) -> Option<&dyn HasWorkspaceTeam> {
        None
    }

    fn team_capability(&self) -> Option<&dyn HasTeam> {
        None
    }

    fn administered_workspaces_capability(&self) -> Option<&dyn HasAdministeredWorkspaces> {
        None
    }

    fn organization_capability(&self) -> Option<&dyn HasOrganization> {
        None
    }

    /// The polymorphic reference stored on emitted records
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_kind(), self.entity_uuid())
    }
}
