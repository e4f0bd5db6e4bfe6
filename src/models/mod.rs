//! Core data models for the audit trail
//!
//! Contains the audit record itself, the closed action catalogue, the
//! strongly-typed ID wrappers, and the entity boundary traits consumed by
//! the capture layer and the Context Resolver.

pub mod action;
pub mod actor;
pub mod entity;
pub mod ids;
pub mod record;

pub use action::{ActionType, RetentionCategory};
pub use actor::{Actor, ActorRef};
pub use entity::{
    AuditedEntity, EntityKind, EntityRef, HasAdministeredWorkspaces, HasOrganization, HasTeam,
    HasWorkspace, HasWorkspaceTeam,
};
pub use ids::{ActorId, OrganizationId, RecordId, TeamId, WorkspaceId, WorkspaceTeamId};
pub use record::AuditRecord;
