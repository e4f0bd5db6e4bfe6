//! Audit action catalogue
//!
//! Defines the closed set of auditable action types, their human-readable
//! labels, and the classification helpers used by the query layer and the
//! retention engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retention classification for an action type
///
/// Authentication events age out fastest, critical actions are kept the
/// longest, everything else falls under the default window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionCategory {
    Authentication,
    Critical,
    Default,
}

impl fmt::Display for RetentionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionCategory::Authentication => write!(f, "authentication"),
            RetentionCategory::Critical => write!(f, "critical"),
            RetentionCategory::Default => write!(f, "default"),
        }
    }
}

/// Types of actions that can be audited
///
/// This is a closed enumeration: every record carries exactly one of these
/// values, and the retention category and UI label are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    // Authentication & authorization
    LoginSucceeded,
    LoginFailed,
    LoggedOut,
    PasswordChanged,

    // User management
    UserCreated,
    UserProfileUpdated,
    UserDeleted,

    // Organization management
    OrganizationCreated,
    OrganizationUpdated,
    OrganizationDeleted,
    OrganizationStatusChanged,
    OrganizationMemberAdded,
    OrganizationMemberUpdated,
    OrganizationMemberRemoved,
    OrganizationMemberRoleChanged,

    // Workspace management
    WorkspaceCreated,
    WorkspaceUpdated,
    WorkspaceDeleted,
    WorkspaceArchived,
    WorkspaceActivated,
    WorkspaceClosed,
    WorkspaceStatusChanged,
    WorkspaceTeamAdded,
    WorkspaceTeamUpdated,
    WorkspaceTeamRemoved,

    // Team management
    TeamCreated,
    TeamUpdated,
    TeamDeleted,
    TeamMemberAdded,
    TeamMemberRemoved,
    TeamMemberRoleChanged,

    // Entry workflow
    EntryCreated,
    EntryUpdated,
    EntryDeleted,
    EntryStatusChanged,
    EntrySubmitted,
    EntryReviewed,
    EntryApproved,
    EntryRejected,
    EntryFlagged,
    EntryUnflagged,

    // Invitations
    InvitationSent,
    InvitationResent,
    InvitationCanceled,

    // File management
    FileUploaded,
    FileDownloaded,
    FileDeleted,

    // System events
    PermissionGranted,
    PermissionRevoked,
    PermissionChanged,
    BulkOperationPerformed,
    DataExported,
    OperationFailed,
    AccessDenied,
}

impl ActionType {
    /// Human-readable label, shown in listings and matched by free-text
    /// search
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::LoginSucceeded => "Login Succeeded",
            ActionType::LoginFailed => "Login Failed",
            ActionType::LoggedOut => "Logged Out",
            ActionType::PasswordChanged => "Password Changed",
            ActionType::UserCreated => "User Created",
            ActionType::UserProfileUpdated => "User Profile Updated",
            ActionType::UserDeleted => "User Deleted",
            ActionType::OrganizationCreated => "Organization Created",
            ActionType::OrganizationUpdated => "Organization Updated",
            ActionType::OrganizationDeleted => "Organization Deleted",
            ActionType::OrganizationStatusChanged => "Organization Status Changed",
            ActionType::OrganizationMemberAdded => "Organization Member Added",
            ActionType::OrganizationMemberUpdated => "Organization Member Updated",
            ActionType::OrganizationMemberRemoved => "Organization Member Removed",
            ActionType::OrganizationMemberRoleChanged => "Organization Member Role Changed",
            ActionType::WorkspaceCreated => "Workspace Created",
            ActionType::WorkspaceUpdated => "Workspace Updated",
            ActionType::WorkspaceDeleted => "Workspace Deleted",
            ActionType::WorkspaceArchived => "Workspace Archived",
            ActionType::WorkspaceActivated => "Workspace Activated",
            ActionType::WorkspaceClosed => "Workspace Closed",
            ActionType::WorkspaceStatusChanged => "Workspace Status Changed",
            ActionType::WorkspaceTeamAdded => "Workspace Team Added",
            ActionType::WorkspaceTeamUpdated => "Workspace Team Updated",
            ActionType::WorkspaceTeamRemoved => "Workspace Team Removed",
            ActionType::TeamCreated => "Team Created",
            ActionType::TeamUpdated => "Team Updated",
            ActionType::TeamDeleted => "Team Deleted",
            ActionType::TeamMemberAdded => "Team Member Added",
            ActionType::TeamMemberRemoved => "Team Member Removed",
            ActionType::TeamMemberRoleChanged => "Team Member Role Changed",
            ActionType::EntryCreated => "Entry Created",
            ActionType::EntryUpdated => "Entry Updated",
            ActionType::EntryDeleted => "Entry Deleted",
            ActionType::EntryStatusChanged => "Entry Status Changed",
            ActionType::EntrySubmitted => "Entry Submitted",
            ActionType::EntryReviewed => "Entry Reviewed",
            ActionType::EntryApproved => "Entry Approved",
            ActionType::EntryRejected => "Entry Rejected",
            ActionType::EntryFlagged => "Entry Flagged",
            ActionType::EntryUnflagged => "Entry Unflagged",
            ActionType::InvitationSent => "Invitation Sent",
            ActionType::InvitationResent => "Invitation Resent",
            ActionType::InvitationCanceled => "Invitation Canceled",
            ActionType::FileUploaded => "File Uploaded",
            ActionType::FileDownloaded => "File Downloaded",
            ActionType::FileDeleted => "File Deleted",
            ActionType::PermissionGranted => "Permission Granted",
            ActionType::PermissionRevoked => "Permission Revoked",
            ActionType::PermissionChanged => "Permission Changed",
            ActionType::BulkOperationPerformed => "Bulk Operation Performed",
            ActionType::DataExported => "Data Exported",
            ActionType::OperationFailed => "Operation Failed",
            ActionType::AccessDenied => "Access Denied",
        }
    }

    /// The wire/storage name (snake_case), as used in filters and settings
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::LoginSucceeded => "login_succeeded",
            ActionType::LoginFailed => "login_failed",
            ActionType::LoggedOut => "logged_out",
            ActionType::PasswordChanged => "password_changed",
            ActionType::UserCreated => "user_created",
            ActionType::UserProfileUpdated => "user_profile_updated",
            ActionType::UserDeleted => "user_deleted",
            ActionType::OrganizationCreated => "organization_created",
            ActionType::OrganizationUpdated => "organization_updated",
            ActionType::OrganizationDeleted => "organization_deleted",
            ActionType::OrganizationStatusChanged => "organization_status_changed",
            ActionType::OrganizationMemberAdded => "organization_member_added",
            ActionType::OrganizationMemberUpdated => "organization_member_updated",
            ActionType::OrganizationMemberRemoved => "organization_member_removed",
            ActionType::OrganizationMemberRoleChanged => "organization_member_role_changed",
            ActionType::WorkspaceCreated => "workspace_created",
            ActionType::WorkspaceUpdated => "workspace_updated",
            ActionType::WorkspaceDeleted => "workspace_deleted",
            ActionType::WorkspaceArchived => "workspace_archived",
            ActionType::WorkspaceActivated => "workspace_activated",
            ActionType::WorkspaceClosed => "workspace_closed",
            ActionType::WorkspaceStatusChanged => "workspace_status_changed",
            ActionType::WorkspaceTeamAdded => "workspace_team_added",
            ActionType::WorkspaceTeamUpdated => "workspace_team_updated",
            ActionType::WorkspaceTeamRemoved => "workspace_team_removed",
            ActionType::TeamCreated => "team_created",
            ActionType::TeamUpdated => "team_updated",
            ActionType::TeamDeleted => "team_deleted",
            ActionType::TeamMemberAdded => "team_member_added",
            ActionType::TeamMemberRemoved => "team_member_removed",
            ActionType::TeamMemberRoleChanged => "team_member_role_changed",
            ActionType::EntryCreated => "entry_created",
            ActionType::EntryUpdated => "entry_updated",
            ActionType::EntryDeleted => "entry_deleted",
            ActionType::EntryStatusChanged => "entry_status_changed",
            ActionType::EntrySubmitted => "entry_submitted",
            ActionType::EntryReviewed => "entry_reviewed",
            ActionType::EntryApproved => "entry_approved",
            ActionType::EntryRejected => "entry_rejected",
            ActionType::EntryFlagged => "entry_flagged",
            ActionType::EntryUnflagged => "entry_unflagged",
            ActionType::InvitationSent => "invitation_sent",
            ActionType::InvitationResent => "invitation_resent",
            ActionType::InvitationCanceled => "invitation_canceled",
            ActionType::FileUploaded => "file_uploaded",
            ActionType::FileDownloaded => "file_downloaded",
            ActionType::FileDeleted => "file_deleted",
            ActionType::PermissionGranted => "permission_granted",
            ActionType::PermissionRevoked => "permission_revoked",
            ActionType::PermissionChanged => "permission_changed",
            ActionType::BulkOperationPerformed => "bulk_operation_performed",
            ActionType::DataExported => "data_exported",
            ActionType::OperationFailed => "operation_failed",
            ActionType::AccessDenied => "access_denied",
        }
    }

    /// Retention classification driving cleanup windows
    pub fn retention_category(&self) -> RetentionCategory {
        if self.is_authentication() {
            RetentionCategory::Authentication
        } else if self.is_critical() {
            RetentionCategory::Critical
        } else {
            RetentionCategory::Default
        }
    }

    /// Authentication & authorization events (shortest retention window)
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ActionType::LoginSucceeded
                | ActionType::LoginFailed
                | ActionType::LoggedOut
                | ActionType::PasswordChanged
        )
    }

    /// Policy-designated critical actions (longest retention window)
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            ActionType::UserDeleted
                | ActionType::OrganizationDeleted
                | ActionType::WorkspaceDeleted
                | ActionType::PermissionRevoked
                | ActionType::DataExported
                | ActionType::OperationFailed
        )
    }

    /// The fixed security-related subset used by the query layer
    pub fn is_security_related(&self) -> bool {
        matches!(
            self,
            ActionType::LoginFailed | ActionType::AccessDenied | ActionType::PermissionRevoked
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown action type: {}", s))
    }
}
