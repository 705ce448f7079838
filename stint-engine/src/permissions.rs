//! Role-based permission checks.
//!
//! The table is deliberately static: roles are few and the sets small, so
//! a match on slices beats any map. Students hold no explicit grants;
//! their own records are accessible through their portal regardless.

use crate::entities::{Profile, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    // User management
    ManageAllUsers,
    CreateInternAccount,
    DeleteUser,
    // Operational
    ApproveLogs,
    AssignTasks,
    EvaluateStudent,
    ManageResources,
    PostAnnouncement,
    ScheduleMeeting,
    // System
    ManageSystem,
    ViewAdminDashboard,
    ViewSupervisorDashboard,
}

/// Permission set granted to a role.
pub const fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => &[
            Permission::ManageAllUsers,
            Permission::CreateInternAccount,
            Permission::DeleteUser,
            Permission::ManageSystem,
            Permission::ViewAdminDashboard,
            Permission::PostAnnouncement,
            // Approval override
            Permission::ApproveLogs,
            Permission::AssignTasks,
            Permission::ManageResources,
        ],
        Role::Supervisor => &[
            Permission::ViewSupervisorDashboard,
            Permission::CreateInternAccount,
            Permission::ApproveLogs,
            Permission::AssignTasks,
            Permission::EvaluateStudent,
            Permission::ManageResources,
            Permission::PostAnnouncement,
            Permission::ScheduleMeeting,
        ],
        Role::Student => &[],
    }
}

pub fn has_permission(profile: &Profile, permission: Permission) -> bool {
    role_permissions(profile.role).contains(&permission)
}
