use crate::auth::extractors::CurrentUser;
use crate::error::AppError;
use crate::models::Role;

/// Administrative capabilities gated by role.
///
/// Authorization decisions go through this module instead of inline role
/// comparisons in each handler; the denial message stays specific to the
/// operation that was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create accounts via register/create-user.
    ManageUsers,
    /// List every task in the system, with filtering.
    ViewAllTasks,
    /// Replace any field of any task by id.
    ReplaceAnyTask,
    /// Permanently delete any task.
    DeleteAnyTask,
    /// Read the per-status task counts.
    ViewStats,
}

impl Capability {
    fn denial_message(self) -> &'static str {
        match self {
            Capability::ManageUsers => "Only admin can register users",
            Capability::ViewAllTasks | Capability::ViewStats => "Access denied. Admins only.",
            Capability::ReplaceAnyTask => "Access denied",
            Capability::DeleteAnyTask => "Only admin can delete tasks",
        }
    }
}

/// Whether the caller holds the capability. Every capability here is
/// administrative, so this reduces to a role check in one place.
pub fn allows(user: &CurrentUser, _capability: Capability) -> bool {
    user.role == Role::Admin
}

/// Requires the capability, failing with `Forbidden` and the
/// operation-specific message otherwise.
pub fn require(user: &CurrentUser, capability: Capability) -> Result<(), AppError> {
    if allows(user, capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden(capability.denial_message().into()))
    }
}
