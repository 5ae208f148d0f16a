//! Role and ownership checks applied by every protected handler.

use tracing::warn;
use uuid::Uuid;

use super::extractors::AuthUser;
use crate::{error::AppError, users::repo_types::Role};

pub fn require_role(caller: &AuthUser, required: Role) -> Result<(), AppError> {
    if caller.role.satisfies(required) {
        Ok(())
    } else {
        warn!(user_id = %caller.id, role = caller.role.as_str(), required = required.as_str(), "role check failed");
        Err(AppError::Forbidden(format!("{} role required", required.as_str())))
    }
}

/// Passes when the caller is the owner of `owner_id` or an admin.
pub fn ensure_self_or_admin(caller: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if caller.id == owner_id || caller.role == Role::Admin {
        Ok(())
    } else {
        warn!(user_id = %caller.id, target = %owner_id, "ownership check failed");
        Err(AppError::Forbidden("You can only access your own data".into()))
    }
}
