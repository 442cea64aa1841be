//! Authorization gates applied by the handlers after authentication.

use crate::{auth::AuthUser, error::ApiError};

/// Role gate: only admins pass. Guards every category mutation.
pub fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Require Admin Role!".to_string()))
    }
}

/// Ownership-or-admin gate for article mutations. `action` names the attempted
/// operation in the rejection message ("update", "delete").
///
/// Must only be called once the article is known to exist, so a missing article is
/// reported as 404 rather than 403.
pub fn require_owner_or_admin(
    user: &AuthUser,
    owner_id: i64,
    action: &str,
) -> Result<(), ApiError> {
    if user.id == owner_id || user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Not authorized to {action} this article"
        )))
    }
}
