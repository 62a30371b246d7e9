/// Authorization helpers and permission checks
///
/// The permission model is role-based with strict subtree scoping:
///
/// 1. **Role gates**: Each operation names the roles allowed to call it
/// 2. **Scope narrowing**: Non-admin callers only ever see their own subtree
/// 3. **No existence leaks**: A record outside the caller's subtree answers
///    exactly like a record that doesn't exist
///
/// # Example
///
/// ```
/// use canvass_shared::auth::authorization::require_role;
/// use canvass_shared::auth::middleware::AuthContext;
/// use canvass_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: Uuid::new_v4(), role: Role::Admin };
/// assert!(require_role(&auth, Role::Admin).is_ok());
/// assert!(require_role(&auth, Role::Pillar).is_err());
/// ```

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller doesn't have the required role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    RoleMismatch { required: Role, actual: Role },

    /// Caller's account has no profile row for its role
    #[error("No {0:?} profile for this account")]
    MissingProfile(Role),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks that the caller has exactly the given role
///
/// # Errors
///
/// Returns `AuthzError::RoleMismatch` otherwise.
pub fn require_role(auth: &AuthContext, required: Role) -> Result<(), AuthzError> {
    if auth.role == required {
        Ok(())
    } else {
        Err(AuthzError::RoleMismatch {
            required,
            actual: auth.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&ctx(Role::Admin), Role::Admin).is_ok());

        let err = require_role(&ctx(Role::Pillar), Role::Admin).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::RoleMismatch {
                required: Role::Admin,
                actual: Role::Pillar,
            }
        ));
    }
}
