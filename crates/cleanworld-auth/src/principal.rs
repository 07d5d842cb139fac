//! Resolved request identity

use cleanworld_db::{Role, User};
use serde::{Deserialize, Serialize};

/// The authenticated identity resolved for a single request.
///
/// Reconstructed per request from the user record; never persisted by
/// this subsystem. Requests without a valid token simply carry no
/// `Principal` in their extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl Principal {
    /// Build a principal from a stored user record
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }

    /// Self-or-admin rule: may this principal act on the given user's resource?
    pub fn can_act_on_user(&self, target_user_id: i64) -> bool {
        self.user_id == target_user_id || self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(user_id: i64, role: Role) -> Principal {
        Principal {
            user_id,
            email: "ana@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_self_or_admin() {
        // A user may act on their own resource
        assert!(principal(5, Role::User).can_act_on_user(5));
        // But not on somebody else's
        assert!(!principal(5, Role::User).can_act_on_user(6));
        // An admin may act on anyone's
        assert!(principal(1, Role::Admin).can_act_on_user(6));
        // Guests get the same self-only treatment
        assert!(principal(3, Role::Guest).can_act_on_user(3));
        assert!(!principal(3, Role::Guest).can_act_on_user(4));
    }
}
