//! The slice of the external user entity this engine reads.

use serde::{Deserialize, Serialize};

use screengate_core::UserId;

use crate::{RoleKey, RoleLevel, RoleType};

/// Role information for one user, as provided by the user directory.
///
/// Never mutated by this engine; role and level are lookup keys for
/// default grants and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub role_type: RoleType,
    pub role_level: RoleLevel,
    /// Inactive users are skipped by bulk sync.
    pub active: bool,
}

impl UserProfile {
    pub fn role_key(&self) -> RoleKey {
        RoleKey::new(self.role_type.clone(), self.role_level)
    }
}
