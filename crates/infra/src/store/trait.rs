use std::sync::Arc;

use thiserror::Error;

use screengate_auth::{GrantFlags, GrantSet, ScreenId};
use screengate_core::UserId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Persistence layer unreachable or the transaction failed.
    #[error("permission store unavailable: {0}")]
    Unavailable(String),

    /// Stored data violates the grant model (e.g. duplicate rows, bad level).
    #[error("corrupt permission data: {0}")]
    Corrupt(String),
}

/// Persistent (user, screen) → grant mapping.
///
/// Emitting audit records is the caller's job, never the store's.
pub trait PermissionStore: Send + Sync {
    /// All grants for a user. An unknown user yields an empty set.
    fn get_grants(&self, user_id: UserId) -> Result<GrantSet, StoreError>;

    /// The grant for one screen, if a row exists.
    fn get_grant(
        &self,
        user_id: UserId,
        screen_id: &ScreenId,
    ) -> Result<Option<GrantFlags>, StoreError>;

    /// Atomically replace every grant row of a user.
    ///
    /// Concurrent replaces for the same user are last-write-wins; replaces
    /// for different users must not block each other.
    fn replace_grants(&self, user_id: UserId, grants: GrantSet) -> Result<(), StoreError>;
}

impl<S> PermissionStore for Arc<S>
where
    S: PermissionStore + ?Sized,
{
    fn get_grants(&self, user_id: UserId) -> Result<GrantSet, StoreError> {
        (**self).get_grants(user_id)
    }

    fn get_grant(
        &self,
        user_id: UserId,
        screen_id: &ScreenId,
    ) -> Result<Option<GrantFlags>, StoreError> {
        (**self).get_grant(user_id, screen_id)
    }

    fn replace_grants(&self, user_id: UserId, grants: GrantSet) -> Result<(), StoreError> {
        (**self).replace_grants(user_id, grants)
    }
}
