//! User directory: the role profile of each user.
//!
//! The engine only reads role type, role level and the active flag; user
//! management itself lives elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::{PgPool, Row};
use tracing::instrument;

use screengate_auth::{RoleLevel, RoleType, UserProfile};
use screengate_core::UserId;

use crate::store::StoreError;
use crate::store::postgres::{block_on, map_sqlx_error};

pub trait UserDirectory: Send + Sync {
    fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Every active user, in no particular order.
    fn active_users(&self) -> Result<Vec<UserProfile>, StoreError>;
}

impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        (**self).profile(user_id)
    }

    fn active_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        (**self).active_users()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, profile: UserProfile) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        users.insert(profile.user_id, profile);
        Ok(())
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(users.get(&user_id).cloned())
    }

    fn active_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(users.values().filter(|p| p.active).cloned().collect())
    }
}

/// Reads profiles from the `users` table.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: Arc<PgPool>,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn load_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT id, role_type, role_level, active FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_profile", e))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn load_active_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, role_type, role_level, active FROM users WHERE active ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_active_users", e))?;

        rows.iter().map(profile_from_row).collect()
    }
}

fn profile_from_row(row: &sqlx::postgres::PgRow) -> Result<UserProfile, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Corrupt(format!("failed to decode user row: {e}"));
    let user_id = UserId::from_uuid(row.try_get("id").map_err(decode)?);
    let level: String = row.try_get("role_level").map_err(decode)?;
    let role_level: RoleLevel = level
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("user {user_id}: {e}")))?;

    Ok(UserProfile {
        user_id,
        role_type: RoleType::new(row.try_get::<String, _>("role_type").map_err(decode)?),
        role_level,
        active: row.try_get("active").map_err(decode)?,
    })
}

impl UserDirectory for PostgresUserDirectory {
    fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        block_on(self.load_profile(user_id))
    }

    fn active_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        block_on(self.load_active_users())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(active: bool) -> UserProfile {
        UserProfile {
            user_id: UserId::new(),
            role_type: RoleType::new("administrador"),
            role_level: RoleLevel::II,
            active,
        }
    }

    #[test]
    fn active_users_skips_inactive() {
        let directory = InMemoryUserDirectory::new();
        let active = profile(true);
        directory.upsert(active.clone()).unwrap();
        directory.upsert(profile(false)).unwrap();

        assert_eq!(directory.active_users().unwrap(), vec![active.clone()]);
        assert_eq!(directory.profile(active.user_id).unwrap(), Some(active));
    }
}
