//! Postgres-backed permission store.
//!
//! ## Schema
//!
//! One row per (user, screen) in `user_screen_grants`, primary key
//! `(user_id, screen_id)`. See `migrations/`.
//!
//! ## Replace semantics
//!
//! `replace_grants` runs a single transaction:
//!
//! 1. take a transaction-scoped advisory lock keyed on the user id
//! 2. delete every row of the user
//! 3. insert the new rows in one statement
//! 4. commit
//!
//! The advisory lock serializes writers of the same user (last write wins)
//! while writers of different users proceed independently. Readers see the
//! committed state only, so they never observe a half-replaced set.
//!
//! The transaction runs on a spawned task: dropping the caller's future
//! cannot leave it half-applied.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database / PoolClosed / Io / other | `Unavailable` |
//! | Row decode failure, duplicate screen rows | `Corrupt` |

use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use screengate_auth::{Grant, GrantFlags, GrantSet, ScreenId};
use screengate_core::UserId;

use super::r#trait::{PermissionStore, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresPermissionStore {
    pool: Arc<PgPool>,
}

impl PostgresPermissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }

    #[instrument(skip(self), fields(user_id = %user_id, grant_count = tracing::field::Empty), err)]
    pub async fn load_grants(&self, user_id: UserId) -> Result<GrantSet, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, screen_id, can_view, can_create, can_edit, can_delete, can_move
            FROM user_screen_grants
            WHERE user_id = $1
            ORDER BY screen_id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_grants", e))?;

        let grants = rows
            .iter()
            .map(grant_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let set = GrantSet::from_rows(grants).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Span::current().record("grant_count", set.len());
        Ok(set)
    }

    #[instrument(skip(self), fields(user_id = %user_id, screen_id = %screen_id), err)]
    pub async fn load_grant(
        &self,
        user_id: UserId,
        screen_id: &ScreenId,
    ) -> Result<Option<GrantFlags>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, screen_id, can_view, can_create, can_edit, can_delete, can_move
            FROM user_screen_grants
            WHERE user_id = $1 AND screen_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(screen_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_grant", e))?;

        row.as_ref()
            .map(grant_from_row)
            .transpose()
            .map(|grant| grant.map(|g| g.flags))
    }

    #[instrument(skip(self, grants), fields(user_id = %user_id, grant_count = grants.len()), err)]
    pub async fn store_grants(&self, user_id: UserId, grants: GrantSet) -> Result<(), StoreError> {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move { replace_in_transaction(&pool, user_id, grants).await })
            .await
            .map_err(|e| StoreError::Unavailable(format!("replace task failed: {e}")))?
    }
}

async fn replace_in_transaction(
    pool: &PgPool,
    user_id: UserId,
    grants: GrantSet,
) -> Result<(), StoreError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| map_sqlx_error("begin_transaction", e))?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_user", e))?;

    sqlx::query("DELETE FROM user_screen_grants WHERE user_id = $1")
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_grants", e))?;

    if !grants.is_empty() {
        let mut screens = Vec::with_capacity(grants.len());
        let mut columns: [Vec<bool>; 5] = Default::default();
        for (screen_id, flags) in grants.iter() {
            screens.push(screen_id.to_string());
            columns[0].push(flags.can_view);
            columns[1].push(flags.can_create);
            columns[2].push(flags.can_edit);
            columns[3].push(flags.can_delete);
            columns[4].push(flags.can_move);
        }
        let [view, create, edit, delete, mv] = columns;

        sqlx::query(
            r#"
            INSERT INTO user_screen_grants
                (user_id, screen_id, can_view, can_create, can_edit, can_delete, can_move)
            SELECT $1, * FROM UNNEST($2::text[], $3::bool[], $4::bool[], $5::bool[], $6::bool[], $7::bool[])
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(screens)
        .bind(view)
        .bind(create)
        .bind(edit)
        .bind(delete)
        .bind(mv)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_grants", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit", e))
}

fn grant_from_row(row: &sqlx::postgres::PgRow) -> Result<Grant, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Corrupt(format!("failed to decode grant row: {e}"));
    Ok(Grant {
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(decode)?),
        screen_id: ScreenId::new(row.try_get::<String, _>("screen_id").map_err(decode)?),
        flags: GrantFlags {
            can_view: row.try_get("can_view").map_err(decode)?,
            can_create: row.try_get("can_create").map_err(decode)?,
            can_edit: row.try_get("can_edit").map_err(decode)?,
            can_delete: row.try_get("can_delete").map_err(decode)?,
            can_move: row.try_get("can_move").map_err(decode)?,
        },
    })
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Unavailable(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("decode error in {operation}: {err}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

/// Run a store future from synchronous trait code.
///
/// Requires a multi-threaded tokio runtime; the worker is moved off the
/// scheduler while it waits.
pub(crate) fn block_on<F, T>(future: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Unavailable(
            "postgres store requires a tokio runtime; call from within a runtime context"
                .to_string(),
        )
    })?;
    tokio::task::block_in_place(|| handle.block_on(future))
}

impl PermissionStore for PostgresPermissionStore {
    fn get_grants(&self, user_id: UserId) -> Result<GrantSet, StoreError> {
        block_on(self.load_grants(user_id))
    }

    fn get_grant(
        &self,
        user_id: UserId,
        screen_id: &ScreenId,
    ) -> Result<Option<GrantFlags>, StoreError> {
        block_on(self.load_grant(user_id, screen_id))
    }

    fn replace_grants(&self, user_id: UserId, grants: GrantSet) -> Result<(), StoreError> {
        block_on(self.store_grants(user_id, grants))
    }
}
