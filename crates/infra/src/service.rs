//! Grant mutation pipeline.
//!
//! Every mutation of a user's grants goes through [`PermissionService`]:
//!
//! ```text
//! save / reset / sync
//!   ↓
//! 1. Build the candidate set (validated payload, role defaults, or reconcile)
//!   ↓
//! 2. Read the stored set (audit baseline)
//!   ↓
//! 3. Atomically replace the stored set
//!   ↓
//! 4. Diff baseline → candidate and hand the record to the audit sink
//! ```
//!
//! Nothing is written when validation fails, and nothing is audited when the
//! write fails. Audit sink failures never undo a committed write.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use screengate_auth::{
    AuditContext, AuditRecord, GrantFlags, GrantPayload, GrantSet, ScreenId, ScreenRegistry,
    SyncPlan, TemplateCatalog, UserProfile, reconcile_with_plan, resolve_defaults, update_record,
};
use screengate_core::{DomainError, UserId};

use crate::audit_sink::AuditSink;
use crate::directory::UserDirectory;
use crate::store::{PermissionStore, StoreError};

/// The single failure signal surfaced to callers of grant mutations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The candidate was rejected; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store could not be read or written; nothing was written.
    #[error("permission store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => ServiceError::StoreUnavailable(format!("corrupt data: {msg}")),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::Conflict(msg) => ServiceError::Validation(msg),
            DomainError::NotFound => ServiceError::Validation("not found".to_string()),
        }
    }
}

/// One registry screen as shown in the grant editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditableGrant {
    pub screen_id: ScreenId,
    pub label: String,
    pub group: String,
    pub flags: GrantFlags,
    /// `false` when no row exists yet and `flags` is a deny-all placeholder.
    pub materialized: bool,
}

/// Result of syncing a single user.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub plan: SyncPlan,
    /// `None` when the user was already in sync and nothing was written.
    pub record: Option<AuditRecord>,
}

/// Totals for a bulk sync over every active user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub users_checked: usize,
    pub users_updated: usize,
    pub screens_added: usize,
    pub screens_removed: usize,
    /// Users whose sync failed; the rest were still processed.
    pub failed: Vec<UserId>,
}

/// Application service composing store, directory, audit sink and the
/// read-only registry/templates snapshot.
#[derive(Debug)]
pub struct PermissionService<S, A, D> {
    store: S,
    audit: A,
    directory: D,
    registry: Arc<ScreenRegistry>,
    templates: Arc<TemplateCatalog>,
}

impl<S, A, D> PermissionService<S, A, D> {
    pub fn new(
        store: S,
        audit: A,
        directory: D,
        registry: Arc<ScreenRegistry>,
        templates: Arc<TemplateCatalog>,
    ) -> Self {
        Self {
            store,
            audit,
            directory,
            registry,
            templates,
        }
    }

    pub fn registry(&self) -> &ScreenRegistry {
        &self.registry
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, A, D> PermissionService<S, A, D>
where
    S: PermissionStore,
    A: AuditSink,
    D: UserDirectory,
{
    pub fn load_grants(&self, user_id: UserId) -> Result<GrantSet, ServiceError> {
        Ok(self.store.get_grants(user_id)?)
    }

    /// Registry-ordered view of a user's grants with every screen present.
    ///
    /// Screens without a stored row show as deny-all with
    /// `materialized: false`. Rows for screens no longer registered are
    /// not shown.
    pub fn load_for_editing(&self, user_id: UserId) -> Result<Vec<EditableGrant>, ServiceError> {
        let grants = self.store.get_grants(user_id)?;
        Ok(self
            .registry
            .iter()
            .map(|screen| {
                let stored = grants.get(&screen.id);
                EditableGrant {
                    screen_id: screen.id.clone(),
                    label: screen.label.clone(),
                    group: screen.group.clone(),
                    flags: stored.unwrap_or(GrantFlags::DENY_ALL),
                    materialized: stored.is_some(),
                }
            })
            .collect())
    }

    /// Replace a user's grants with an edited candidate set.
    #[instrument(skip(self, candidate), fields(actor = %actor, user_id = %user_id, grant_count = candidate.len()), err)]
    pub fn save(
        &self,
        actor: UserId,
        user_id: UserId,
        candidate: GrantSet,
    ) -> Result<AuditRecord, ServiceError> {
        candidate.validate(&self.registry)?;
        self.replace_and_audit(actor, user_id, candidate)
    }

    /// Decode a transport payload and [`save`](Self::save) it.
    pub fn save_payload(
        &self,
        actor: UserId,
        user_id: UserId,
        payload: GrantPayload,
    ) -> Result<AuditRecord, ServiceError> {
        let candidate = payload.into_grant_set()?;
        self.save(actor, user_id, candidate)
    }

    /// Overwrite a user's grants with the role defaults, discarding overrides.
    ///
    /// A user missing from the directory resets to deny-all.
    #[instrument(skip(self), fields(actor = %actor, user_id = %user_id), err)]
    pub fn reset(&self, actor: UserId, user_id: UserId) -> Result<AuditRecord, ServiceError> {
        let defaults = self.defaults_for(user_id)?;
        self.replace_and_audit(actor, user_id, defaults)
    }

    /// Bring a user's grants in line with the current registry, keeping
    /// overrides on existing screens. Writes nothing when already in sync.
    #[instrument(skip(self), fields(actor = %actor, user_id = %user_id), err)]
    pub fn sync(&self, actor: UserId, user_id: UserId) -> Result<SyncOutcome, ServiceError> {
        let defaults = self.defaults_for(user_id)?;
        self.sync_with_defaults(actor, user_id, &defaults)
    }

    /// Sync every active user in the directory.
    ///
    /// Per-user failures are logged and collected; they do not stop the run.
    #[instrument(skip(self), fields(actor = %actor), err)]
    pub fn sync_all_users(&self, actor: UserId) -> Result<SyncSummary, ServiceError> {
        let users = self.directory.active_users()?;
        let mut summary = SyncSummary {
            users_checked: users.len(),
            ..SyncSummary::default()
        };

        for profile in users {
            let defaults = self.defaults_for_profile(Some(&profile));
            match self.sync_with_defaults(actor, profile.user_id, &defaults) {
                Ok(outcome) => {
                    if outcome.record.is_some() {
                        summary.users_updated += 1;
                        summary.screens_added += outcome.plan.added.len();
                        summary.screens_removed += outcome.plan.removed.len();
                    }
                }
                Err(e) => {
                    tracing::warn!(user_id = %profile.user_id, error = %e, "user sync failed");
                    summary.failed.push(profile.user_id);
                }
            }
        }

        tracing::info!(
            users_checked = summary.users_checked,
            users_updated = summary.users_updated,
            screens_added = summary.screens_added,
            screens_removed = summary.screens_removed,
            failed = summary.failed.len(),
            "bulk sync finished"
        );
        Ok(summary)
    }

    fn sync_with_defaults(
        &self,
        actor: UserId,
        user_id: UserId,
        defaults: &GrantSet,
    ) -> Result<SyncOutcome, ServiceError> {
        let current = self.store.get_grants(user_id)?;
        let (reconciled, plan) = reconcile_with_plan(&current, &self.registry, defaults);
        if plan.is_empty() {
            return Ok(SyncOutcome { plan, record: None });
        }

        self.store.replace_grants(user_id, reconciled.clone())?;
        let record = self.emit(actor, user_id, &current, &reconciled);
        Ok(SyncOutcome {
            plan,
            record: Some(record),
        })
    }

    fn defaults_for(&self, user_id: UserId) -> Result<GrantSet, ServiceError> {
        let profile = self.directory.profile(user_id)?;
        if profile.is_none() {
            tracing::warn!(user_id = %user_id, "user not in directory; using deny-all defaults");
        }
        Ok(self.defaults_for_profile(profile.as_ref()))
    }

    fn defaults_for_profile(&self, profile: Option<&UserProfile>) -> GrantSet {
        match profile {
            Some(p) => self
                .templates
                .resolve_defaults(&p.role_type, p.role_level, &self.registry),
            None => resolve_defaults(None, &self.registry),
        }
    }

    fn replace_and_audit(
        &self,
        actor: UserId,
        user_id: UserId,
        candidate: GrantSet,
    ) -> Result<AuditRecord, ServiceError> {
        let before = self.store.get_grants(user_id)?;
        self.store.replace_grants(user_id, candidate.clone())?;
        Ok(self.emit(actor, user_id, &before, &candidate))
    }

    fn emit(&self, actor: UserId, user_id: UserId, before: &GrantSet, after: &GrantSet) -> AuditRecord {
        let record = update_record(AuditContext::new(actor, Utc::now()), user_id, before, after);
        self.audit.record(record.clone());
        record
    }
}
