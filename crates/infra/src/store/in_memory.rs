use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use screengate_auth::{GrantFlags, GrantSet, ScreenId};
use screengate_core::UserId;

use super::r#trait::{PermissionStore, StoreError};

/// Per-user slot holding an immutable snapshot of the user's grants.
type Slot = Arc<RwLock<Arc<GrantSet>>>;

/// In-memory permission store.
///
/// Intended for tests/dev. Each user owns a slot; a replace swaps the slot's
/// snapshot in one step, so readers of that user see the old or the new set
/// and writers for other users only share the (briefly held) slot index.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    users: RwLock<HashMap<UserId, Slot>>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn existing_slot(&self, user_id: UserId) -> Result<Option<Slot>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&user_id).cloned())
    }

    fn slot(&self, user_id: UserId) -> Result<Slot, StoreError> {
        if let Some(slot) = self.existing_slot(user_id)? {
            return Ok(slot);
        }
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users.entry(user_id).or_default().clone())
    }

    fn snapshot(&self, user_id: UserId) -> Result<Option<Arc<GrantSet>>, StoreError> {
        let Some(slot) = self.existing_slot(user_id)? else {
            return Ok(None);
        };
        let current = slot.read().map_err(|_| poisoned())?;
        Ok(Some(Arc::clone(&*current)))
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl PermissionStore for InMemoryPermissionStore {
    fn get_grants(&self, user_id: UserId) -> Result<GrantSet, StoreError> {
        Ok(self
            .snapshot(user_id)?
            .map(|set| (*set).clone())
            .unwrap_or_default())
    }

    fn get_grant(
        &self,
        user_id: UserId,
        screen_id: &ScreenId,
    ) -> Result<Option<GrantFlags>, StoreError> {
        Ok(self.snapshot(user_id)?.and_then(|set| set.get(screen_id)))
    }

    fn replace_grants(&self, user_id: UserId, grants: GrantSet) -> Result<(), StoreError> {
        let slot = self.slot(user_id)?;
        let mut current = slot.write().map_err(|_| poisoned())?;
        *current = Arc::new(grants);
        Ok(())
    }
}
