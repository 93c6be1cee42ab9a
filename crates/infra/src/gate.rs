//! Request-path authorization.
//!
//! The gate answers "may user U perform action A on screen S?" from the
//! stored grant and the registry. It never writes: a missing grant row is
//! denied, not materialized. Store failures deny and are logged.

use std::sync::Arc;

use screengate_auth::{
    Action, AuthorizationExplanation, ScreenId, ScreenRegistry, can_perform, explain_authorization,
};
use screengate_core::UserId;

use crate::store::PermissionStore;

#[derive(Debug, Clone)]
pub struct AuthorizationGate<S> {
    store: S,
    registry: Arc<ScreenRegistry>,
}

impl<S: PermissionStore> AuthorizationGate<S> {
    pub fn new(store: S, registry: Arc<ScreenRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn can_perform(&self, user_id: UserId, screen_id: &ScreenId, action: Action) -> bool {
        let Some(screen) = self.registry.get(screen_id) else {
            tracing::debug!(user_id = %user_id, screen_id = %screen_id, "unknown screen; denying");
            return false;
        };
        match self.store.get_grant(user_id, screen_id) {
            Ok(grant) => can_perform(grant, Some(screen), action),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    screen_id = %screen_id,
                    action = %action,
                    error = %e,
                    "grant lookup failed; denying"
                );
                false
            }
        }
    }

    pub fn can_view(&self, user_id: UserId, screen_id: &ScreenId) -> bool {
        self.can_perform(user_id, screen_id, Action::View)
    }

    pub fn can_create(&self, user_id: UserId, screen_id: &ScreenId) -> bool {
        self.can_perform(user_id, screen_id, Action::Create)
    }

    pub fn can_edit(&self, user_id: UserId, screen_id: &ScreenId) -> bool {
        self.can_perform(user_id, screen_id, Action::Edit)
    }

    pub fn can_delete(&self, user_id: UserId, screen_id: &ScreenId) -> bool {
        self.can_perform(user_id, screen_id, Action::Delete)
    }

    pub fn can_move(&self, user_id: UserId, screen_id: &ScreenId) -> bool {
        self.can_perform(user_id, screen_id, Action::Move)
    }

    /// Same decision as [`can_perform`](Self::can_perform), with the reason.
    ///
    /// A failed lookup is explained as a missing grant.
    pub fn explain(
        &self,
        user_id: UserId,
        screen_id: &ScreenId,
        action: Action,
    ) -> AuthorizationExplanation {
        let screen = self.registry.get(screen_id);
        let grant = match screen {
            Some(_) => self.store.get_grant(user_id, screen_id).unwrap_or_else(|e| {
                tracing::warn!(user_id = %user_id, screen_id = %screen_id, error = %e, "grant lookup failed");
                None
            }),
            None => None,
        };
        explain_authorization(screen_id, grant, screen, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryPermissionStore, StoreError};
    use screengate_auth::{DenialKind, GrantFlags, GrantSet, Screen};

    fn registry() -> Arc<ScreenRegistry> {
        Arc::new(
            ScreenRegistry::new(vec![
                Screen::new("produtos", "Produtos", "Cadastros"),
                Screen::new("patrimonios", "Patrimônios", "Patrimônio").with_move(),
            ])
            .unwrap(),
        )
    }

    struct Unreachable;

    impl PermissionStore for Unreachable {
        fn get_grants(&self, _: UserId) -> Result<GrantSet, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn get_grant(&self, _: UserId, _: &ScreenId) -> Result<Option<GrantFlags>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn replace_grants(&self, _: UserId, _: GrantSet) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn grants_what_is_stored() {
        let store = InMemoryPermissionStore::arc();
        let user_id = UserId::new();
        let produtos = ScreenId::new("produtos");
        store
            .replace_grants(
                user_id,
                [(produtos.clone(), GrantFlags::DENY_ALL.with(Action::View))]
                    .into_iter()
                    .collect(),
            )
            .unwrap();

        let gate = AuthorizationGate::new(store, registry());
        assert!(gate.can_view(user_id, &produtos));
        assert!(!gate.can_edit(user_id, &produtos));
        assert!(!gate.can_view(UserId::new(), &produtos));
    }

    #[test]
    fn does_not_materialize_missing_grants() {
        let store = InMemoryPermissionStore::arc();
        let user_id = UserId::new();
        let gate = AuthorizationGate::new(store.clone(), registry());

        assert!(!gate.can_view(user_id, &ScreenId::new("patrimonios")));
        assert!(store.get_grants(user_id).unwrap().is_empty());
    }

    #[test]
    fn stale_move_bit_is_denied() {
        let store = InMemoryPermissionStore::arc();
        let user_id = UserId::new();
        let produtos = ScreenId::new("produtos");
        let patrimonios = ScreenId::new("patrimonios");
        let everything = GrantFlags::DENY_ALL.with(Action::View).with(Action::Move);
        store
            .replace_grants(
                user_id,
                [(produtos.clone(), everything), (patrimonios.clone(), everything)]
                    .into_iter()
                    .collect(),
            )
            .unwrap();

        let gate = AuthorizationGate::new(store, registry());
        assert!(!gate.can_move(user_id, &produtos));
        assert!(gate.can_move(user_id, &patrimonios));
    }

    #[test]
    fn store_failure_denies() {
        let gate = AuthorizationGate::new(Unreachable, registry());
        let user_id = UserId::new();
        assert!(!gate.can_view(user_id, &ScreenId::new("produtos")));
        assert_eq!(
            gate.explain(user_id, &ScreenId::new("produtos"), Action::View).denial,
            Some(DenialKind::NoGrant)
        );
    }

    #[test]
    fn unknown_screen_is_explained() {
        let gate = AuthorizationGate::new(InMemoryPermissionStore::new(), registry());
        let explanation = gate.explain(UserId::new(), &ScreenId::new("faturamento"), Action::View);
        assert!(!explanation.granted);
        assert_eq!(explanation.denial, Some(DenialKind::UnknownScreen));
    }
}
