//! Grant model: per-user, per-screen five-action permission records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use screengate_core::{DomainError, DomainResult, UserId, ValueObject};

use crate::{Action, ActionSet, ScreenId, ScreenRegistry};

/// The five booleans stored for one (user, screen) pair.
///
/// Missing fields deserialize as `false`; legacy Portuguese field names are
/// accepted as aliases.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantFlags {
    #[serde(alias = "pode_visualizar", alias = "visualizar")]
    pub can_view: bool,
    #[serde(alias = "pode_criar", alias = "criar")]
    pub can_create: bool,
    #[serde(alias = "pode_editar", alias = "editar")]
    pub can_edit: bool,
    #[serde(alias = "pode_excluir", alias = "excluir")]
    pub can_delete: bool,
    #[serde(alias = "pode_movimentar", alias = "movimentar")]
    pub can_move: bool,
}

impl ValueObject for GrantFlags {}

impl GrantFlags {
    pub const DENY_ALL: GrantFlags = GrantFlags {
        can_view: false,
        can_create: false,
        can_edit: false,
        can_delete: false,
        can_move: false,
    };

    pub fn from_actions(actions: ActionSet) -> Self {
        let mut flags = Self::DENY_ALL;
        for action in actions.iter() {
            flags.set(action, true);
        }
        flags
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
            Action::Move => self.can_move,
        }
    }

    pub fn set(&mut self, action: Action, value: bool) {
        match action {
            Action::View => self.can_view = value,
            Action::Create => self.can_create = value,
            Action::Edit => self.can_edit = value,
            Action::Delete => self.can_delete = value,
            Action::Move => self.can_move = value,
        }
    }

    pub fn with(mut self, action: Action) -> Self {
        self.set(action, true);
        self
    }

    /// Granted actions as a set.
    pub fn actions(&self) -> ActionSet {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }

    /// Drop every granted action the screen does not support.
    pub fn restricted_to(&self, supported: &ActionSet) -> Self {
        Self::from_actions(self.actions().intersection(supported))
    }

    pub fn any(&self) -> bool {
        !self.actions().is_empty()
    }

    /// Build from loosely named fields (`can_view`, `pode_visualizar`, `editar`, ...).
    ///
    /// Unknown field names are rejected; absent fields are `false`. A field
    /// repeated under two spellings takes the last value.
    pub fn from_fields(
        fields: impl IntoIterator<Item = (String, bool)>,
    ) -> DomainResult<Self> {
        let mut flags = Self::DENY_ALL;
        for (name, value) in fields {
            flags.set(name.parse()?, value);
        }
        Ok(flags)
    }
}

/// One persisted grant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub user_id: UserId,
    pub screen_id: ScreenId,
    #[serde(flatten)]
    pub flags: GrantFlags,
}

/// A user's full grant set, keyed by screen.
///
/// At most one entry per screen. A screen with no entry is "not yet
/// materialized"; an all-false entry is "explicitly denied". Both deny.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantSet {
    grants: BTreeMap<ScreenId, GrantFlags>,
}

impl GrantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows; a screen appearing twice is rejected.
    pub fn from_rows(rows: impl IntoIterator<Item = Grant>) -> DomainResult<Self> {
        let mut set = Self::new();
        for row in rows {
            if set.insert(row.screen_id.clone(), row.flags).is_some() {
                return Err(DomainError::invariant(format!(
                    "user {} has more than one grant for screen '{}'",
                    row.user_id, row.screen_id
                )));
            }
        }
        Ok(set)
    }

    pub fn to_rows(&self, user_id: UserId) -> Vec<Grant> {
        self.grants
            .iter()
            .map(|(screen_id, flags)| Grant {
                user_id,
                screen_id: screen_id.clone(),
                flags: *flags,
            })
            .collect()
    }

    pub fn get(&self, screen_id: &ScreenId) -> Option<GrantFlags> {
        self.grants.get(screen_id).copied()
    }

    pub fn insert(&mut self, screen_id: ScreenId, flags: GrantFlags) -> Option<GrantFlags> {
        self.grants.insert(screen_id, flags)
    }

    pub fn remove(&mut self, screen_id: &ScreenId) -> Option<GrantFlags> {
        self.grants.remove(screen_id)
    }

    pub fn contains(&self, screen_id: &ScreenId) -> bool {
        self.grants.contains_key(screen_id)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScreenId, &GrantFlags)> {
        self.grants.iter()
    }

    pub fn screens(&self) -> impl Iterator<Item = &ScreenId> {
        self.grants.keys()
    }

    /// Absent screens deny every action.
    pub fn allows(&self, screen_id: &ScreenId, action: Action) -> bool {
        self.get(screen_id).is_some_and(|f| f.allows(action))
    }

    /// Number of screens on which at least one action is granted.
    pub fn granted_screen_count(&self) -> usize {
        self.grants.values().filter(|f| f.any()).count()
    }

    /// Check a candidate set against the registry before it is persisted.
    ///
    /// Rejects unknown screens and any granted action the screen does not
    /// support (most commonly `can_move` on a non-movement screen).
    pub fn validate(&self, registry: &ScreenRegistry) -> DomainResult<()> {
        for (screen_id, flags) in &self.grants {
            let Some(screen) = registry.get(screen_id) else {
                return Err(DomainError::unknown_screen(screen_id));
            };
            if let Some(action) = flags.actions().iter().find(|a| !screen.supports(*a)) {
                return Err(DomainError::unsupported_action(screen_id, action));
            }
        }
        Ok(())
    }
}

impl FromIterator<(ScreenId, GrantFlags)> for GrantSet {
    fn from_iter<I: IntoIterator<Item = (ScreenId, GrantFlags)>>(iter: I) -> Self {
        Self {
            grants: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for GrantSet {
    type Item = (ScreenId, GrantFlags);
    type IntoIter = std::collections::btree_map::IntoIter<ScreenId, GrantFlags>;

    fn into_iter(self) -> Self::IntoIter {
        self.grants.into_iter()
    }
}

/// Row-per-action wire encoding: `{"screen": "produtos", "action": "edit", "value": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    #[serde(alias = "tela")]
    pub screen: String,
    #[serde(alias = "acao")]
    pub action: String,
    #[serde(alias = "valor")]
    pub value: bool,
}

/// Row-per-screen wire encoding: `{"tela": "produtos", "pode_visualizar": true, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRow {
    #[serde(alias = "tela")]
    pub screen: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, bool>,
}

/// A save payload as submitted by a screen.
///
/// Three encodings exist in the wild. All decode into the same canonical
/// [`GrantSet`]; none of them is a second data model. Field and action names
/// go through [`Action`]'s parser, so a misspelled name is a validation error
/// rather than a silently dropped bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrantPayload {
    /// `{"produtos": {"can_view": true, ...}, ...}`
    ByScreen(BTreeMap<String, BTreeMap<String, bool>>),
    /// `[{"screen": "produtos", "action": "view", "value": true}, ...]`
    ByAction(Vec<ActionRow>),
    /// `[{"tela": "produtos", "pode_visualizar": true, ...}, ...]`
    ByRow(Vec<FlagRow>),
}

impl GrantPayload {
    /// Decode into a grant set.
    ///
    /// In `ByAction`, later rows win when an action repeats. In `ByRow`, a
    /// screen may appear only once.
    pub fn into_grant_set(self) -> DomainResult<GrantSet> {
        match self {
            GrantPayload::ByScreen(map) => map
                .into_iter()
                .map(|(screen, fields)| -> DomainResult<(ScreenId, GrantFlags)> {
                    Ok((ScreenId::new(screen), GrantFlags::from_fields(fields)?))
                })
                .collect(),
            GrantPayload::ByAction(rows) => {
                let mut set = GrantSet::new();
                for row in rows {
                    let action: Action = row.action.parse()?;
                    let screen_id = ScreenId::new(row.screen);
                    let mut flags = set.get(&screen_id).unwrap_or(GrantFlags::DENY_ALL);
                    flags.set(action, row.value);
                    set.insert(screen_id, flags);
                }
                Ok(set)
            }
            GrantPayload::ByRow(rows) => {
                let mut set = GrantSet::new();
                for row in rows {
                    let flags = GrantFlags::from_fields(row.fields)?;
                    let screen_id = ScreenId::new(row.screen);
                    if set.contains(&screen_id) {
                        return Err(DomainError::validation(format!(
                            "screen '{screen_id}' appears more than once"
                        )));
                    }
                    set.insert(screen_id, flags);
                }
                Ok(set)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Screen;

    fn registry() -> ScreenRegistry {
        ScreenRegistry::new(vec![
            Screen::new("produtos", "Produtos", "Cadastros"),
            Screen::new("patrimonios", "Patrimônios", "Patrimônio").with_move(),
        ])
        .unwrap()
    }

    #[test]
    fn absent_screen_denies_everything() {
        let set = GrantSet::new();
        for action in Action::ALL {
            assert!(!set.allows(&ScreenId::new("produtos"), action));
        }
    }

    #[test]
    fn validate_rejects_unknown_screen() {
        let set: GrantSet = [(ScreenId::new("faturamento"), GrantFlags::DENY_ALL)]
            .into_iter()
            .collect();
        let err = set.validate(&registry()).unwrap_err();
        assert_eq!(err, DomainError::validation("unknown screen 'faturamento'"));
    }

    #[test]
    fn validate_rejects_move_on_non_movement_screen() {
        let set: GrantSet = [(
            ScreenId::new("produtos"),
            GrantFlags::DENY_ALL.with(Action::View).with(Action::Move),
        )]
        .into_iter()
        .collect();
        let err = set.validate(&registry()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("'move'")));
    }

    #[test]
    fn validate_accepts_move_on_asset_screen() {
        let set: GrantSet = [(
            ScreenId::new("patrimonios"),
            GrantFlags::DENY_ALL.with(Action::View).with(Action::Move),
        )]
        .into_iter()
        .collect();
        assert!(set.validate(&registry()).is_ok());
    }

    #[test]
    fn from_rows_rejects_duplicate_screen() {
        let user_id = UserId::new();
        let row = Grant {
            user_id,
            screen_id: ScreenId::new("produtos"),
            flags: GrantFlags::DENY_ALL,
        };
        let err = GrantSet::from_rows(vec![row.clone(), row]).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn counts_only_screens_with_some_access() {
        let set: GrantSet = [
            (ScreenId::new("produtos"), GrantFlags::DENY_ALL.with(Action::View)),
            (ScreenId::new("patrimonios"), GrantFlags::DENY_ALL),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.granted_screen_count(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn decodes_boolean_per_field_payload_with_legacy_names() {
        let payload: GrantPayload = serde_json::from_str(
            r#"{"produtos": {"pode_visualizar": true, "can_edit": true}}"#,
        )
        .unwrap();
        let set = payload.into_grant_set().unwrap();
        let flags = set.get(&ScreenId::new("produtos")).unwrap();
        assert!(flags.can_view);
        assert!(flags.can_edit);
        assert!(!flags.can_delete);
    }

    #[test]
    fn decodes_row_per_action_payload() {
        let payload: GrantPayload = serde_json::from_str(
            r#"[
                {"tela": "produtos", "acao": "visualizar", "valor": true},
                {"screen": "produtos", "action": "delete", "value": true},
                {"screen": "produtos", "action": "delete", "value": false}
            ]"#,
        )
        .unwrap();
        let set = payload.into_grant_set().unwrap();
        assert_eq!(
            set.get(&ScreenId::new("produtos")),
            Some(GrantFlags::DENY_ALL.with(Action::View))
        );
    }

    #[test]
    fn misspelled_field_in_screen_payload_is_rejected() {
        let payload: GrantPayload = serde_json::from_str(
            r#"{"produtos": {"can_view": true, "can_delet": true}}"#,
        )
        .unwrap();
        let err = payload.into_grant_set().unwrap_err();
        assert_eq!(err, DomainError::validation("unknown action 'can_delet'"));
    }

    #[test]
    fn decodes_flag_row_payload() {
        let payload: GrantPayload = serde_json::from_str(
            r#"[
                {"tela": "produtos", "pode_visualizar": true, "pode_criar": false,
                 "pode_editar": true, "pode_excluir": false},
                {"tela": "patrimonios", "pode_visualizar": true, "pode_movimentar": true}
            ]"#,
        )
        .unwrap();
        assert!(matches!(payload, GrantPayload::ByRow(_)));

        let set = payload.into_grant_set().unwrap();
        assert_eq!(
            set.get(&ScreenId::new("produtos")),
            Some(GrantFlags::DENY_ALL.with(Action::View).with(Action::Edit))
        );
        assert_eq!(
            set.get(&ScreenId::new("patrimonios")),
            Some(GrantFlags::DENY_ALL.with(Action::View).with(Action::Move))
        );
    }

    #[test]
    fn flag_row_payload_rejects_repeated_screen_and_unknown_field() {
        let repeated: GrantPayload = serde_json::from_str(
            r#"[{"tela": "produtos", "pode_visualizar": true},
                {"tela": "produtos", "pode_excluir": true}]"#,
        )
        .unwrap();
        assert!(matches!(
            repeated.into_grant_set(),
            Err(DomainError::Validation(msg)) if msg.contains("more than once")
        ));

        let misspelled: GrantPayload =
            serde_json::from_str(r#"[{"tela": "produtos", "pode_visualisar": true}]"#).unwrap();
        assert!(matches!(
            misspelled.into_grant_set(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn row_payload_with_malformed_action_is_rejected() {
        let payload = GrantPayload::ByAction(vec![ActionRow {
            screen: "produtos".to_string(),
            action: "approve".to_string(),
            value: true,
        }]);
        assert!(matches!(
            payload.into_grant_set(),
            Err(DomainError::Validation(_))
        ));
    }
}
