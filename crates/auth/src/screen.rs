//! Screen registry: the catalog of protected screens and their actions.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use screengate_core::{DomainError, DomainResult, Entity};

use crate::{Action, ActionSet};

/// Screen identifier (e.g. "produtos", "veiculos").
///
/// Screen ids are opaque strings; the registry decides which ones exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(Cow<'static, str>);

impl ScreenId {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ScreenId {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// A protected functional area of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub id: ScreenId,
    pub label: String,
    /// Presentation group ("Cadastros", "Sistema", ...).
    pub group: String,
    #[serde(default = "ActionSet::crud")]
    pub actions: ActionSet,
}

impl Screen {
    /// A screen supporting view/create/edit/delete.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        label: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: ScreenId::new(id),
            label: label.into(),
            group: group.into(),
            actions: ActionSet::crud(),
        }
    }

    pub fn with_move(mut self) -> Self {
        self.actions = self.actions.with(Action::Move);
        self
    }

    pub fn with_actions(mut self, actions: ActionSet) -> Self {
        self.actions = actions;
        self
    }

    pub fn supports(&self, action: Action) -> bool {
        self.actions.contains(action)
    }
}

impl Entity for Screen {
    type Id = ScreenId;

    fn id(&self) -> &ScreenId {
        &self.id
    }
}

/// Read-only catalog of every known screen.
///
/// Built once (from the built-in catalog or configuration) and shared across
/// callers behind an `Arc`; nothing mutates it at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScreenRegistry {
    screens: BTreeMap<ScreenId, Screen>,
    /// Declaration order, used for grouped presentation.
    order: Vec<ScreenId>,
}

impl ScreenRegistry {
    /// Build a registry, rejecting blank and duplicate screen ids.
    pub fn new(screens: impl IntoIterator<Item = Screen>) -> DomainResult<Self> {
        let mut registry = Self::default();
        for screen in screens {
            if screen.id.as_str().trim().is_empty() {
                return Err(DomainError::validation("screen id must not be blank"));
            }
            if registry.screens.contains_key(&screen.id) {
                return Err(DomainError::conflict(format!(
                    "screen '{}' registered twice",
                    screen.id
                )));
            }
            registry.order.push(screen.id.clone());
            registry.screens.insert(screen.id.clone(), screen);
        }
        Ok(registry)
    }

    /// Parse a registry from a JSON array of screens.
    pub fn from_json(json: &str) -> DomainResult<Self> {
        let screens: Vec<Screen> = serde_json::from_str(json)
            .map_err(|e| DomainError::validation(format!("invalid screen registry: {e}")))?;
        Self::new(screens)
    }

    /// The catalog shipped with the application.
    pub fn builtin() -> Self {
        let screens = vec![
            Screen::new("usuarios", "Usuários", "Cadastros"),
            Screen::new("fornecedores", "Fornecedores", "Cadastros"),
            Screen::new("clientes", "Clientes", "Cadastros"),
            Screen::new("filiais", "Filiais", "Cadastros"),
            Screen::new("rotas", "Rotas", "Cadastros"),
            Screen::new("unidades_escolares", "Unidades Escolares", "Cadastros"),
            Screen::new("veiculos", "Veículos", "Cadastros"),
            Screen::new("motoristas", "Motoristas", "Cadastros"),
            Screen::new("ajudantes", "Ajudantes", "Cadastros"),
            Screen::new("produtos", "Produtos", "Produtos"),
            Screen::new("grupos", "Grupos", "Produtos"),
            Screen::new("subgrupos", "Subgrupos", "Produtos"),
            Screen::new("classes", "Classes", "Produtos"),
            Screen::new("nome_generico_produto", "Nome Genérico", "Produtos"),
            Screen::new("unidades", "Unidades", "Produtos"),
            Screen::new("marcas", "Marcas", "Produtos"),
            Screen::new("patrimonios", "Patrimônios", "Patrimônio").with_move(),
            Screen::new("cotacao", "Cotação", "Suprimentos"),
            Screen::new("necessidades", "Necessidades", "Suprimentos"),
            Screen::new("permissoes", "Permissões", "Sistema"),
        ];

        // Every id above is unique and non-blank.
        let mut registry = Self::default();
        for screen in screens {
            registry.order.push(screen.id.clone());
            registry.screens.insert(screen.id.clone(), screen);
        }
        registry
    }

    pub fn get(&self, id: &ScreenId) -> Option<&Screen> {
        self.screens.get(id)
    }

    pub fn contains(&self, id: &ScreenId) -> bool {
        self.screens.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Screens ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Screen> {
        self.screens.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ScreenId> {
        self.screens.keys()
    }

    /// Screens grouped for display, groups and members in declaration order.
    pub fn groups(&self) -> Vec<(&str, Vec<&Screen>)> {
        let mut groups: Vec<(&str, Vec<&Screen>)> = Vec::new();
        for screen in self.order.iter().filter_map(|id| self.screens.get(id)) {
            match groups.iter_mut().find(|(name, _)| *name == screen.group) {
                Some((_, members)) => members.push(screen),
                None => groups.push((screen.group.as_str(), vec![screen])),
            }
        }
        groups
    }

    pub fn screens_supporting(&self, action: Action) -> impl Iterator<Item = &Screen> {
        self.screens.values().filter(move |s| s.supports(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_only_assets_support_move() {
        let registry = ScreenRegistry::builtin();
        let movers: Vec<&str> = registry
            .screens_supporting(Action::Move)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(movers, vec!["patrimonios"]);
        assert!(registry.contains(&ScreenId::new("produtos")));
    }

    #[test]
    fn rejects_duplicate_screen_ids() {
        let err = ScreenRegistry::new(vec![
            Screen::new("produtos", "Produtos", "Cadastros"),
            Screen::new("produtos", "Produtos (novo)", "Cadastros"),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn rejects_blank_screen_id() {
        let err = ScreenRegistry::new(vec![Screen::new("  ", "?", "Cadastros")]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn groups_keep_declaration_order() {
        let registry = ScreenRegistry::new(vec![
            Screen::new("veiculos", "Veículos", "Frota"),
            Screen::new("permissoes", "Permissões", "Sistema"),
            Screen::new("motoristas", "Motoristas", "Frota"),
        ])
        .unwrap();

        let groups = registry.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Frota");
        let frota: Vec<&str> = groups[0].1.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(frota, vec!["veiculos", "motoristas"]);
        assert_eq!(groups[1].0, "Sistema");
    }

    #[test]
    fn loads_registry_from_json() {
        let registry = ScreenRegistry::from_json(
            r#"[
                {"id": "produtos", "label": "Produtos", "group": "Cadastros"},
                {"id": "patrimonios", "label": "Patrimônios", "group": "Patrimônio",
                 "actions": ["view", "edit", "move"]}
            ]"#,
        )
        .unwrap();

        let produtos = registry.get(&ScreenId::new("produtos")).unwrap();
        assert_eq!(produtos.actions, ActionSet::crud());
        let patrimonios = registry.get(&ScreenId::new("patrimonios")).unwrap();
        assert!(patrimonios.supports(Action::Move));
        assert!(!patrimonios.supports(Action::Delete));
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = ScreenRegistry::from_json("{not json").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
