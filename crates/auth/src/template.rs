//! Role templates and default-grant resolution.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use screengate_core::{DomainError, DomainResult};

use crate::{Action, ActionSet, GrantFlags, GrantSet, RoleKey, RoleLevel, RoleType, ScreenId, ScreenRegistry};

/// Default grants for one (role type, role level) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub key: RoleKey,
    pub grants: BTreeMap<ScreenId, GrantFlags>,
}

impl Template {
    pub fn new(key: RoleKey) -> Self {
        Self {
            key,
            grants: BTreeMap::new(),
        }
    }

    pub fn with_grant(mut self, screen_id: impl Into<ScreenId>, flags: GrantFlags) -> Self {
        self.grants.insert(screen_id.into(), flags);
        self
    }

    pub fn get(&self, screen_id: &ScreenId) -> Option<GrantFlags> {
        self.grants.get(screen_id).copied()
    }
}

/// Actions a role level receives on an ordinary screen.
///
/// I reads, II also creates and edits, III gets everything (including move
/// where the screen supports it).
pub fn level_actions(level: RoleLevel) -> ActionSet {
    match level {
        RoleLevel::I => ActionSet::empty().with(Action::View),
        RoleLevel::II => ActionSet::empty()
            .with(Action::View)
            .with(Action::Create)
            .with(Action::Edit),
        RoleLevel::III => ActionSet::all(),
    }
}

/// Resolve the screen-complete default grant set for a matched template.
///
/// `None` means no template is registered for the user's role: every screen
/// resolves to deny-all. Screens the template does not mention also resolve
/// to deny-all, and actions a screen does not support are never granted.
pub fn resolve_defaults(template: Option<&Template>, registry: &ScreenRegistry) -> GrantSet {
    registry
        .iter()
        .map(|screen| {
            let flags = template
                .and_then(|t| t.get(&screen.id))
                .unwrap_or(GrantFlags::DENY_ALL)
                .restricted_to(&screen.actions);
            (screen.id.clone(), flags)
        })
        .collect()
}

/// All configured templates, read-only at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: HashMap<RoleKey, Template>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, returning the one it replaced.
    pub fn insert(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(template.key.clone(), template)
    }

    pub fn get(&self, key: &RoleKey) -> Option<&Template> {
        self.templates.get(key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Default grants for a role; unknown roles resolve fail-closed.
    pub fn resolve_defaults(
        &self,
        role_type: &RoleType,
        role_level: RoleLevel,
        registry: &ScreenRegistry,
    ) -> GrantSet {
        let key = RoleKey::new(role_type.clone(), role_level);
        let template = self.get(&key);
        if template.is_none() {
            tracing::debug!(role = %key, "no template registered; resolving deny-all defaults");
        }
        resolve_defaults(template, registry)
    }

    /// Parse `{"<role type>": {"<level>": {"<screen>": {<flags>}}}}`.
    ///
    /// Flag objects accept the legacy field names (`visualizar`, `criar`, ...),
    /// so existing default tables load unchanged.
    pub fn from_json(json: &str) -> DomainResult<Self> {
        let raw: BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>> =
            serde_json::from_str(json)
                .map_err(|e| DomainError::validation(format!("invalid template table: {e}")))?;

        let mut catalog = Self::new();
        for (role_type, levels) in raw {
            for (level, screens) in levels {
                let key = RoleKey::new(RoleType::new(role_type.clone()), level.parse()?);
                let mut template = Template::new(key);
                for (screen, fields) in screens {
                    template = template.with_grant(ScreenId::new(screen), GrantFlags::from_fields(fields)?);
                }
                if let Some(previous) = catalog.insert(template) {
                    return Err(DomainError::conflict(format!(
                        "template {} defined twice",
                        previous.key
                    )));
                }
            }
        }
        Ok(catalog)
    }

    /// Templates for administrators and coordinators at every level.
    ///
    /// Other role types deliberately have no template and resolve deny-all.
    pub fn builtin(registry: &ScreenRegistry) -> Self {
        let mut catalog = Self::new();
        for role in ["administrador", "coordenador"] {
            for level in RoleLevel::ALL {
                let key = RoleKey::new(RoleType::new(role), level);
                let template = registry.iter().fold(Template::new(key), |t, screen| {
                    let mut actions = level_actions(level);
                    match screen.id.as_str() {
                        "permissoes" if level != RoleLevel::III => actions = ActionSet::empty(),
                        "usuarios" if level == RoleLevel::II => actions = actions.without(Action::Edit),
                        "permissoes" | "usuarios" if role == "coordenador" => {
                            actions = actions.without(Action::Delete)
                        }
                        "cotacao" => actions = ActionSet::empty().with(Action::View),
                        _ => {}
                    }
                    t.with_grant(
                        screen.id.clone(),
                        GrantFlags::from_actions(actions.intersection(&screen.actions)),
                    )
                });
                catalog.insert(template);
            }
        }
        catalog
    }
}
