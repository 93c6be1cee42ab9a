use core::str::FromStr;

use serde::{Deserialize, Serialize};

use screengate_core::DomainError;

/// One of the five actions a screen can expose.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    /// Screen-specific move/transfer (e.g. moving an asset between sites).
    Move,
}

impl Action {
    /// All actions, in the order grant fields are stored and diffed.
    pub const ALL: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Move,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Move => "move",
        }
    }

    /// Name of the grant field backing this action (`can_view`, ...).
    pub fn field_name(self) -> &'static str {
        match self {
            Action::View => "can_view",
            Action::Create => "can_create",
            Action::Edit => "can_edit",
            Action::Delete => "can_delete",
            Action::Move => "can_move",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Action::View => 1,
            Action::Create => 1 << 1,
            Action::Edit => 1 << 2,
            Action::Delete => 1 << 3,
            Action::Move => 1 << 4,
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DomainError;

    /// Accepts the canonical names, the grant field names, and the legacy
    /// Portuguese spellings still sent by older screens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let action = match normalized.as_str() {
            "view" | "can_view" | "visualizar" | "pode_visualizar" => Action::View,
            "create" | "can_create" | "criar" | "pode_criar" => Action::Create,
            "edit" | "can_edit" | "editar" | "pode_editar" => Action::Edit,
            "delete" | "can_delete" | "excluir" | "pode_excluir" => Action::Delete,
            "move" | "can_move" | "movimentar" | "pode_movimentar" => Action::Move,
            _ => return Err(DomainError::validation(format!("unknown action '{s}'"))),
        };
        Ok(action)
    }
}

/// Set of actions supported by a screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionSet(u8);

impl ActionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// view, create, edit and delete: what every ordinary screen supports.
    pub fn crud() -> Self {
        [Action::View, Action::Create, Action::Edit, Action::Delete]
            .into_iter()
            .collect()
    }

    pub fn all() -> Self {
        Action::ALL.into_iter().collect()
    }

    pub fn with(mut self, action: Action) -> Self {
        self.0 |= action.bit();
        self
    }

    pub fn without(mut self, action: Action) -> Self {
        self.0 &= !action.bit();
        self
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    pub fn intersection(&self, other: &ActionSet) -> ActionSet {
        ActionSet(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        iter.into_iter().fold(ActionSet::empty(), ActionSet::with)
    }
}

impl From<Vec<Action>> for ActionSet {
    fn from(value: Vec<Action>) -> Self {
        value.into_iter().collect()
    }
}

impl From<ActionSet> for Vec<Action> {
    fn from(value: ActionSet) -> Self {
        value.iter().collect()
    }
}
