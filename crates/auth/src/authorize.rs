use serde::Serialize;

use crate::{Action, GrantFlags, Screen, ScreenId};

/// Authorization decision for one (grant, screen, action) triple.
///
/// - No IO
/// - No panics
/// - Fail-closed: unknown screen or absent grant denies
///
/// An action the screen does not support is denied even when the stored bit
/// says otherwise, which covers stale `can_move` rows left behind after a
/// screen loses move support.
pub fn can_perform(grant: Option<GrantFlags>, screen: Option<&Screen>, action: Action) -> bool {
    match (grant, screen) {
        (Some(flags), Some(screen)) => screen.supports(action) && flags.allows(action),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Answers "why was this request allowed/denied?" for support tooling and
/// logs; the decision itself always matches [`can_perform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub screen_id: ScreenId,
    pub action: Action,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub denial: Option<DenialKind>,
    /// The stored grant, if any.
    pub grant: Option<GrantFlags>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The screen is not in the registry.
    UnknownScreen,
    /// No grant row exists for this user and screen.
    NoGrant,
    /// The screen does not offer this action at all.
    ActionUnsupported,
    /// The grant exists but the action bit is off.
    NotGranted,
}

pub fn explain_authorization(
    screen_id: &ScreenId,
    grant: Option<GrantFlags>,
    screen: Option<&Screen>,
    action: Action,
) -> AuthorizationExplanation {
    let denial = match (grant, screen) {
        (_, None) => Some(DenialKind::UnknownScreen),
        (None, Some(_)) => Some(DenialKind::NoGrant),
        (Some(_), Some(screen)) if !screen.supports(action) => Some(DenialKind::ActionUnsupported),
        (Some(flags), Some(_)) if !flags.allows(action) => Some(DenialKind::NotGranted),
        _ => None,
    };

    let reason = match denial {
        None => format!("'{}' is granted on screen '{}'", action.field_name(), screen_id),
        Some(DenialKind::UnknownScreen) => {
            format!("screen '{screen_id}' is not in the screen registry")
        }
        Some(DenialKind::NoGrant) => format!(
            "no grant exists for screen '{screen_id}'; run a sync to materialize role defaults"
        ),
        Some(DenialKind::ActionUnsupported) => {
            format!("screen '{screen_id}' does not support action '{action}'")
        }
        Some(DenialKind::NotGranted) => {
            format!("'{}' is not granted on screen '{}'", action.field_name(), screen_id)
        }
    };

    AuthorizationExplanation {
        screen_id: screen_id.clone(),
        action,
        granted: denial.is_none(),
        reason,
        denial,
        grant,
    }
}
