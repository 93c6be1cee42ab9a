//! Sync reconciliation: align a user's grants with the live screen registry.
//!
//! Reconciliation is additive and subtractive only at the edges:
//!
//! ```text
//! current grants ──┬── screen still registered ──► kept as-is (move clamped)
//!                  └── screen retired ───────────► dropped
//! registry screens ─── no current grant ─────────► role default inserted
//! ```
//!
//! Manual overrides on kept screens are never overwritten.

use serde::Serialize;

use crate::{GrantFlags, GrantSet, ScreenId, ScreenRegistry};

/// What a sync would change for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    /// Registry screens with no grant yet; materialized from defaults.
    pub added: Vec<ScreenId>,
    /// Grants for screens no longer in the registry.
    pub removed: Vec<ScreenId>,
    /// Kept grants holding actions their screen no longer supports.
    pub clamped: Vec<ScreenId>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.clamped.is_empty()
    }
}

/// Compute the sync plan without building the reconciled set.
pub fn plan_sync(current: &GrantSet, registry: &ScreenRegistry, defaults: &GrantSet) -> SyncPlan {
    reconcile_with_plan(current, registry, defaults).1
}

/// Reconcile and return the resulting grant set.
///
/// Idempotent for a fixed registry and defaults snapshot.
pub fn reconcile(current: &GrantSet, registry: &ScreenRegistry, defaults: &GrantSet) -> GrantSet {
    reconcile_with_plan(current, registry, defaults).0
}

/// Reconcile and report what changed.
///
/// A default missing for a registry screen falls back to deny-all.
pub fn reconcile_with_plan(
    current: &GrantSet,
    registry: &ScreenRegistry,
    defaults: &GrantSet,
) -> (GrantSet, SyncPlan) {
    let mut plan = SyncPlan::default();
    let mut reconciled = GrantSet::new();

    for (screen_id, flags) in current.iter() {
        match registry.get(screen_id) {
            Some(screen) => {
                let clamped = flags.restricted_to(&screen.actions);
                if clamped != *flags {
                    plan.clamped.push(screen_id.clone());
                }
                reconciled.insert(screen_id.clone(), clamped);
            }
            None => plan.removed.push(screen_id.clone()),
        }
    }

    for screen in registry.iter() {
        if current.contains(&screen.id) {
            continue;
        }
        let flags = defaults
            .get(&screen.id)
            .unwrap_or(GrantFlags::DENY_ALL)
            .restricted_to(&screen.actions);
        plan.added.push(screen.id.clone());
        reconciled.insert(screen.id.clone(), flags);
    }

    if !plan.is_empty() {
        tracing::debug!(
            added = plan.added.len(),
            removed = plan.removed.len(),
            clamped = plan.clamped.len(),
            "reconciled grant set"
        );
    }

    (reconciled, plan)
}
