//! `screengate-auth`: pure per-screen authorization engine.
//!
//! Grants, the screen registry, role templates, sync reconciliation, audit
//! diffs and the authorization decision itself. This crate is intentionally
//! decoupled from storage and transport; `screengate-infra` wires it to a
//! permission store and an audit sink.

pub mod action;
pub mod audit;
pub mod authorize;
pub mod grant;
pub mod reconcile;
pub mod roles;
pub mod screen;
pub mod template;
pub mod user;

pub use action::{Action, ActionSet};
pub use audit::{
    diff_create, diff_delete, diff_update, update_record, AuditAction, AuditContext,
    AuditDiffEntry, AuditPayload, AuditRecord,
};
pub use authorize::{can_perform, explain_authorization, AuthorizationExplanation, DenialKind};
pub use grant::{ActionRow, FlagRow, Grant, GrantFlags, GrantPayload, GrantSet};
pub use reconcile::{plan_sync, reconcile, reconcile_with_plan, SyncPlan};
pub use roles::{RoleKey, RoleLevel, RoleType};
pub use screen::{Screen, ScreenId, ScreenRegistry};
pub use template::{level_actions, resolve_defaults, Template, TemplateCatalog};
pub use user::UserProfile;
