//! Audit differ: turns grant mutations into structured audit records.
//!
//! All functions here are pure. Persisting or shipping the resulting
//! [`AuditRecord`] is the job of an audit sink.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use screengate_core::{DomainError, DomainResult, UserId};

use crate::{Action, GrantFlags, GrantSet};

/// Keys whose values never reach an audit snapshot.
const REDACTED_KEYS: [&str; 3] = ["password", "senha", "secret"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        })
    }
}

/// One changed field, qualified by screen (e.g. `produtos.can_edit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDiffEntry {
    pub field_name: String,
    pub old_value: bool,
    pub new_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AuditPayload {
    /// Field-level changes (update).
    Diff(Vec<AuditDiffEntry>),
    /// Flat key → value copy of what was created.
    Snapshot(BTreeMap<String, JsonValue>),
    /// Nothing beyond the resource id (delete).
    None,
}

/// Who acted, and when.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub actor_user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl AuditContext {
    pub fn new(actor_user_id: UserId, occurred_at: DateTime<Utc>) -> Self {
        Self {
            actor_user_id,
            occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor_user_id: UserId,
    pub action: AuditAction,
    /// The user whose grants were affected.
    pub resource_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub payload: AuditPayload,
}

impl AuditRecord {
    pub fn diff(&self) -> Option<&[AuditDiffEntry]> {
        match &self.payload {
            AuditPayload::Diff(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Field-level diff between two grant sets.
///
/// Emits one entry per field whose value changed; unchanged fields and
/// screens produce nothing. A screen present on only one side is compared
/// against deny-all. Entries are ordered by screen, then by field.
pub fn diff_update(before: &GrantSet, after: &GrantSet) -> Vec<AuditDiffEntry> {
    let screens: BTreeSet<_> = before.screens().chain(after.screens()).collect();

    let mut entries = Vec::new();
    for screen_id in screens {
        let old = before.get(screen_id).unwrap_or(GrantFlags::DENY_ALL);
        let new = after.get(screen_id).unwrap_or(GrantFlags::DENY_ALL);
        if old == new {
            continue;
        }
        for action in Action::ALL {
            let (old_value, new_value) = (old.allows(action), new.allows(action));
            if old_value != new_value {
                entries.push(AuditDiffEntry {
                    field_name: format!("{}.{}", screen_id, action.field_name()),
                    old_value,
                    new_value,
                });
            }
        }
    }
    entries
}

/// Update record for a save, reset or sync.
pub fn update_record(
    ctx: AuditContext,
    resource_id: UserId,
    before: &GrantSet,
    after: &GrantSet,
) -> AuditRecord {
    AuditRecord {
        actor_user_id: ctx.actor_user_id,
        action: AuditAction::Update,
        resource_id,
        timestamp: ctx.occurred_at,
        payload: AuditPayload::Diff(diff_update(before, after)),
    }
}

/// Create record carrying a flattened snapshot of the payload.
///
/// Nested objects flatten into dotted keys (`produtos.can_view`); sensitive
/// keys are redacted. A literal dotted key that names the same path as a
/// nested one (`"a.b"` next to `{"a": {"b": ..}}`) keeps the first value
/// in key order and logs the collision.
pub fn diff_create<T: Serialize>(
    ctx: AuditContext,
    resource_id: UserId,
    payload: &T,
) -> DomainResult<AuditRecord> {
    let value = serde_json::to_value(payload)
        .map_err(|e| DomainError::validation(format!("unserializable audit payload: {e}")))?;

    let mut snapshot = BTreeMap::new();
    flatten_into(&mut snapshot, None, value);

    Ok(AuditRecord {
        actor_user_id: ctx.actor_user_id,
        action: AuditAction::Create,
        resource_id,
        timestamp: ctx.occurred_at,
        payload: AuditPayload::Snapshot(snapshot),
    })
}

/// Delete record; carries no payload.
pub fn diff_delete(ctx: AuditContext, resource_id: UserId) -> AuditRecord {
    AuditRecord {
        actor_user_id: ctx.actor_user_id,
        action: AuditAction::Delete,
        resource_id,
        timestamp: ctx.occurred_at,
        payload: AuditPayload::None,
    }
}

fn flatten_into(out: &mut BTreeMap<String, JsonValue>, prefix: Option<&str>, value: JsonValue) {
    match value {
        JsonValue::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                let path = match prefix {
                    Some(p) => format!("{p}.{key}"),
                    None => key.clone(),
                };
                if is_sensitive(&key) {
                    insert_once(out, path, JsonValue::String("[REDACTED]".to_string()));
                } else {
                    flatten_into(out, Some(&path), nested);
                }
            }
        }
        other => insert_once(out, prefix.unwrap_or("value").to_string(), other),
    }
}

fn is_sensitive(key: &str) -> bool {
    let last = key.rsplit('.').next().unwrap_or(key).to_ascii_lowercase();
    REDACTED_KEYS.contains(&last.as_str())
}

fn insert_once(out: &mut BTreeMap<String, JsonValue>, path: String, value: JsonValue) {
    match out.entry(path) {
        std::collections::btree_map::Entry::Vacant(slot) => {
            slot.insert(value);
        }
        std::collections::btree_map::Entry::Occupied(slot) => {
            tracing::warn!(path = %slot.key(), "audit snapshot key collision; keeping first value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionSet, ScreenId};
    use proptest::prelude::*;
    use serde_json::json;

    fn ctx() -> AuditContext {
        AuditContext::new(UserId::new(), Utc::now())
    }

    fn set(entries: &[(&'static str, GrantFlags)]) -> GrantSet {
        entries
            .iter()
            .map(|(id, f)| (ScreenId::new(*id), *f))
            .collect()
    }

    #[test]
    fn single_toggle_yields_single_entry() {
        let before = set(&[
            ("products", GrantFlags::DENY_ALL.with(Action::View)),
            ("vehicles", GrantFlags::DENY_ALL),
        ]);
        let mut after = before.clone();
        after.insert(
            ScreenId::new("products"),
            GrantFlags::DENY_ALL.with(Action::View).with(Action::Delete),
        );

        assert_eq!(
            diff_update(&before, &after),
            vec![AuditDiffEntry {
                field_name: "products.can_delete".to_string(),
                old_value: false,
                new_value: true,
            }]
        );
    }

    #[test]
    fn identical_sets_produce_no_entries() {
        let grants = set(&[("products", GrantFlags::from_actions(ActionSet::crud()))]);
        assert!(diff_update(&grants, &grants).is_empty());
    }

    #[test]
    fn removed_screen_reports_revoked_fields() {
        let before = set(&[("billing", GrantFlags::DENY_ALL.with(Action::View))]);
        let entries = diff_update(&before, &GrantSet::new());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field_name, "billing.can_view");
        assert!(entries[0].old_value && !entries[0].new_value);
    }

    #[test]
    fn update_record_carries_actor_and_resource() {
        let ctx = ctx();
        let resource = UserId::new();
        let after = set(&[("products", GrantFlags::DENY_ALL.with(Action::Edit))]);

        let record = update_record(ctx, resource, &GrantSet::new(), &after);
        assert_eq!(record.action, AuditAction::Update);
        assert_eq!(record.actor_user_id, ctx.actor_user_id);
        assert_eq!(record.resource_id, resource);
        assert_eq!(record.diff().map(<[_]>::len), Some(1));
    }

    #[test]
    fn create_record_flattens_and_redacts() {
        let payload = json!({
            "nome": "Maria",
            "senha": "hunter2",
            "permissoes": {"produtos": {"can_view": true}}
        });

        let record = diff_create(ctx(), UserId::new(), &payload).unwrap();
        assert_eq!(record.action, AuditAction::Create);
        let AuditPayload::Snapshot(snapshot) = &record.payload else {
            panic!("expected snapshot payload");
        };
        assert_eq!(snapshot["nome"], json!("Maria"));
        assert_eq!(snapshot["senha"], json!("[REDACTED]"));
        assert_eq!(snapshot["permissoes.produtos.can_view"], json!(true));
    }

    #[test]
    fn dotted_key_colliding_with_nested_path_keeps_first_value() {
        let payload = json!({
            "a": {"b": 1},
            "a.b": 2,
            "perfil.senha": "hunter2"
        });

        let record = diff_create(ctx(), UserId::new(), &payload).unwrap();
        let AuditPayload::Snapshot(snapshot) = &record.payload else {
            panic!("expected snapshot payload");
        };
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a.b"], json!(1));
        assert_eq!(snapshot["perfil.senha"], json!("[REDACTED]"));
    }

    #[test]
    fn delete_record_has_no_payload() {
        let record = diff_delete(ctx(), UserId::new());
        assert_eq!(record.action, AuditAction::Delete);
        assert_eq!(record.payload, AuditPayload::None);
    }

    #[test]
    fn record_serializes_with_tagged_payload() {
        let record = diff_delete(ctx(), UserId::new());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], json!("delete"));
        assert_eq!(json["payload"]["kind"], json!("none"));
    }

    fn arb_set() -> impl Strategy<Value = GrantSet> {
        proptest::collection::btree_map(
            "[a-d]",
            proptest::collection::vec(any::<bool>(), 5),
            0..4,
        )
        .prop_map(|m| {
            m.into_iter()
                .map(|(id, bits)| {
                    let mut flags = GrantFlags::DENY_ALL;
                    for (action, on) in Action::ALL.into_iter().zip(bits) {
                        flags.set(action, on);
                    }
                    (ScreenId::new(id), flags)
                })
                .collect()
        })
    }

    proptest! {
        /// Property: an entry exists for (screen, field) iff the value changed.
        #[test]
        fn diff_matches_field_changes(before in arb_set(), after in arb_set()) {
            let entries = diff_update(&before, &after);
            let screens: BTreeSet<_> = before.screens().chain(after.screens()).cloned().collect();

            let mut expected = 0;
            for screen_id in &screens {
                let old = before.get(screen_id).unwrap_or_default();
                let new = after.get(screen_id).unwrap_or_default();
                for action in Action::ALL {
                    let name = format!("{}.{}", screen_id, action.field_name());
                    let entry = entries.iter().find(|e| e.field_name == name);
                    if old.allows(action) != new.allows(action) {
                        expected += 1;
                        let entry = entry.expect("changed field must be reported");
                        prop_assert_eq!(entry.old_value, old.allows(action));
                        prop_assert_eq!(entry.new_value, new.allows(action));
                    } else {
                        prop_assert!(entry.is_none());
                    }
                }
            }
            prop_assert_eq!(entries.len(), expected);
        }
    }
}
