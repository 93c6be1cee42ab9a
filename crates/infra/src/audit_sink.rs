//! Destinations for audit records.
//!
//! Recording is fire-and-forget from the caller's perspective: a sink
//! swallows (and logs) its own failures so an audit outage never rolls back
//! a committed grant change.

use std::sync::{Arc, RwLock};

use screengate_auth::AuditRecord;

pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, record: AuditRecord) {
        (**self).record(record)
    }
}

/// Keeps records in memory, in emission order.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.read() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        match self.records.write() {
            Ok(mut records) => records.push(record),
            Err(_) => tracing::error!(
                resource_id = %record.resource_id,
                "audit sink lock poisoned; dropping record"
            ),
        }
    }
}

/// Emits each record as a structured `tracing` event on the
/// `screengate::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        let payload = match serde_json::to_string(&record.payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize audit payload");
                return;
            }
        };
        tracing::info!(
            target: "screengate::audit",
            actor_user_id = %record.actor_user_id,
            action = %record.action,
            resource_id = %record.resource_id,
            timestamp = %record.timestamp.to_rfc3339(),
            payload = %payload,
            "audit record"
        );
    }
}
