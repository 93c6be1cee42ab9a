//! Infrastructure layer: permission storage, audit sinks, user directory,
//! configuration and the application services built on them.

pub mod audit_sink;
pub mod config;
pub mod directory;
pub mod gate;
pub mod service;
pub mod store;


pub use audit_sink::{AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::{ConfigError, EngineConfig};
pub use directory::{InMemoryUserDirectory, PostgresUserDirectory, UserDirectory};
pub use gate::AuthorizationGate;
pub use service::{EditableGrant, PermissionService, ServiceError, SyncOutcome, SyncSummary};
pub use store::{InMemoryPermissionStore, PermissionStore, PostgresPermissionStore, StoreError};
