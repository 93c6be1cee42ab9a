//! Permission store boundary.
//!
//! One row per (user, screen). Replacing a user's grants is all-or-nothing:
//! readers observe either the old set or the new one, never a mix.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryPermissionStore;
pub use postgres::PostgresPermissionStore;
pub use r#trait::{PermissionStore, StoreError};
