//! Persistence layer for the lost & found desk
//!
//! Provides the SQLite-backed item record store: found items, cash
//! breakdowns, bundled sub-items, loss reports, receipt counters and saved
//! screen criteria.

mod schema;
mod sqlite_store;

pub use schema::{Schema, SCHEMA_VERSION};
pub use sqlite_store::SqliteItemStore;
