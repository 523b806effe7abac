//! Lost & Found Core - item lifecycle for a retail lost & found desk
//!
//! This crate provides the core functionality behind every desk workflow:
//!
//! - **Item**: found items, cash breakdowns, bundled sub-items and loss reports
//! - **Lifecycle**: custody (Stored→PoliceFiled→Returned/Disposed/Sold) and refund
//!   (None→Scheduled→Refunded→Processed) state machines and their transitions
//! - **Allocator**: receipt numbers `{prefix}{yy}{seq}` scoped by finder type and year
//! - **Query**: per-screen filter specifications compiled to paginated, id-ordered SQL
//! - **Bulk**: one transition across a selected page, with per-item failure isolation
//! - **Persistence**: SQLite-backed item record store
//! - **Config**: storage, intake, server and logging settings
//!
//! # Flow
//!
//! ```text
//! FilterSpec → Query → Page → selection → BulkCoordinator → lifecycle::apply → Store
//!                                   intake → Allocator ──────────────────────→ Store
//! ```

pub mod allocator;
pub mod bulk;
pub mod config;
pub mod error;
pub mod item;
pub mod lifecycle;
#[cfg(feature = "sqlite")]
pub mod persistence;
pub mod query;
pub mod store;

pub use allocator::DisplayId;
pub use bulk::{BulkCoordinator, BulkFailure, BulkOutcome, FailureKind, RefundFinalization};
pub use config::{IntakeConfig, LoggingConfig, LostFoundConfig, ServerConfig, StorageConfig};
pub use error::{
    DuplicateIdentifierError, InvalidTransitionError, LostFoundError, NotFoundError, Result,
    ValidationError,
};
pub use item::{
    BundledSubItem, CashBreakdown, FinderType, FoundItem, FoundItemId, LossReport,
    LossReportStatus, NewBundledSubItem, NewFoundItem, NewLossReport,
};
pub use lifecycle::{CustodyStatus, RefundStatus, Transition};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteItemStore;
pub use query::{FilterSpec, Page, Screen, ScreenPage, PAGE_SIZE};
pub use store::{ItemStore, SessionId};

/// Returns the version of lostfound-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
