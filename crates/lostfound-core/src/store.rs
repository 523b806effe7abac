use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::allocator::DisplayId;
use crate::error::Result;
use crate::item::{
    BundledSubItem, CashBreakdown, FinderType, FoundItem, FoundItemId, LossReport, LossReportId,
    NewBundledSubItem, NewFoundItem, NewLossReport,
};
use crate::lifecycle::Transition;
use crate::query::{FilterSpec, Page, Screen};

/// Opaque key a caller uses to keep its own saved criteria
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The trait that all storage backends implement.
pub trait ItemStore: Send + Sync {
    /// Issue the next receipt number in the (finder type, year) scope.
    fn allocate(&self, finder_type: FinderType, year: i32) -> Result<DisplayId>;

    /// Validate an intake form, number it and store it in one step.
    fn intake(&self, new: NewFoundItem) -> Result<FoundItem>;

    /// Get a found item by ID.
    fn get(&self, id: FoundItemId) -> Result<Option<FoundItem>>;

    /// Apply one lifecycle transition atomically; nothing changes on error.
    fn apply_transition(&self, id: FoundItemId, transition: &Transition) -> Result<FoundItem>;

    /// One page of found items for a screen.
    fn search_items(&self, screen: Screen, spec: &FilterSpec, page: u32)
        -> Result<Page<FoundItem>>;

    /// Store (or replace) the cash breakdown of an item.
    fn record_cash(&self, breakdown: &CashBreakdown) -> Result<()>;

    fn cash_breakdown(&self, item_id: FoundItemId) -> Result<Option<CashBreakdown>>;

    fn add_bundled_item(
        &self,
        parent_id: FoundItemId,
        new: NewBundledSubItem,
    ) -> Result<BundledSubItem>;

    fn bundled_items(&self, parent_id: FoundItemId) -> Result<Vec<BundledSubItem>>;

    fn report_loss(&self, new: NewLossReport) -> Result<LossReport>;

    fn get_loss_report(&self, id: LossReportId) -> Result<Option<LossReport>>;

    /// Close an open loss report.
    fn resolve_loss_report(&self, id: LossReportId, resolved_on: NaiveDate)
        -> Result<LossReport>;

    /// One page of the loss report screen.
    fn search_loss_reports(&self, spec: &FilterSpec, page: u32) -> Result<Page<LossReport>>;

    /// Remember the criteria last applied on a screen.
    fn save_criteria(&self, session: &SessionId, screen: Screen, spec: &FilterSpec) -> Result<()>;

    fn load_criteria(&self, session: &SessionId, screen: Screen) -> Result<Option<FilterSpec>>;

    /// Forget saved criteria; returns whether anything was saved.
    fn clear_criteria(&self, session: &SessionId, screen: Screen) -> Result<bool>;

    /// Drop criteria last saved before `cutoff` (UTC); returns how many went.
    fn prune_criteria(&self, cutoff: NaiveDateTime) -> Result<usize>;
}
