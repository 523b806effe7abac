//! Item records kept by the lost & found desk
//!
//! - **FoundItem**: a recovered physical item, from intake through disposition
//! - **CashBreakdown**: per-denomination counts for found cash
//! - **BundledSubItem**: secondary items found together with a main item
//! - **LossReport**: an independently reported loss, matched by hand

mod bundled;
mod cash;
mod found;
mod loss_report;

pub use bundled::{BundledSubItem, NewBundledSubItem};
pub use cash::{CashBreakdown, Denomination, MemorialCoin};
pub use found::{
    Classification, ContactBlock, FinderType, FoundItem, FoundItemId, NewFoundItem, OwnerContact,
    OwnerWaiver, ReturnRecord,
};
pub use loss_report::{LossReport, LossReportId, LossReportStatus, NewLossReport};

/// Timestamp format used for every stored date-time
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format used for every stored date
pub const DATE_FORMAT: &str = "%Y-%m-%d";
