//! Criteria query compiler
//!
//! A [`FilterSpec`] holds the optional clauses a caller picked on a screen.
//! The screen adds its own default exclusions (see [`Screen`]) and the
//! result comes back id-ordered, [`PAGE_SIZE`] rows at a time. The last spec
//! applied on a screen is saved per session, so returning to the screen
//! shows the same working set.

mod criteria;
mod page;
mod screen;
#[cfg(feature = "sqlite")]
pub(crate) mod sql;

pub use criteria::{
    Clause, Field, FieldKind, FilterSpec, ShowAlso, StatusRef, Target, Value,
};
pub use page::{page_count, Page, PAGE_SIZE};
pub use screen::{DefaultExclusion, Lift, Screen};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::item::{FoundItem, LossReport};
use crate::store::{ItemStore, SessionId};

/// A page from whichever record type the screen lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ScreenPage {
    FoundItems(Page<FoundItem>),
    LossReports(Page<LossReport>),
}

impl ScreenPage {
    pub fn total(&self) -> u64 {
        match self {
            ScreenPage::FoundItems(p) => p.total,
            ScreenPage::LossReports(p) => p.total,
        }
    }

    pub fn page_count(&self) -> u32 {
        match self {
            ScreenPage::FoundItems(p) => p.page_count,
            ScreenPage::LossReports(p) => p.page_count,
        }
    }

    /// Row ids on this page, in order
    pub fn ids(&self) -> Vec<i64> {
        match self {
            ScreenPage::FoundItems(p) => p.items.iter().map(|i| i.id).collect(),
            ScreenPage::LossReports(p) => p.items.iter().map(|r| r.id).collect(),
        }
    }
}

/// Run `spec` on `screen` without saving it
pub fn search<S: ItemStore + ?Sized>(
    store: &S,
    screen: Screen,
    spec: &FilterSpec,
    page: u32,
) -> Result<ScreenPage> {
    match screen.target() {
        Target::FoundItems => Ok(ScreenPage::FoundItems(
            store.search_items(screen, spec, page)?,
        )),
        Target::LossReports => Ok(ScreenPage::LossReports(
            store.search_loss_reports(spec, page)?,
        )),
    }
}

/// Page of the session's saved criteria, or the screen defaults
pub fn fetch_screen<S: ItemStore + ?Sized>(
    store: &S,
    session: &SessionId,
    screen: Screen,
    page: u32,
) -> Result<ScreenPage> {
    let spec = store.load_criteria(session, screen)?.unwrap_or_default();
    search(store, screen, &spec, page)
}

/// Save `spec` for the session and return its first page
///
/// An invalid spec is rejected without replacing what was saved before.
pub fn apply_criteria<S: ItemStore + ?Sized>(
    store: &S,
    session: &SessionId,
    screen: Screen,
    spec: &FilterSpec,
) -> Result<ScreenPage> {
    spec.check(screen.target())?;
    store.save_criteria(session, screen, spec)?;
    debug!(session = %session, screen = %screen, clauses = spec.clauses.len(), "saved criteria");
    search(store, screen, spec, 1)
}
