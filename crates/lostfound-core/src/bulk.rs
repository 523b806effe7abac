//! Bulk actions over a screen selection
//!
//! Every selected id gets its own store transaction. A failure on one id is
//! recorded in the outcome and the rest of the selection still runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LostFoundError, Result, ValidationError};
use crate::lifecycle::{RefundCompletion, Transition};
use crate::query::PAGE_SIZE;
use crate::store::ItemStore;

/// Largest selection one call accepts
pub const MAX_SELECTION: usize = PAGE_SIZE as usize;

/// Why a single id failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    NotFound,
    InvalidTransition,
    Validation,
    Storage,
}

impl FailureKind {
    pub fn of(err: &LostFoundError) -> Self {
        match err {
            LostFoundError::NotFound(_) => FailureKind::NotFound,
            LostFoundError::InvalidTransition(_) => FailureKind::InvalidTransition,
            LostFoundError::Validation(_) => FailureKind::Validation,
            LostFoundError::DuplicateIdentifier(_)
            | LostFoundError::Allocator(_)
            | LostFoundError::Persistence(_)
            | LostFoundError::Config(_) => FailureKind::Storage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: i64,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-id results of one bulk call, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<i64>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of closing a refund batch together with a police queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundFinalization {
    /// Ids moved to REFUNDED
    pub refunded: BulkOutcome,
    /// Ids moved to PROCESSED
    pub police_queue: BulkOutcome,
}

/// Applies one action across a selected set of ids
pub struct BulkCoordinator<'a, S: ItemStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ItemStore + ?Sized> BulkCoordinator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply `transition` to every selected found item
    pub fn apply(&self, ids: &[i64], transition: &Transition) -> Result<BulkOutcome> {
        transition.validate()?;
        let ids = selection("ids", ids)?;
        Ok(run(transition.name(), &ids, |id| {
            self.store.apply_transition(id, transition).map(|_| ())
        }))
    }

    /// Mark `refund_ids` REFUNDED and close `police_queue_ids` to PROCESSED
    ///
    /// The two lists are independent inputs; an id listed in both is tried
    /// for each.
    pub fn finalize_refund(
        &self,
        refund_ids: &[i64],
        police_queue_ids: &[i64],
        completion: &RefundCompletion,
    ) -> Result<RefundFinalization> {
        let complete = Transition::CompleteRefund(completion.clone());
        let close = Transition::ClosePoliceQueue(completion.clone());
        complete.validate()?;
        let refund_ids = selection("refund_ids", refund_ids)?;
        let police_queue_ids = selection("police_queue_ids", police_queue_ids)?;

        let refunded = run(complete.name(), &refund_ids, |id| {
            self.store.apply_transition(id, &complete).map(|_| ())
        });
        let police_queue = run(close.name(), &police_queue_ids, |id| {
            self.store.apply_transition(id, &close).map(|_| ())
        });

        Ok(RefundFinalization {
            refunded,
            police_queue,
        })
    }

    /// Resolve every selected loss report
    pub fn resolve_loss_reports(&self, ids: &[i64], resolved_on: NaiveDate) -> Result<BulkOutcome> {
        let ids = selection("ids", ids)?;
        Ok(run("RESOLVE", &ids, |id| {
            self.store.resolve_loss_report(id, resolved_on).map(|_| ())
        }))
    }
}

/// Drop repeated ids (first occurrence wins) and enforce the size bound
fn selection(field: &str, ids: &[i64]) -> std::result::Result<Vec<i64>, ValidationError> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.len() > MAX_SELECTION {
        return Err(ValidationError::field(
            field,
            format!(
                "{} ids selected, at most {} allowed",
                unique.len(),
                MAX_SELECTION
            ),
        ));
    }
    Ok(unique)
}

fn run(action: &str, ids: &[i64], mut apply: impl FnMut(i64) -> Result<()>) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for &id in ids {
        match apply(id) {
            Ok(()) => outcome.succeeded.push(id),
            Err(err) => {
                let kind = FailureKind::of(&err);
                warn!(id, action, kind = ?kind, error = %err, "bulk item failed");
                outcome.failed.push(BulkFailure {
                    id,
                    kind,
                    message: err.to_string(),
                });
            }
        }
    }
    info!(
        action,
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "bulk action finished"
    );
    outcome
}
