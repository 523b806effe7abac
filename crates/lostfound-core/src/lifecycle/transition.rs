//! Lifecycle transitions and their payloads

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvalidTransitionError, Result, ValidationError};
use crate::item::{ContactBlock, FoundItem, OwnerContact, ReturnRecord};

use super::{CustodyStatus, RefundStatus};

const HELD: &[CustodyStatus] = &[CustodyStatus::Stored, CustodyStatus::PoliceFiled];

/// Where money goes once a refund has been paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundedDisposition {
    StoreManager,
    Disposal,
    Deposit,
    Headquarters,
    Hold,
    Police,
}

impl RefundedDisposition {
    pub const ALL: [RefundedDisposition; 6] = [
        RefundedDisposition::StoreManager,
        RefundedDisposition::Disposal,
        RefundedDisposition::Deposit,
        RefundedDisposition::Headquarters,
        RefundedDisposition::Hold,
        RefundedDisposition::Police,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundedDisposition::StoreManager => "STORE_MANAGER",
            RefundedDisposition::Disposal => "DISPOSAL",
            RefundedDisposition::Deposit => "DEPOSIT",
            RefundedDisposition::Headquarters => "HEADQUARTERS",
            RefundedDisposition::Hold => "HOLD",
            RefundedDisposition::Police => "POLICE",
        }
    }
}

impl std::fmt::Display for RefundedDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefundedDisposition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RefundedDisposition::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown refunded disposition '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliceFiling {
    pub filed_on: NaiveDate,
    #[serde(default)]
    pub station: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPayload {
    pub returned_on: NaiveDate,
    pub owner: ContactBlock,
    pub handled_by: String,
    #[serde(default)]
    pub identity_document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalPayload {
    pub disposed_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayload {
    pub sold_on: NaiveDate,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundSchedule {
    pub receipt_number: String,
    pub expected_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundCompletion {
    pub refunded_on: NaiveDate,
    pub handled_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundedProcessing {
    pub disposition: RefundedDisposition,
    pub manager: String,
    #[serde(default)]
    pub sub_manager: Option<String>,
    pub processed_on: NaiveDate,
}

/// A lifecycle move on a found item, with the data it records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transition {
    FilePolice(PoliceFiling),
    ReturnToOwner(ReturnPayload),
    Dispose(DisposalPayload),
    Sell(SalePayload),
    ScheduleRefund(RefundSchedule),
    CompleteRefund(RefundCompletion),
    ProcessRefunded(RefundedProcessing),
    /// Settle a refund through the police; closes straight to PROCESSED
    ClosePoliceQueue(RefundCompletion),
    /// Record that the owner was reached; no state change
    NotifyOwner(OwnerContact),
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn blank_opt(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, blank)
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::FilePolice(_) => "FILE_POLICE",
            Transition::ReturnToOwner(_) => "RETURN_TO_OWNER",
            Transition::Dispose(_) => "DISPOSE",
            Transition::Sell(_) => "SELL",
            Transition::ScheduleRefund(_) => "SCHEDULE_REFUND",
            Transition::CompleteRefund(_) => "COMPLETE_REFUND",
            Transition::ProcessRefunded(_) => "PROCESS_REFUNDED",
            Transition::ClosePoliceQueue(_) => "CLOSE_POLICE_QUEUE",
            Transition::NotifyOwner(_) => "NOTIFY_OWNER",
        }
    }

    /// Custody states this transition may start from
    pub fn allowed_custody(&self) -> &'static [CustodyStatus] {
        match self {
            Transition::FilePolice(_) => &[CustodyStatus::Stored],
            Transition::Dispose(_) | Transition::Sell(_) => &[CustodyStatus::PoliceFiled],
            Transition::ProcessRefunded(_) => &[
                CustodyStatus::Stored,
                CustodyStatus::PoliceFiled,
                CustodyStatus::Disposed,
                CustodyStatus::Sold,
            ],
            Transition::ReturnToOwner(_)
            | Transition::ScheduleRefund(_)
            | Transition::CompleteRefund(_)
            | Transition::ClosePoliceQueue(_)
            | Transition::NotifyOwner(_) => HELD,
        }
    }

    /// Refund states this transition may start from
    pub fn allowed_refund(&self) -> &'static [RefundStatus] {
        match self {
            Transition::ScheduleRefund(_) => &[RefundStatus::None],
            Transition::CompleteRefund(_) => &[RefundStatus::Scheduled],
            Transition::ProcessRefunded(_) => &[RefundStatus::Refunded],
            Transition::ClosePoliceQueue(_) => &[RefundStatus::None, RefundStatus::Scheduled],
            Transition::FilePolice(_)
            | Transition::ReturnToOwner(_)
            | Transition::Dispose(_)
            | Transition::Sell(_)
            | Transition::NotifyOwner(_) => &RefundStatus::ALL,
        }
    }

    /// Check the payload on its own
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut err = ValidationError::new();
        match self {
            Transition::FilePolice(p) => {
                if p.station.as_deref().is_some_and(blank) {
                    err.push("station", "must not be blank when given");
                }
            }
            Transition::ReturnToOwner(p) => {
                if blank_opt(&p.owner.name) {
                    err.push("owner.name", "must not be blank");
                }
                if blank(&p.handled_by) {
                    err.push("handled_by", "must not be blank");
                }
            }
            Transition::Dispose(_) => {}
            Transition::Sell(p) => {
                if p.price < 0 {
                    err.push("price", "must not be negative");
                }
            }
            Transition::ScheduleRefund(p) => {
                if blank(&p.receipt_number) {
                    err.push("receipt_number", "must not be blank");
                }
            }
            Transition::CompleteRefund(p) | Transition::ClosePoliceQueue(p) => {
                if blank(&p.handled_by) {
                    err.push("handled_by", "must not be blank");
                }
            }
            Transition::ProcessRefunded(p) => {
                if blank(&p.manager) {
                    err.push("manager", "must not be blank");
                }
                if p.sub_manager.as_deref().is_some_and(blank) {
                    err.push("sub_manager", "must not be blank when given");
                }
            }
            Transition::NotifyOwner(p) => {
                if blank_opt(&p.owner.name) {
                    err.push("owner.name", "must not be blank");
                }
                if blank(&p.contacted_by) {
                    err.push("contacted_by", "must not be blank");
                }
            }
        }
        err.into_result()
    }

    /// Whether an item in `custody`/`refund` may take this transition
    pub fn permits(&self, custody: CustodyStatus, refund: RefundStatus) -> bool {
        self.allowed_custody().contains(&custody) && self.allowed_refund().contains(&refund)
    }
}

/// Validate and apply a transition, returning the updated item
///
/// The input item is never modified; on error nothing changes.
pub fn apply(item: &FoundItem, transition: &Transition) -> Result<FoundItem> {
    transition.validate()?;

    if !transition.permits(item.custody_status, item.refund_status) {
        return Err(InvalidTransitionError {
            transition: transition.name().to_string(),
            from: item.state_label(),
        }
        .into());
    }

    let mut next = item.clone();
    match transition {
        Transition::FilePolice(p) => {
            next.custody_status = CustodyStatus::PoliceFiled;
            next.police_filed_date = Some(p.filed_on);
            next.police_station = p.station.clone();
        }
        Transition::ReturnToOwner(p) => {
            next.custody_status = CustodyStatus::ReturnedToOwner;
            next.return_date = Some(p.returned_on);
            next.returned = Some(ReturnRecord {
                owner: p.owner.clone(),
                handled_by: p.handled_by.clone(),
                identity_document: p.identity_document.clone(),
            });
        }
        Transition::Dispose(p) => {
            next.custody_status = CustodyStatus::Disposed;
            next.disposal_date = Some(p.disposed_on);
        }
        Transition::Sell(p) => {
            next.custody_status = CustodyStatus::Sold;
            next.disposal_date = Some(p.sold_on);
            next.selling_price = Some(p.price);
        }
        Transition::ScheduleRefund(p) => {
            next.refund_status = RefundStatus::Scheduled;
            next.receipt_number = Some(p.receipt_number.clone());
            next.refund_expected_date = Some(p.expected_on);
        }
        Transition::CompleteRefund(p) => {
            next.refund_status = RefundStatus::Refunded;
            next.refund_date = Some(p.refunded_on);
            next.refund_handled_by = Some(p.handled_by.clone());
        }
        Transition::ProcessRefunded(p) => {
            next.refund_status = RefundStatus::Processed;
            next.refunded_disposition = Some(p.disposition);
            next.refunded_processed_by = Some(p.manager.clone());
            next.refunded_processed_sub = p.sub_manager.clone();
            next.refunded_processed_date = Some(p.processed_on);
        }
        Transition::ClosePoliceQueue(p) => {
            next.refund_status = RefundStatus::Processed;
            next.refund_date = Some(p.refunded_on);
            next.refund_handled_by = Some(p.handled_by.clone());
        }
        Transition::NotifyOwner(p) => {
            next.owner_contact = Some(p.clone());
        }
    }

    debug!(
        item = item.id,
        transition = transition.name(),
        from = %item.state_label(),
        to = %next.state_label(),
        "applied transition"
    );
    Ok(next)
}
