//! Workflow screens and what each hides by default

use serde::{Deserialize, Serialize};

use crate::item::LossReportStatus;
use crate::lifecycle::{CustodyStatus, RefundStatus};

use super::criteria::{FilterSpec, ShowAlso, StatusRef, Target};

/// Named workflow views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Items,
    PoliceFiling,
    RefundRegistration,
    RefundProcessing,
    RefundedDisposition,
    RefundList,
    Disposal,
    LossReports,
}

/// `ShowAlso` flag that lifts a default exclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lift {
    Returned,
    PoliceFiled,
    Refunded,
    Processed,
    Sold,
    Disposed,
    Resolved,
}

impl ShowAlso {
    pub fn lifts(&self, lift: Lift) -> bool {
        match lift {
            Lift::Returned => self.returned,
            Lift::PoliceFiled => self.police_filed,
            Lift::Refunded => self.refunded,
            Lift::Processed => self.processed,
            Lift::Sold => self.sold,
            Lift::Disposed => self.disposed,
            Lift::Resolved => self.resolved,
        }
    }
}

/// A status hidden unless its flag is set; `lifted_by: None` is always hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultExclusion {
    pub status: StatusRef,
    pub lifted_by: Option<Lift>,
}

const fn custody(status: CustodyStatus, lift: Lift) -> DefaultExclusion {
    DefaultExclusion {
        status: StatusRef::Custody(status),
        lifted_by: Some(lift),
    }
}

const fn refund(status: RefundStatus, lift: Option<Lift>) -> DefaultExclusion {
    DefaultExclusion {
        status: StatusRef::Refund(status),
        lifted_by: lift,
    }
}

const RETURNED: DefaultExclusion = custody(CustodyStatus::ReturnedToOwner, Lift::Returned);

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Items,
        Screen::PoliceFiling,
        Screen::RefundRegistration,
        Screen::RefundProcessing,
        Screen::RefundedDisposition,
        Screen::RefundList,
        Screen::Disposal,
        Screen::LossReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Items => "items",
            Screen::PoliceFiling => "police_filing",
            Screen::RefundRegistration => "refund_registration",
            Screen::RefundProcessing => "refund_processing",
            Screen::RefundedDisposition => "refunded_disposition",
            Screen::RefundList => "refund_list",
            Screen::Disposal => "disposal",
            Screen::LossReports => "loss_reports",
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Screen::LossReports => Target::LossReports,
            _ => Target::FoundItems,
        }
    }

    pub fn default_exclusions(&self) -> Vec<DefaultExclusion> {
        use Lift::*;
        match self {
            Screen::Items => vec![RETURNED],
            Screen::PoliceFiling => {
                vec![custody(CustodyStatus::PoliceFiled, PoliceFiled), RETURNED]
            }
            Screen::RefundRegistration => vec![
                refund(RefundStatus::Refunded, Some(Refunded)),
                refund(RefundStatus::Processed, Some(Processed)),
                RETURNED,
            ],
            Screen::RefundProcessing => vec![
                refund(RefundStatus::None, None),
                refund(RefundStatus::Refunded, Some(Refunded)),
                refund(RefundStatus::Processed, Some(Refunded)),
                RETURNED,
            ],
            Screen::RefundedDisposition => vec![
                refund(RefundStatus::None, None),
                refund(RefundStatus::Scheduled, None),
                refund(RefundStatus::Processed, Some(Processed)),
                RETURNED,
            ],
            Screen::RefundList => vec![
                refund(RefundStatus::None, None),
                refund(RefundStatus::Processed, None),
                refund(RefundStatus::Refunded, Some(Refunded)),
                RETURNED,
            ],
            Screen::Disposal => vec![
                custody(CustodyStatus::Sold, Sold),
                custody(CustodyStatus::Disposed, Disposed),
                RETURNED,
            ],
            Screen::LossReports => vec![DefaultExclusion {
                status: StatusRef::Loss(LossReportStatus::Resolved),
                lifted_by: Some(Resolved),
            }],
        }
    }

    /// Statuses hidden for `spec`: unlifted defaults plus explicit exclusions
    pub fn effective_exclusions(&self, spec: &FilterSpec) -> Vec<StatusRef> {
        let mut out: Vec<StatusRef> = self
            .default_exclusions()
            .into_iter()
            .filter(|d| d.lifted_by.map_or(true, |l| !spec.show_also.lifts(l)))
            .map(|d| d.status)
            .collect();
        for status in &spec.exclude_statuses {
            if !out.contains(status) {
                out.push(*status);
            }
        }
        out
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str() == s)
            .ok_or_else(|| format!("unknown screen '{}'", s))
    }
}
