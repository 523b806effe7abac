//! Custody and refund state machines
//!
//! Custody:
//! ```text
//! Stored → PoliceFiled → { ReturnedToOwner | Disposed | Sold }
//!    └──────────────────→ ReturnedToOwner
//! ```
//!
//! Refund:
//! ```text
//! None → Scheduled → Refunded → Processed
//!   └───────┴────────────────→ Processed   (police queue)
//! ```

use serde::{Deserialize, Serialize};

/// Where a found item physically stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyStatus {
    /// Held at the desk
    Stored,
    /// Reported to the police, still held
    PoliceFiled,
    /// Collected by its owner
    ReturnedToOwner,
    /// Thrown away after the retention period
    Disposed,
    /// Sold after the retention period
    Sold,
}

impl CustodyStatus {
    pub const ALL: [CustodyStatus; 5] = [
        CustodyStatus::Stored,
        CustodyStatus::PoliceFiled,
        CustodyStatus::ReturnedToOwner,
        CustodyStatus::Disposed,
        CustodyStatus::Sold,
    ];

    /// Check if a state transition is valid
    pub fn can_transition_to(&self, target: &CustodyStatus) -> bool {
        match (self, target) {
            (CustodyStatus::Stored, CustodyStatus::PoliceFiled) => true,
            (CustodyStatus::Stored, CustodyStatus::ReturnedToOwner) => true,

            (CustodyStatus::PoliceFiled, CustodyStatus::ReturnedToOwner) => true,
            (CustodyStatus::PoliceFiled, CustodyStatus::Disposed) => true,
            (CustodyStatus::PoliceFiled, CustodyStatus::Sold) => true,

            _ => false,
        }
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<CustodyStatus> {
        match self {
            CustodyStatus::Stored => {
                vec![CustodyStatus::PoliceFiled, CustodyStatus::ReturnedToOwner]
            }
            CustodyStatus::PoliceFiled => vec![
                CustodyStatus::ReturnedToOwner,
                CustodyStatus::Disposed,
                CustodyStatus::Sold,
            ],
            CustodyStatus::ReturnedToOwner | CustodyStatus::Disposed | CustodyStatus::Sold => {
                vec![]
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CustodyStatus::ReturnedToOwner | CustodyStatus::Disposed | CustodyStatus::Sold
        )
    }

    /// Still physically at the desk
    pub fn is_held(&self) -> bool {
        matches!(self, CustodyStatus::Stored | CustodyStatus::PoliceFiled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustodyStatus::Stored => "STORED",
            CustodyStatus::PoliceFiled => "POLICE_FILED",
            CustodyStatus::ReturnedToOwner => "RETURNED_TO_OWNER",
            CustodyStatus::Disposed => "DISPOSED",
            CustodyStatus::Sold => "SOLD",
        }
    }
}

impl Default for CustodyStatus {
    fn default() -> Self {
        CustodyStatus::Stored
    }
}

impl std::fmt::Display for CustodyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustodyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CustodyStatus::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown custody status '{}'", s))
    }
}

/// Where a found item stands in the money refund workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// Not in the refund workflow
    None,
    /// Refund receipt issued, payout pending
    Scheduled,
    /// Paid out to the finder
    Refunded,
    /// Closed out; off every active refund queue
    Processed,
}

impl RefundStatus {
    pub const ALL: [RefundStatus; 4] = [
        RefundStatus::None,
        RefundStatus::Scheduled,
        RefundStatus::Refunded,
        RefundStatus::Processed,
    ];

    /// Check if a state transition is valid
    pub fn can_transition_to(&self, target: &RefundStatus) -> bool {
        match (self, target) {
            (RefundStatus::None, RefundStatus::Scheduled) => true,
            (RefundStatus::Scheduled, RefundStatus::Refunded) => true,
            (RefundStatus::Refunded, RefundStatus::Processed) => true,

            // Police queue closes straight to Processed
            (RefundStatus::None, RefundStatus::Processed) => true,
            (RefundStatus::Scheduled, RefundStatus::Processed) => true,

            _ => false,
        }
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<RefundStatus> {
        match self {
            RefundStatus::None => vec![RefundStatus::Scheduled, RefundStatus::Processed],
            RefundStatus::Scheduled => vec![RefundStatus::Refunded, RefundStatus::Processed],
            RefundStatus::Refunded => vec![RefundStatus::Processed],
            RefundStatus::Processed => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RefundStatus::Processed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::None => "NONE",
            RefundStatus::Scheduled => "SCHEDULED",
            RefundStatus::Refunded => "REFUNDED",
            RefundStatus::Processed => "PROCESSED",
        }
    }
}

impl Default for RefundStatus {
    fn default() -> Self {
        RefundStatus::None
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RefundStatus::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown refund status '{}'", s))
    }
}
