//! Items found together with a main item

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::item::{Classification, FoundItem, FoundItemId};
use crate::lifecycle::CustodyStatus;

/// A secondary item; it follows its parent's custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundledSubItem {
    pub id: i64,
    pub parent_id: FoundItemId,
    pub classification: Classification,
    pub feature: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub high_value: bool,
    pub remarks: Option<String>,
}

impl BundledSubItem {
    /// Custody of a bundled item is whatever its parent's is
    pub fn disposition(&self, parent: &FoundItem) -> CustodyStatus {
        parent.custody_status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBundledSubItem {
    pub classification: Classification,
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub high_value: bool,
    #[serde(default)]
    pub remarks: Option<String>,
}

fn one() -> u32 {
    1
}

impl NewBundledSubItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        if self.classification.large.trim().is_empty() {
            err.push("classification.large", "must not be blank");
        }
        if self.quantity == 0 {
            err.push("quantity", "must be at least 1");
        }
        err.into_result()
    }
}
