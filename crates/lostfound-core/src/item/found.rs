//! Found item records

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::allocator::DisplayId;
use crate::error::ValidationError;
use crate::lifecycle::{CustodyStatus, RefundStatus, RefundedDisposition};

/// Store-assigned row id; ascending in intake order
pub type FoundItemId = i64;

/// Who picked the item up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinderType {
    /// Found by facility staff (the premises occupier)
    OwnerFound,
    /// Found by a customer or other third party
    ThirdPartyFound,
}

impl FinderType {
    /// Leading digit of the receipt number
    pub fn prefix(&self) -> char {
        match self {
            FinderType::OwnerFound => '1',
            FinderType::ThirdPartyFound => '2',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinderType::OwnerFound => "OWNER_FOUND",
            FinderType::ThirdPartyFound => "THIRD_PARTY_FOUND",
        }
    }
}

impl std::fmt::Display for FinderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FinderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER_FOUND" => Ok(FinderType::OwnerFound),
            "THIRD_PARTY_FOUND" => Ok(FinderType::ThirdPartyFound),
            other => Err(format!("unknown finder type '{}'", other)),
        }
    }
}

/// Whether the finder keeps their statutory rights to the item and reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerWaiver {
    #[default]
    Retains,
    WaivesAll,
}

impl OwnerWaiver {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerWaiver::Retains => "RETAINS",
            OwnerWaiver::WaivesAll => "WAIVES_ALL",
        }
    }
}

impl std::str::FromStr for OwnerWaiver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RETAINS" => Ok(OwnerWaiver::Retains),
            "WAIVES_ALL" => Ok(OwnerWaiver::WaivesAll),
            other => Err(format!("unknown owner waiver '{}'", other)),
        }
    }
}

/// Three-level category (large / medium / small)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub large: String,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
}

/// Contact details for a finder, owner or reporter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBlock {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Department, for staff finders
    #[serde(default)]
    pub affiliation: Option<String>,
}

/// Record of the owner being contacted before collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContact {
    pub contacted_at: NaiveDateTime,
    pub owner: ContactBlock,
    pub contacted_by: String,
}

/// Who collected the item and who handed it over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub owner: ContactBlock,
    pub handled_by: String,
    #[serde(default)]
    pub identity_document: Option<String>,
}

/// A recovered item and everything that has happened to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundItem {
    pub id: FoundItemId,
    /// Display/receipt number, unique per (finder_type, year_scope)
    pub main_id: String,
    pub main_seq: u32,
    pub year_scope: i32,
    pub finder_type: FinderType,
    pub custody_status: CustodyStatus,
    pub refund_status: RefundStatus,

    // Intake
    pub found_at: NaiveDateTime,
    pub received_at: NaiveDateTime,
    pub received_by: Option<String>,
    pub found_area: Option<String>,
    pub classification: Classification,
    pub feature: String,
    pub color: Option<String>,
    pub high_value: bool,
    pub quantity: u32,
    pub storage_location: Option<String>,
    pub expires_on: Option<NaiveDate>,
    pub finder: ContactBlock,
    pub owner_waiver: OwnerWaiver,

    // Police
    pub police_filed_date: Option<NaiveDate>,
    pub police_station: Option<String>,

    // Refund
    pub receipt_number: Option<String>,
    pub refund_expected_date: Option<NaiveDate>,
    pub refund_date: Option<NaiveDate>,
    pub refund_handled_by: Option<String>,
    pub refunded_disposition: Option<RefundedDisposition>,
    pub refunded_processed_by: Option<String>,
    pub refunded_processed_sub: Option<String>,
    pub refunded_processed_date: Option<NaiveDate>,

    // Disposition
    pub disposal_date: Option<NaiveDate>,
    pub selling_price: Option<i64>,
    pub return_date: Option<NaiveDate>,
    pub returned: Option<ReturnRecord>,
    pub owner_contact: Option<OwnerContact>,
}

impl FoundItem {
    /// Build the freshly stored record for an intake form
    pub fn from_intake(id: FoundItemId, display_id: &DisplayId, new: NewFoundItem) -> Self {
        Self {
            id,
            main_id: display_id.to_string(),
            main_seq: display_id.seq,
            year_scope: display_id.year,
            finder_type: display_id.finder_type,
            custody_status: CustodyStatus::Stored,
            refund_status: RefundStatus::None,
            found_at: new.found_at,
            received_at: new.received_at,
            received_by: new.received_by,
            found_area: new.found_area,
            classification: new.classification,
            feature: new.feature,
            color: new.color,
            high_value: new.high_value,
            quantity: new.quantity,
            storage_location: new.storage_location,
            expires_on: new.expires_on,
            finder: new.finder,
            owner_waiver: new.owner_waiver,
            police_filed_date: None,
            police_station: None,
            receipt_number: None,
            refund_expected_date: None,
            refund_date: None,
            refund_handled_by: None,
            refunded_disposition: None,
            refunded_processed_by: None,
            refunded_processed_sub: None,
            refunded_processed_date: None,
            disposal_date: None,
            selling_price: None,
            return_date: None,
            returned: None,
            owner_contact: None,
        }
    }

    /// `CUSTODY/REFUND`, used in transition errors and logs
    pub fn state_label(&self) -> String {
        format!("{}/{}", self.custody_status, self.refund_status)
    }
}

/// Intake form for a found item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFoundItem {
    pub finder_type: FinderType,
    pub found_at: NaiveDateTime,
    pub received_at: NaiveDateTime,
    #[serde(default)]
    pub received_by: Option<String>,
    #[serde(default)]
    pub found_area: Option<String>,
    pub classification: Classification,
    pub feature: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub high_value: bool,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
    #[serde(default)]
    pub finder: ContactBlock,
    #[serde(default)]
    pub owner_waiver: OwnerWaiver,
}

fn default_quantity() -> u32 {
    1
}

impl NewFoundItem {
    /// Minimal form; the rest of the fields default to empty
    pub fn new(
        finder_type: FinderType,
        found_at: NaiveDateTime,
        received_at: NaiveDateTime,
        large_class: impl Into<String>,
        feature: impl Into<String>,
    ) -> Self {
        Self {
            finder_type,
            found_at,
            received_at,
            received_by: None,
            found_area: None,
            classification: Classification {
                large: large_class.into(),
                medium: None,
                small: None,
            },
            feature: feature.into(),
            color: None,
            high_value: false,
            quantity: default_quantity(),
            storage_location: None,
            expires_on: None,
            finder: ContactBlock::default(),
            owner_waiver: OwnerWaiver::default(),
        }
    }

    /// Year the receipt number is scoped to
    pub fn year_scope(&self) -> i32 {
        self.received_at.year()
    }

    /// Check required intake fields, reporting every problem at once
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();

        if self.classification.large.trim().is_empty() {
            err.push("classification.large", "must not be blank");
        }
        if self.feature.trim().is_empty() {
            err.push("feature", "must not be blank");
        }
        if self.received_at < self.found_at {
            err.push("received_at", "must not be earlier than found_at");
        }
        if self.quantity == 0 {
            err.push("quantity", "must be at least 1");
        }
        if self.finder_type == FinderType::ThirdPartyFound
            && self
                .finder
                .name
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
        {
            err.push("finder.name", "required for third-party finds");
        }

        err.into_result()
    }
}
