//! Filter specifications for workflow screens

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::item::{FinderType, LossReportStatus, OwnerWaiver};
use crate::lifecycle::{CustodyStatus, RefundStatus};

/// Which record type a screen lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    FoundItems,
    LossReports,
}

/// How a field's values compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Date,
    Timestamp,
    Bool,
    FinderType,
    OwnerWaiver,
}

/// Searchable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    MainId,
    FinderType,
    OwnerWaiver,
    FoundAt,
    ReceivedAt,
    FoundArea,
    ClassLarge,
    ClassMedium,
    ClassSmall,
    Feature,
    Color,
    HighValue,
    StorageLocation,
    FinderName,
    ReceiptNumber,
    SellingPrice,
    PoliceFiledDate,
    RefundExpectedDate,
    RefundDate,
    DisposalDate,
    ReturnDate,
    ExpiresOn,
    ReportedAt,
    LostAt,
    LostArea,
    ReporterName,
    ReporterPhone,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Id | Field::SellingPrice => FieldKind::Integer,
            Field::FinderType => FieldKind::FinderType,
            Field::OwnerWaiver => FieldKind::OwnerWaiver,
            Field::HighValue => FieldKind::Bool,
            Field::FoundAt | Field::ReceivedAt | Field::ReportedAt => FieldKind::Timestamp,
            Field::PoliceFiledDate
            | Field::RefundExpectedDate
            | Field::RefundDate
            | Field::DisposalDate
            | Field::ReturnDate
            | Field::ExpiresOn
            | Field::LostAt => FieldKind::Date,
            Field::MainId
            | Field::FoundArea
            | Field::ClassLarge
            | Field::ClassMedium
            | Field::ClassSmall
            | Field::Feature
            | Field::Color
            | Field::StorageLocation
            | Field::FinderName
            | Field::ReceiptNumber
            | Field::LostArea
            | Field::ReporterName
            | Field::ReporterPhone => FieldKind::Text,
        }
    }

    /// Column backing this field, or `None` when the target has no such field
    pub fn column(&self, target: Target) -> Option<&'static str> {
        let shared = match self {
            Field::Id => Some("id"),
            Field::ClassLarge => Some("class_large"),
            Field::ClassMedium => Some("class_medium"),
            Field::ClassSmall => Some("class_small"),
            Field::Feature => Some("feature"),
            Field::Color => Some("color"),
            Field::ExpiresOn => Some("expires_on"),
            _ => None,
        };
        if shared.is_some() {
            return shared;
        }
        match (target, self) {
            (Target::FoundItems, Field::MainId) => Some("main_id"),
            (Target::FoundItems, Field::FinderType) => Some("finder_type"),
            (Target::FoundItems, Field::OwnerWaiver) => Some("owner_waiver"),
            (Target::FoundItems, Field::FoundAt) => Some("found_at"),
            (Target::FoundItems, Field::ReceivedAt) => Some("received_at"),
            (Target::FoundItems, Field::FoundArea) => Some("found_area"),
            (Target::FoundItems, Field::HighValue) => Some("high_value"),
            (Target::FoundItems, Field::StorageLocation) => Some("storage_location"),
            (Target::FoundItems, Field::FinderName) => Some("finder_name"),
            (Target::FoundItems, Field::ReceiptNumber) => Some("receipt_number"),
            (Target::FoundItems, Field::SellingPrice) => Some("selling_price"),
            (Target::FoundItems, Field::PoliceFiledDate) => Some("police_filed_date"),
            (Target::FoundItems, Field::RefundExpectedDate) => Some("refund_expected_date"),
            (Target::FoundItems, Field::RefundDate) => Some("refund_date"),
            (Target::FoundItems, Field::DisposalDate) => Some("disposal_date"),
            (Target::FoundItems, Field::ReturnDate) => Some("return_date"),
            (Target::LossReports, Field::ReportedAt) => Some("reported_at"),
            (Target::LossReports, Field::LostAt) => Some("lost_at"),
            (Target::LossReports, Field::LostArea) => Some("lost_area"),
            (Target::LossReports, Field::ReporterName) => Some("reporter_name"),
            (Target::LossReports, Field::ReporterPhone) => Some("reporter_phone"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::MainId => "main_id",
            Field::FinderType => "finder_type",
            Field::OwnerWaiver => "owner_waiver",
            Field::FoundAt => "found_at",
            Field::ReceivedAt => "received_at",
            Field::FoundArea => "found_area",
            Field::ClassLarge => "class_large",
            Field::ClassMedium => "class_medium",
            Field::ClassSmall => "class_small",
            Field::Feature => "feature",
            Field::Color => "color",
            Field::HighValue => "high_value",
            Field::StorageLocation => "storage_location",
            Field::FinderName => "finder_name",
            Field::ReceiptNumber => "receipt_number",
            Field::SellingPrice => "selling_price",
            Field::PoliceFiledDate => "police_filed_date",
            Field::RefundExpectedDate => "refund_expected_date",
            Field::RefundDate => "refund_date",
            Field::DisposalDate => "disposal_date",
            Field::ReturnDate => "return_date",
            Field::ExpiresOn => "expires_on",
            Field::ReportedAt => "reported_at",
            Field::LostAt => "lost_at",
            Field::LostArea => "lost_area",
            Field::ReporterName => "reporter_name",
            Field::ReporterPhone => "reporter_phone",
        }
    }
}

/// Literal compared against a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    fn fits(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Value::Null, _) => true,
            (Value::Int(_), FieldKind::Integer) => true,
            (Value::Text(_), FieldKind::Text) => true,
            (Value::Text(s), FieldKind::FinderType) => s.parse::<FinderType>().is_ok(),
            (Value::Text(s), FieldKind::OwnerWaiver) => s.parse::<OwnerWaiver>().is_ok(),
            (Value::Date(_), FieldKind::Date | FieldKind::Timestamp) => true,
            (Value::Bool(_), FieldKind::Bool) => true,
            _ => false,
        }
    }
}

/// One optional condition of a filter specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Clause {
    /// Inclusive day range; either bound may be open
    DateRange {
        field: Field,
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
    /// Inclusive integer range; either bound may be open
    IntRange {
        field: Field,
        #[serde(default)]
        start: Option<i64>,
        #[serde(default)]
        end: Option<i64>,
    },
    /// Case-insensitive substring match
    TextContains { field: Field, pattern: String },
    Equals { field: Field, value: Value },
}

impl Clause {
    pub fn field(&self) -> Field {
        match self {
            Clause::DateRange { field, .. }
            | Clause::IntRange { field, .. }
            | Clause::TextContains { field, .. }
            | Clause::Equals { field, .. } => *field,
        }
    }
}

/// A status in one of the three state dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRef {
    Custody(CustodyStatus),
    Refund(RefundStatus),
    Loss(LossReportStatus),
}

impl StatusRef {
    pub fn target(&self) -> Target {
        match self {
            StatusRef::Custody(_) | StatusRef::Refund(_) => Target::FoundItems,
            StatusRef::Loss(_) => Target::LossReports,
        }
    }
}

impl std::fmt::Display for StatusRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusRef::Custody(s) => write!(f, "custody {}", s),
            StatusRef::Refund(s) => write!(f, "refund {}", s),
            StatusRef::Loss(s) => write!(f, "loss report {}", s),
        }
    }
}

/// Opt back in to records a screen hides by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowAlso {
    pub returned: bool,
    pub police_filed: bool,
    pub refunded: bool,
    pub processed: bool,
    pub sold: bool,
    pub disposed: bool,
    pub resolved: bool,
}

/// What a caller asks a screen to show
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub clauses: Vec<Clause>,
    /// Hidden in addition to the screen's defaults
    pub exclude_statuses: Vec<StatusRef>,
    pub show_also: ShowAlso,
}

impl FilterSpec {
    pub fn with_clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn excluding(mut self, status: StatusRef) -> Self {
        self.exclude_statuses.push(status);
        self
    }

    pub fn showing(mut self, show_also: ShowAlso) -> Self {
        self.show_also = show_also;
        self
    }

    /// Type-check every clause and status against the target
    pub fn check(&self, target: Target) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();

        for (i, clause) in self.clauses.iter().enumerate() {
            let path = format!("clauses[{}]", i);
            let field = clause.field();
            if field.column(target).is_none() {
                err.push(
                    format!("{}.field", path),
                    format!("{} is not searchable here", field.as_str()),
                );
                continue;
            }
            let kind = field.kind();
            match clause {
                Clause::DateRange { start, end, .. } => {
                    if !matches!(kind, FieldKind::Date | FieldKind::Timestamp) {
                        err.push(
                            format!("{}.field", path),
                            format!("{} is not a date field", field.as_str()),
                        );
                    } else if let (Some(s), Some(e)) = (start, end) {
                        if s > e {
                            err.push(path, "start must not be after end");
                        }
                    }
                }
                Clause::IntRange { start, end, .. } => {
                    if kind != FieldKind::Integer {
                        err.push(
                            format!("{}.field", path),
                            format!("{} is not an integer field", field.as_str()),
                        );
                    } else if let (Some(s), Some(e)) = (start, end) {
                        if s > e {
                            err.push(path, "start must not be after end");
                        }
                    }
                }
                Clause::TextContains { .. } => {
                    if kind != FieldKind::Text {
                        err.push(
                            format!("{}.field", path),
                            format!("{} is not a text field", field.as_str()),
                        );
                    }
                }
                Clause::Equals { value, .. } => {
                    if !value.fits(kind) {
                        err.push(
                            format!("{}.value", path),
                            format!("value does not match {}", field.as_str()),
                        );
                    }
                }
            }
        }

        for (i, status) in self.exclude_statuses.iter().enumerate() {
            if status.target() != target {
                err.push(
                    format!("exclude_statuses[{}]", i),
                    format!("{} does not apply here", status),
                );
            }
        }

        err.into_result()
    }
}
