//! Loss reports filed by people looking for something

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{InvalidTransitionError, ValidationError};
use crate::item::{Classification, ContactBlock};

pub type LossReportId = i64;

/// OPEN until staff match it to a found item (or give up) and resolve it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LossReportStatus {
    #[default]
    Open,
    Resolved,
}

impl LossReportStatus {
    pub fn can_transition_to(&self, target: LossReportStatus) -> bool {
        matches!(
            (self, target),
            (LossReportStatus::Open, LossReportStatus::Resolved)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LossReportStatus::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LossReportStatus::Open => "OPEN",
            LossReportStatus::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for LossReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LossReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(LossReportStatus::Open),
            "RESOLVED" => Ok(LossReportStatus::Resolved),
            other => Err(format!("unknown loss report status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossReport {
    pub id: LossReportId,
    pub reported_at: NaiveDateTime,
    pub lost_at: Option<NaiveDate>,
    pub lost_area: Option<String>,
    pub reporter: ContactBlock,
    pub classification: Classification,
    pub feature: String,
    pub color: Option<String>,
    /// Date after which the report is no longer kept
    pub expires_on: Option<NaiveDate>,
    pub status: LossReportStatus,
    pub resolved_on: Option<NaiveDate>,
}

impl LossReport {
    pub fn from_new(id: LossReportId, new: NewLossReport) -> Self {
        Self {
            id,
            reported_at: new.reported_at,
            lost_at: new.lost_at,
            lost_area: new.lost_area,
            reporter: new.reporter,
            classification: new.classification,
            feature: new.feature,
            color: new.color,
            expires_on: new.expires_on,
            status: LossReportStatus::Open,
            resolved_on: None,
        }
    }

    /// Close the report; only an open report can be resolved
    pub fn resolve(&self, resolved_on: NaiveDate) -> Result<LossReport, InvalidTransitionError> {
        if !self.status.can_transition_to(LossReportStatus::Resolved) {
            return Err(InvalidTransitionError {
                transition: "RESOLVE".to_string(),
                from: self.status.to_string(),
            });
        }
        let mut next = self.clone();
        next.status = LossReportStatus::Resolved;
        next.resolved_on = Some(resolved_on);
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLossReport {
    pub reported_at: NaiveDateTime,
    #[serde(default)]
    pub lost_at: Option<NaiveDate>,
    #[serde(default)]
    pub lost_area: Option<String>,
    pub reporter: ContactBlock,
    pub classification: Classification,
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
}

impl NewLossReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        if self
            .reporter
            .name
            .as_deref()
            .map_or(true, |n| n.trim().is_empty())
        {
            err.push("reporter.name", "must not be blank");
        }
        let has_phone = self
            .reporter
            .phone
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let has_address = self
            .reporter
            .address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        if !has_phone && !has_address {
            err.push("reporter.phone", "a phone number or address is required");
        }
        if self.classification.large.trim().is_empty() {
            err.push("classification.large", "must not be blank");
        }
        if let Some(lost_at) = self.lost_at {
            if lost_at > self.reported_at.date() {
                err.push("lost_at", "must not be after reported_at");
            }
        }
        err.into_result()
    }
}
