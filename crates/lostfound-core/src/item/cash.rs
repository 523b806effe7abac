//! Cash breakdown for found money

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::item::FoundItemId;

/// Yen notes and coins counted at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Denomination {
    Yen10000,
    Yen5000,
    Yen2000,
    Yen1000,
    Yen500,
    Yen100,
    Yen50,
    Yen10,
    Yen5,
    Yen1,
}

impl Denomination {
    pub const ALL: [Denomination; 10] = [
        Denomination::Yen10000,
        Denomination::Yen5000,
        Denomination::Yen2000,
        Denomination::Yen1000,
        Denomination::Yen500,
        Denomination::Yen100,
        Denomination::Yen50,
        Denomination::Yen10,
        Denomination::Yen5,
        Denomination::Yen1,
    ];

    pub fn face_value(&self) -> i64 {
        match self {
            Denomination::Yen10000 => 10_000,
            Denomination::Yen5000 => 5_000,
            Denomination::Yen2000 => 2_000,
            Denomination::Yen1000 => 1_000,
            Denomination::Yen500 => 500,
            Denomination::Yen100 => 100,
            Denomination::Yen50 => 50,
            Denomination::Yen10 => 10,
            Denomination::Yen5 => 5,
            Denomination::Yen1 => 1,
        }
    }

    /// Column name in `cash_breakdowns`
    pub fn column(&self) -> &'static str {
        match self {
            Denomination::Yen10000 => "yen_10000",
            Denomination::Yen5000 => "yen_5000",
            Denomination::Yen2000 => "yen_2000",
            Denomination::Yen1000 => "yen_1000",
            Denomination::Yen500 => "yen_500",
            Denomination::Yen100 => "yen_100",
            Denomination::Yen50 => "yen_50",
            Denomination::Yen10 => "yen_10",
            Denomination::Yen5 => "yen_5",
            Denomination::Yen1 => "yen_1",
        }
    }
}

/// Commemorative coin, counted at its face value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorialCoin {
    pub name: String,
    pub value: i64,
}

/// Per-denomination counts for one found item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBreakdown {
    pub item_id: FoundItemId,
    pub counts: BTreeMap<Denomination, u32>,
    pub memorial_coins: Vec<MemorialCoin>,
    pub total: i64,
}

impl CashBreakdown {
    /// Build a breakdown with its total computed from the counts
    pub fn new(
        item_id: FoundItemId,
        counts: BTreeMap<Denomination, u32>,
        memorial_coins: Vec<MemorialCoin>,
    ) -> Result<Self, ValidationError> {
        let mut err = ValidationError::new();
        for (i, coin) in memorial_coins.iter().enumerate() {
            if coin.name.trim().is_empty() {
                err.push(format!("memorial_coins[{}].name", i), "must not be blank");
            }
            if coin.value <= 0 {
                err.push(format!("memorial_coins[{}].value", i), "must be positive");
            }
        }
        err.into_result()?;

        let mut breakdown = Self {
            item_id,
            counts,
            memorial_coins,
            total: 0,
        };
        breakdown.total = breakdown
            .computed_total()
            .ok_or_else(|| ValidationError::field("total", "amount is too large"))?;
        Ok(breakdown)
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts.get(&denomination).copied().unwrap_or(0)
    }

    /// Σ(count × face value) + Σ(memorial coin values), `None` on overflow
    pub fn computed_total(&self) -> Option<i64> {
        let notes = self.counts.iter().try_fold(0i64, |acc, (d, n)| {
            d.face_value()
                .checked_mul(i64::from(*n))
                .and_then(|v| acc.checked_add(v))
        })?;
        self.memorial_coins
            .iter()
            .try_fold(notes, |acc, c| acc.checked_add(c.value))
    }

    /// Whether the stored total still matches the counts
    pub fn is_consistent(&self) -> bool {
        self.computed_total() == Some(self.total)
    }
}
