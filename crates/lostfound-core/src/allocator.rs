//! Receipt numbers for found items
//!
//! A receipt number reads `{prefix}{yy}{seq}`: the finder-type digit, the
//! two-digit year and a five-digit sequence that restarts every year for each
//! finder type. The counter itself lives in the store (see
//! [`ItemStore::allocate`](crate::store::ItemStore::allocate)); this module
//! only knows how numbers are shaped and advanced.

use serde::{Deserialize, Serialize};

use crate::error::AllocatorError;
use crate::item::FinderType;

/// Largest sequence that fits the five-digit field
pub const MAX_SEQ: u32 = 99_999;

/// One issued receipt number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId {
    pub finder_type: FinderType,
    /// Full calendar year; only `year % 100` is displayed
    pub year: i32,
    pub seq: u32,
}

impl DisplayId {
    pub fn new(finder_type: FinderType, year: i32, seq: u32) -> Result<Self, AllocatorError> {
        check_year(year)?;
        if seq > MAX_SEQ {
            return Err(AllocatorError::SequenceExhausted { finder_type, year });
        }
        Ok(Self {
            finder_type,
            year,
            seq,
        })
    }

    /// Next number after `last_seq` in the same scope
    pub fn next_after(
        finder_type: FinderType,
        year: i32,
        last_seq: u32,
    ) -> Result<Self, AllocatorError> {
        let seq = last_seq
            .checked_add(1)
            .ok_or(AllocatorError::SequenceExhausted { finder_type, year })?;
        Self::new(finder_type, year, seq)
    }
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{:02}{:05}",
            self.finder_type.prefix(),
            self.year % 100,
            self.seq
        )
    }
}

/// Years the store accepts as a numbering scope
pub fn check_year(year: i32) -> Result<(), AllocatorError> {
    if (1..=9999).contains(&year) {
        Ok(())
    } else {
        Err(AllocatorError::InvalidYear(year))
    }
}
