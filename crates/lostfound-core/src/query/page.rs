use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Rows per screen page
pub const PAGE_SIZE: u32 = 50;

/// One page of an id-ordered result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matches across every page
    pub total: u64,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32) -> Self {
        Self {
            items,
            total,
            page,
            page_size: PAGE_SIZE,
            page_count: page_count(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
        }
    }
}

pub fn page_count(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Row offset of a 1-based page
pub fn offset(page: u32) -> Result<u64, ValidationError> {
    if page == 0 {
        return Err(ValidationError::field("page", "pages start at 1"));
    }
    Ok(u64::from(page - 1) * u64::from(PAGE_SIZE))
}
