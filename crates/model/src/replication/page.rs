use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest offset or limit a page may address; both bind as `bigint`.
pub const MAX_ROW_BOUND: u64 = i64::MAX as u64;

/// One fixed-size slice of a table, ordered by primary key. Indices start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub table: String,
    pub index: u64,
    pub size: u64,
}

impl Page {
    pub fn new(table: impl Into<String>, index: u64, size: u64) -> Self {
        Self {
            table: table.into(),
            index,
            size,
        }
    }

    /// Rows skipped before this page. `None` for index 0 or when the
    /// offset does not fit in [`MAX_ROW_BOUND`].
    pub fn offset(&self) -> Option<u64> {
        self.index
            .checked_sub(1)?
            .checked_mul(self.size)
            .filter(|offset| *offset <= MAX_ROW_BOUND)
    }

    /// Whether the page can be turned into an offset/limit query.
    pub fn is_addressable(&self) -> bool {
        self.size > 0 && self.size <= MAX_ROW_BOUND && self.offset().is_some()
    }

    pub fn limit(&self) -> u64 {
        self.size
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} page {} (size {})", self.table, self.index, self.size)
    }
}
