use serde::{Deserialize, Serialize};

/// Page size of list endpoints unless they say otherwise.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Query parameters for paginated lists. Pages are 1-based.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    /// The requested page, clamped to 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// One page of a list along with what the caller needs to render pager links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64) as u32
        };
        Self {
            items,
            page,
            per_page,
            total,
            pages,
        }
    }

    /// Row offset of the first item of `page`.
    pub fn offset(page: u32, per_page: u32) -> u64 {
        (page.max(1) as u64 - 1) * per_page as u64
    }
}
