pub mod account_service;
pub mod ai_assist;
pub mod chat_service;
pub mod email;
pub mod feed_service;
pub mod gemini;
pub mod habit_service;
pub mod leaderboard_service;
pub mod note_service;
pub mod portfolio_service;
pub mod stats_service;
pub mod storage;
pub mod strategy_service;
pub mod trade_service;
pub mod watchlist_service;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// `?page=&limit=` query parameters, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Clamps to a valid `(page, limit)` pair.
    pub fn resolve(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_is_clamped() {
        let q = PageQuery { page: Some(0), limit: Some(1000) };
        assert_eq!(q.resolve(), (1, MAX_PAGE_SIZE));
        assert_eq!(PageQuery::default().resolve(), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
