//! Pagination types for list pages.

use serde::Deserialize;

use crate::config::DEFAULT_PAGE_NUMBER;

/// Pagination query parameters.
///
/// `page` is kept as raw text so that a non-integer value falls back to
/// the first page instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub page: Option<String>,
}

impl PaginationParams {
    /// Requested page number; missing or non-integer values give page 1.
    /// Zero and negative numbers are kept so the caller can reject them.
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_NUMBER as i64)
    }
}

/// One page of items plus the numbers needed to render page links
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated result
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if per_page > 0 {
            total.div_ceil(per_page)
        } else {
            0
        };

        Self {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    /// Page numbers to link to, with `None` marking an elided gap.
    ///
    /// Keeps the first and last page plus two pages either side of the
    /// current one.
    pub fn page_links(&self) -> Vec<Option<u64>> {
        const EDGE: u64 = 1;
        const AROUND: u64 = 2;

        let mut links = Vec::new();
        let mut last_shown = 0;
        for number in 1..=self.total_pages {
            let near_edge = number <= EDGE || number > self.total_pages.saturating_sub(EDGE);
            let near_current = number + AROUND >= self.page && number <= self.page + AROUND;
            if near_edge || near_current {
                if last_shown + 1 != number {
                    links.push(None);
                }
                links.push(Some(number));
                last_shown = number;
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(raw: Option<&str>) -> PaginationParams {
        PaginationParams {
            page: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_page_defaults_to_first() {
        assert_eq!(params(None).page(), 1);
        assert_eq!(params(Some("abc")).page(), 1);
        assert_eq!(params(Some("")).page(), 1);
    }

    #[test]
    fn test_page_keeps_out_of_range_numbers() {
        assert_eq!(params(Some("3")).page(), 3);
        assert_eq!(params(Some("0")).page(), 0);
        assert_eq!(params(Some("-2")).page(), -2);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Paginated::new(vec![1, 2, 3], 1, 3, 7);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_prev());
        assert_eq!(page.next_num(), Some(2));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page = Paginated::new(vec![7], 3, 3, 7);
        assert!(!page.has_next());
        assert_eq!(page.prev_num(), Some(2));
    }

    #[test]
    fn test_empty_set_has_no_pages() {
        let page: Paginated<i32> = Paginated::new(vec![], 1, 3, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.page_links().is_empty());
    }

    #[test]
    fn test_page_links_elide_distant_pages() {
        let page: Paginated<i32> = Paginated::new(vec![], 6, 3, 30);
        assert_eq!(
            page.page_links(),
            vec![
                Some(1),
                None,
                Some(4),
                Some(5),
                Some(6),
                Some(7),
                Some(8),
                None,
                Some(10)
            ]
        );
    }
}
