// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page-number pagination for list endpoints.
//!
//! Lists are small, so pagination is done in memory after the scoped query.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: usize = 5;

/// `?page=` query parameter. `all` disables pagination.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn all() -> Self {
        Self {
            page: Some("all".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
    pub is_paginated: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Pick the requested page out of `items`.
    ///
    /// A page number that is not an integer yields the first page, one out of
    /// range yields the last page.
    pub fn paginate(items: Vec<T>, query: &PageQuery, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let raw = query.page.as_deref().unwrap_or("").trim();
        let count = items.len();
        let num_pages = count.div_ceil(per_page).max(1);

        let number = match raw.parse::<i64>() {
            Ok(n) if n < 1 || n as usize > num_pages => num_pages,
            Ok(n) => n as usize,
            Err(_) => 1,
        };

        let show_all = raw.eq_ignore_ascii_case("all") || num_pages == 1;
        if show_all {
            return Self {
                items,
                page: 1,
                num_pages,
                count,
                per_page,
                is_paginated: false,
                has_next: false,
                has_previous: false,
            };
        }

        let start = (number - 1) * per_page;
        let items: Vec<T> = items.into_iter().skip(start).take(per_page).collect();

        Self {
            items,
            page: number,
            num_pages,
            count,
            per_page,
            is_paginated: true,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: &str) -> PageQuery {
        PageQuery {
            page: Some(page.to_string()),
        }
    }

    #[test]
    fn test_first_page_by_default() {
        let page = Page::paginate((1..=12).collect(), &PageQuery::default(), 5);
        assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(page.num_pages, 3);
        assert!(page.is_paginated);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_out_of_range_goes_to_last_page() {
        let page = Page::paginate((1..=12).collect(), &query("99"), 5);
        assert_eq!(page.page, 3);
        assert_eq!(page.items, vec![11, 12]);

        let page = Page::paginate((1..=12).collect(), &query("0"), 5);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_garbage_goes_to_first_page() {
        let page = Page::paginate((1..=12).collect(), &query("abc"), 5);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_all_disables_pagination() {
        let page = Page::paginate((1..=12).collect(), &query("ALL"), 5);
        assert!(!page.is_paginated);
        assert_eq!(page.items.len(), 12);
    }

    #[test]
    fn test_single_page_is_not_paginated() {
        let page = Page::paginate(vec![1, 2], &query("2"), 5);
        assert!(!page.is_paginated);
        assert_eq!(page.items, vec![1, 2]);

        let empty: Page<i32> = Page::paginate(vec![], &PageQuery::default(), 5);
        assert_eq!(empty.num_pages, 1);
        assert_eq!(empty.count, 0);
    }
}
