//! Page arithmetic over a filtered, ranked sequence

use std::ops::Range;

/// Number of pages for `len` items at `page_size` per page (0 when empty)
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size)
}

/// Index range of 1-based page `page`, clamped to `len`
///
/// A page past the end yields an empty range at `len`.
pub fn page_bounds(len: usize, page_size: usize, page: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let start = ((page - 1).saturating_mul(page_size)).min(len);
    let end = page.saturating_mul(page_size).min(len);
    start..end
}

/// Current position within a sequence of `len` items
///
/// An empty sequence has zero pages but still reports page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    len: usize,
    page_size: usize,
    page: usize,
}

impl Pagination {
    /// Build a pagination, clamping `page` into `1..=total_pages`
    pub fn new(len: usize, page_size: usize, page: usize) -> Self {
        let page_size = page_size.max(1);
        let last = total_pages(len, page_size).max(1);
        Self {
            len,
            page_size,
            page: page.clamp(1, last),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.len, self.page_size)
    }

    pub fn bounds(&self) -> Range<usize> {
        page_bounds(self.len, self.page_size, self.page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Advance one page; no-op on the last page
    pub fn next(&mut self) {
        if self.has_next() {
            self.page += 1;
        }
    }

    /// Go back one page; no-op on the first page
    pub fn previous(&mut self) {
        if self.has_previous() {
            self.page -= 1;
        }
    }

    /// Jump to `page`, clamped to the valid range
    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_three_items_by_ten() {
        assert_eq!(total_pages(23, 10), 3);
        assert_eq!(page_bounds(23, 10, 1), 0..10);
        assert_eq!(page_bounds(23, 10, 3), 20..23);
        assert_eq!(page_bounds(23, 10, 3).len(), 3);
    }

    #[test]
    fn test_next_is_noop_on_last_page() {
        let mut p = Pagination::new(23, 10, 3);
        p.next();
        assert_eq!(p.page(), 3);
    }

    #[test]
    fn test_previous_is_noop_on_first_page() {
        let mut p = Pagination::new(23, 10, 1);
        p.previous();
        assert_eq!(p.page(), 1);
        p.next();
        p.next();
        assert_eq!(p.page(), 3);
        p.previous();
        assert_eq!(p.page(), 2);
    }

    #[test]
    fn test_empty_sequence() {
        let p = Pagination::new(0, 10, 4);
        assert_eq!(p.total_pages(), 0);
        assert_eq!(p.page(), 1);
        assert!(p.bounds().is_empty());
        assert!(!p.has_next());
    }

    #[test]
    fn test_page_past_end_is_clamped() {
        let p = Pagination::new(5, 2, 9);
        assert_eq!(p.page(), 3);
        assert_eq!(p.bounds(), 4..5);
        assert_eq!(page_bounds(5, 2, 9), 5..5);
    }

    #[test]
    fn test_zero_page_size_is_coerced() {
        assert_eq!(total_pages(3, 0), 3);
        assert_eq!(Pagination::new(3, 0, 1).page_size(), 1);
    }

    #[test]
    fn test_exact_multiple() {
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(page_bounds(20, 10, 2), 10..20);
    }
}
