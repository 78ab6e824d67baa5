//! In-memory pagination.

/// One page of an already-fetched list.
///
/// Pages are 1-based. An out-of-range page is clamped to the last page, and
/// an empty list always yields page 1 of 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: usize,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = u32::try_from(total_items.div_ceil(per_page as usize))
            .unwrap_or(u32::MAX)
            .max(1);
        let page = page.clamp(1, total_pages);

        let start = (page as usize - 1) * per_page as usize;
        let items = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn prev(&self) -> Option<u32> {
        if self.has_prev() {
            Some(self.page - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// 1-based index of the first item on this page, 0 when empty.
    #[must_use]
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page as usize - 1) * self.per_page as usize + 1
        }
    }

    /// 1-based index of the last item on this page, 0 when empty.
    #[must_use]
    pub fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = Page::new((1..=25).collect(), 1, 10);
        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_prev());
        assert_eq!(page.next(), Some(2));
    }

    #[test]
    fn test_partial_last_page() {
        let page = Page::new((1..=25).collect(), 3, 10);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.prev(), Some(2));
        assert!(!page.has_next());
        assert_eq!((page.first_index(), page.last_index()), (21, 25));
    }

    #[test]
    fn test_out_of_range_clamps_to_last() {
        let page = Page::new((1..=25).collect::<Vec<u32>>(), 99, 10);
        assert_eq!(page.page, 3);
        let page = Page::new((1..=25).collect::<Vec<u32>>(), 0, 10);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_empty_is_single_page() {
        let page: Page<u32> = Page::new(vec![], 4, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
        assert_eq!((page.first_index(), page.last_index()), (0, 0));
        assert!(!page.has_next());
    }

    #[test]
    fn test_exact_multiple() {
        let page = Page::new((1..=20).collect::<Vec<u32>>(), 2, 10);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next());
    }
}
