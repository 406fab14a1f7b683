//! Page index, page size and total, kept mutually consistent.

/// Pagination state of one list view.
///
/// `page` is zero-based and always satisfies
/// `page < max(1, ceil(total / page_size))`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    page_size: u64,
    total: u64,
}

impl Pagination {
    /// `page_size` of zero is bumped to one.
    pub fn new(page_size: u64) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of addressable pages. An empty result still has one page.
    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(self.page_size).max(1)
    }

    pub fn last_page(&self) -> u64 {
        self.page_count() - 1
    }

    /// Index of the first row on the current page.
    pub fn offset(&self) -> u64 {
        self.page * self.page_size
    }

    /// Moves to `page`, clamped to the last valid page. Returns the page actually selected.
    pub fn set_page(&mut self, page: u64) -> u64 {
        self.page = page.min(self.last_page());
        self.page
    }

    /// Changes the page size and returns to the first page. Zero is bumped to one.
    pub fn set_page_size(&mut self, page_size: u64) {
        self.page_size = page_size.max(1);
        self.page = 0;
    }

    /// Records a new total and re-clamps the page. Returns true when the page moved.
    pub fn set_total(&mut self, total: u64) -> bool {
        self.total = total;
        let before = self.page;
        self.page = self.page.min(self.last_page());
        before != self.page
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// Zero-based row range of the current page within `0..total`.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset().min(self.total) as usize;
        let end = (self.offset() + self.page_size).min(self.total) as usize;
        start..end
    }

    /// Compact page strip for rendering, one-based, with `None` marking a gap.
    ///
    /// Always shows the first and last `edge` pages and `around` pages on
    /// each side of the current one.
    pub fn window(&self, edge: u64, around: u64) -> Vec<Option<u64>> {
        let last = self.page_count();
        let current = self.page + 1;
        let mut pages = Vec::new();

        let left_end = (1 + edge).min(last + 1);
        pages.extend((1..left_end).map(Some));

        let mid_start = left_end.max(current.saturating_sub(around));
        let mid_end = (current + around + 1).min(last + 1);
        if mid_start > left_end {
            pages.push(None);
        }
        pages.extend((mid_start..mid_end).map(Some));

        let right_start = mid_end.max(last.saturating_sub(edge) + 1);
        if right_start > mid_end {
            pages.push(None);
        }
        pages.extend((right_start..=last).map(Some));
        pages
    }
}
