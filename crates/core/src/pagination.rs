//! Bounded windows over a flat question list.

/// Slice `items` to page `page` of size `page_size`.
///
/// Pages past the end yield an empty slice. A zero `page_size` yields an
/// empty slice as well.
#[must_use]
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    if page_size == 0 {
        return &[];
    }
    let start = page.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `len` items; never less than 1 so navigation
/// always has a page to sit on.
#[must_use]
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Navigation state for one category's question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    current: usize,
}

impl Pager {
    /// A pager at the first page. A zero `page_size` is treated as 1.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 0,
        }
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Advance one page, staying on the last page at the boundary.
    pub fn next_page(&mut self, len: usize) {
        let last = page_count(len, self.page_size) - 1;
        self.current = (self.current + 1).min(last);
    }

    /// Go back one page, staying on the first page at the boundary.
    pub fn prev_page(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// The visible slice of `items` for the current page.
    #[must_use]
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.page_size, self.current)
    }

    /// Index of the first item on the current page.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.current * self.page_size
    }
}
