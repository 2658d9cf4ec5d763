//! Pagination of record sequences.

use tracing::debug;

/// Page sizes offered to the viewer.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
}

/// Number of pages needed for `len` items. Zero items need zero pages.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Slice page `page_index` (1-based) out of `items`.
///
/// Indices past the end yield an empty page rather than an error.
pub fn paginate<T>(items: &[T], page_size: usize, page_index: usize) -> Page<'_, T> {
    let total_pages = total_pages(items.len(), page_size);
    if page_size == 0 || page_index == 0 {
        return Page {
            items: &[],
            total_pages,
        };
    }

    let start = (page_index - 1).saturating_mul(page_size).min(items.len());
    let end = page_index.saturating_mul(page_size).min(items.len());
    Page {
        items: &items[start..end],
        total_pages,
    }
}

/// The viewer's current position in a paginated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    index: usize,
    size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            index: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageState {
    /// Start on page 1 with `size` items per page (zero falls back to the default).
    pub fn new(size: usize) -> Self {
        Self {
            index: 1,
            size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
        }
    }

    /// Current 1-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Items per page.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Move to page `n` if it lies in `[1, total_pages]`.
    ///
    /// Returns false and leaves the page unchanged otherwise.
    pub fn go_to(&mut self, n: usize, total_pages: usize) -> bool {
        if n == 0 || n > total_pages {
            debug!(requested = n, total_pages, "ignoring out-of-range page request");
            return false;
        }
        self.index = n;
        true
    }

    /// Change the page size and return to page 1. A zero size is ignored.
    pub fn set_size(&mut self, size: usize) -> bool {
        if size == 0 {
            debug!("ignoring zero page size");
            return false;
        }
        self.size = size;
        self.index = 1;
        true
    }

    /// Keep the index if it is still valid for `total_pages`, otherwise go back to page 1.
    pub fn revalidate(&mut self, total_pages: usize) {
        if self.index > total_pages {
            self.index = 1;
        }
    }

    /// Next entry of [`PAGE_SIZE_OPTIONS`] after the current size, wrapping around.
    pub fn next_size_option(&self) -> usize {
        PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .find(|&s| s > self.size)
            .unwrap_or(PAGE_SIZE_OPTIONS[0])
    }

    /// Previous entry of [`PAGE_SIZE_OPTIONS`] before the current size, wrapping around.
    pub fn prev_size_option(&self) -> usize {
        PAGE_SIZE_OPTIONS
            .iter()
            .rev()
            .copied()
            .find(|&s| s < self.size)
            .unwrap_or(PAGE_SIZE_OPTIONS[PAGE_SIZE_OPTIONS.len() - 1])
    }
}
