//! Per-list pagination cursor.

/// Tracks which page of a list to fetch next and whether a fetch is in
/// flight.
///
/// [`PageCursor::begin_loading`] is the only admission gate for a list: a
/// fetch may be dispatched only when it returns `true`, and every admitted
/// fetch must be closed with exactly one [`PageCursor::end_loading`] or
/// [`PageCursor::cancel_loading`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
    total_pages: u32,
    is_loading: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    pub const fn new() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            is_loading: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Admit a fetch of [`Self::page`]. Returns `false` while another fetch
    /// is in flight or once every page has been loaded.
    pub fn begin_loading(&mut self) -> bool {
        if self.is_loading || self.page > self.total_pages {
            return false;
        }
        self.is_loading = true;
        true
    }

    /// Close an admitted fetch that succeeded.
    pub fn end_loading(&mut self, total_pages: u32) {
        self.total_pages = total_pages.max(1);
        self.page = (self.page + 1).min(self.total_pages + 1);
        self.is_loading = false;
    }

    /// Close an admitted fetch that failed or was superseded. The same page
    /// will be requested again on the next admission.
    pub fn cancel_loading(&mut self) {
        self.is_loading = false;
    }

    /// The next page to fetch.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.page <= self.total_pages
    }
}
