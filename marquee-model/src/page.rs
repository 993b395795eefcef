/// Pagination envelope returned by every paged catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<T> {
    pub page: u32,
    pub total_pages: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total_results: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// A page with no results that claims to be the only one.
    pub fn empty() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total_results: 0,
            results: Vec::new(),
        }
    }

    /// Convenience constructor that derives `total_results` from the page
    /// contents.
    pub fn single(results: Vec<T>) -> Self {
        Self::numbered(1, 1, results)
    }

    pub fn numbered(page: u32, total_pages: u32, results: Vec<T>) -> Self {
        Self {
            page,
            total_pages,
            total_results: results.len() as u32,
            results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
