// gmark/src/client/pagination.rs
use std::collections::BTreeMap;
use tracing::trace;

/// A 1-based page number. Zero, negative, non-finite and fractional inputs
/// convert to an invalid page instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageNumber(Option<u32>);

impl PageNumber {
    pub fn get(&self) -> Option<u32> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

impl From<i64> for PageNumber {
    fn from(page: i64) -> Self {
        PageNumber(u32::try_from(page).ok().filter(|p| *p >= 1))
    }
}

impl From<i32> for PageNumber {
    fn from(page: i32) -> Self {
        PageNumber::from(i64::from(page))
    }
}

impl From<u32> for PageNumber {
    fn from(page: u32) -> Self {
        PageNumber(Some(page).filter(|p| *p >= 1))
    }
}

impl From<usize> for PageNumber {
    fn from(page: usize) -> Self {
        PageNumber(u32::try_from(page).ok().filter(|p| *p >= 1))
    }
}

impl From<f64> for PageNumber {
    fn from(page: f64) -> Self {
        if page.is_finite() && page.fract() == 0.0 && page >= 1.0 && page <= f64::from(u32::MAX) {
            PageNumber(Some(page as u32))
        } else {
            PageNumber(None)
        }
    }
}

/// Page-number-to-cursor memo of one view.
///
/// Cursors are only meaningful under the filters they were produced with, so
/// any change of filters drops them all. Each instance is independent and
/// starts empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorCache<F: PartialEq + Clone> {
    filters: Option<F>,
    cursors: BTreeMap<u32, String>,
}

impl<F: PartialEq + Clone> Default for CursorCache<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PartialEq + Clone> CursorCache<F> {
    pub fn new() -> Self {
        Self {
            filters: None,
            cursors: BTreeMap::new(),
        }
    }

    pub fn with_filters(filters: F) -> Self {
        Self {
            filters: Some(filters),
            cursors: BTreeMap::new(),
        }
    }

    pub fn filters(&self) -> Option<&F> {
        self.filters.as_ref()
    }

    pub fn get_cursor<P: Into<PageNumber>>(&self, page: P) -> Option<&str> {
        let page = page.into().get()?;
        self.cursors.get(&page).map(String::as_str)
    }

    /// Ignored for invalid page numbers
    pub fn set_cursor<P: Into<PageNumber>, S: Into<String>>(&mut self, page: P, cursor: S) {
        if let Some(page) = page.into().get() {
            self.cursors.insert(page, cursor.into());
        } else {
            trace!("Ignoring cursor for invalid page");
        }
    }

    pub fn clear_cache(&mut self) {
        self.cursors.clear();
    }

    /// Returns whether the cursors were cleared.
    pub fn update_filters(&mut self, filters: F) -> bool {
        if self.filters.as_ref() == Some(&filters) {
            return false;
        }
        self.filters = Some(filters);
        self.clear_cache();
        true
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
